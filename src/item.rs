// Saved items as the retrieval endpoint returns them.
//
// Pocket encodes most numbers as strings (`"word_count": "1234"`) and
// answers an empty list with `"list": []` instead of an object, so decoding
// here is deliberately lenient.

use crate::error::{PocketError, Result};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Base of the stable "read this item" link used by exported shortcuts.
pub const READ_URL_BASE: &str = "https://getpocket.com/a/read/";

/// A single saved link. The remote service owns all mutation; the client
/// only ever reads these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Item {
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub resolved_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub given_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub resolved_title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub given_title: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub word_count: u64,
    /// 0 = list, 1 = archived, 2 = to be deleted.
    #[serde(default, deserialize_with = "lenient_number")]
    pub status: i64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub time_read: i64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub time_added: i64,
    /// 0 = no video, 1 = has video, 2 = is a video.
    #[serde(default, deserialize_with = "lenient_number")]
    pub has_video: i64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sort_id: u64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub favorite: i64,
}

impl Item {
    /// Best available title: resolved, then given, then empty.
    pub fn title(&self) -> &str {
        if !self.resolved_title.is_empty() {
            &self.resolved_title
        } else {
            &self.given_title
        }
    }

    pub fn read_url(&self) -> String {
        format!("{}{}", READ_URL_BASE, self.item_id)
    }

    /// Exact match against either the resolved or the given URL.
    pub fn matches_url(&self, url: &str) -> bool {
        self.resolved_url == url || self.given_url == url
    }
}

/// Body of a retrieval call. Kept as raw JSON so the `raw` command can
/// print it untouched; `items()` decodes the `list` on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveResponse(Value);

impl RetrieveResponse {
    pub fn new(body: Value) -> Self {
        RetrieveResponse(body)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Decode the `list` field. Absent, `null` or `[]` all mean no items.
    pub fn items(&self) -> Result<Vec<Item>> {
        match self.0.get("list") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(key, value)| -> Result<Item> {
                    let mut item = Item::deserialize(value)?;
                    if item.item_id.is_empty() {
                        item.item_id = key.clone();
                    }
                    Ok(item)
                })
                .collect(),
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| Item::deserialize(value).map_err(PocketError::from))
                .collect(),
            Some(other) => Err(PocketError::Decode(de::Error::custom(format!(
                "unexpected `list` value: {other}"
            )))),
        }
    }
}

/// First item whose resolved or given URL equals `url`.
pub fn find_by_url<'a>(items: &'a [Item], url: &str) -> Option<&'a Item> {
    items.iter().find(|item| item.matches_url(url))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    Text(String),
}

fn lenient_number<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr + Default,
    T::Err: fmt::Display,
{
    match Option::<NumberOrString<T>>::deserialize(deserializer)? {
        None => Ok(T::default()),
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(T::default())
            } else {
                text.parse().map_err(de::Error::custom)
            }
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
