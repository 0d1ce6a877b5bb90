// Output for the read-only commands: URL listings, word totals and the raw
// JSON dump used for debugging.

use crate::item::Item;
use serde_json::Value;
use std::io::{self, Write};

/// Print each item's resolved URL, ordered by `sort_id`.
pub fn write_urls<W: Write>(items: &[Item], out: &mut W) -> io::Result<()> {
    let mut sorted: Vec<&Item> = items.iter().collect();
    sorted.sort_by_key(|item| item.sort_id);
    for item in sorted {
        writeln!(out, "{}", item.resolved_url)?;
    }
    Ok(())
}

/// Sum of `word_count` over all items. Missing counts decode as 0.
pub fn total_words(items: &[Item]) -> u64 {
    items.iter().map(|item| item.word_count).sum()
}

/// Pretty-printed JSON with keys in sorted order.
pub fn write_raw_json<W: Write>(body: &Value, out: &mut W) -> io::Result<()> {
    // serde_json's default map is a BTreeMap, so objects come out sorted.
    serde_json::to_writer_pretty(&mut *out, body)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(sort_id: u64, url: &str, words: u64) -> Item {
        Item {
            sort_id,
            resolved_url: url.to_string(),
            word_count: words,
            ..Item::default()
        }
    }

    #[test]
    fn test_urls_sorted_by_sort_id() {
        let items = vec![
            item(2, "https://c.example", 0),
            item(0, "https://a.example", 0),
            item(1, "https://b.example", 0),
        ];
        let mut out = Vec::new();
        write_urls(&items, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "https://a.example\nhttps://b.example\nhttps://c.example\n"
        );
    }

    #[test]
    fn test_total_words() {
        let items = vec![item(0, "", 100), item(1, "", 3000), item(2, "", 20000)];
        assert_eq!(total_words(&items), 23100);
        assert_eq!(total_words(&[]), 0);
    }

    #[test]
    fn test_raw_json_is_sorted_and_pretty() {
        let body = json!({"status": 1, "list": {"b": {"z": 1, "a": 2}}, "complete": 1});
        let mut out = Vec::new();
        write_raw_json(&body, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let complete = text.find("\"complete\"").unwrap();
        let list = text.find("\"list\"").unwrap();
        let status = text.find("\"status\"").unwrap();
        assert!(complete < list && list < status);
        assert!(text.find("\"a\"").unwrap() < text.find("\"z\"").unwrap());
        assert!(text.contains("\n  \"status\": 1"));
        assert!(text.ends_with("}\n"));
    }
}
