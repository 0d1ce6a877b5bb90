// Retrieval query building.
//
// A query is layered from three sources, later layers winning:
// built-in defaults, values a command fixes (e.g. `favorites` sets
// `favorite=1`), and the filter flags the user typed.

use clap::{Args, ValueEnum};
use std::collections::BTreeMap;

/// The parameter names the retrieval endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Param {
    State,
    Favorite,
    Tag,
    ContentType,
    Sort,
    DetailType,
    Search,
    Domain,
    Since,
    Count,
    Offset,
}

impl Param {
    /// Wire name of the parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Param::State => "state",
            Param::Favorite => "favorite",
            Param::Tag => "tag",
            Param::ContentType => "contentType",
            Param::Sort => "sort",
            Param::DetailType => "detailType",
            Param::Search => "search",
            Param::Domain => "domain",
            Param::Since => "since",
            Param::Count => "count",
            Param::Offset => "offset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContentType {
    Article,
    Video,
    Image,
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Video => "video",
            ContentType::Image => "image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    Newest,
    Oldest,
    Title,
    Site,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Title => "title",
            SortOrder::Site => "site",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DetailType {
    Simple,
    Complete,
}

impl DetailType {
    fn as_str(&self) -> &'static str {
        match self {
            DetailType::Simple => "simple",
            DetailType::Complete => "complete",
        }
    }
}

/// A normalized set of retrieval parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<Param, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// `sort=oldest`, `detailType=simple`.
    pub fn defaults() -> Self {
        Self::new()
            .with(Param::Sort, SortOrder::Oldest.as_str())
            .with(Param::DetailType, DetailType::Simple.as_str())
    }

    /// Defaults, then command-fixed values, then the user's flags.
    pub fn build(fixed: QueryParams, flags: &RetrieveArgs) -> Self {
        Self::defaults().merge(fixed).merge(flags.to_params())
    }

    pub fn with(mut self, param: Param, value: impl Into<String>) -> Self {
        self.set(param, value);
        self
    }

    pub fn set(&mut self, param: Param, value: impl Into<String>) {
        self.0.insert(param, value.into());
    }

    pub fn get(&self, param: Param) -> Option<&str> {
        self.0.get(&param).map(String::as_str)
    }

    /// Layer `overrides` on top of `self`; overriding values win.
    pub fn merge(mut self, overrides: QueryParams) -> Self {
        self.0.extend(overrides.0);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(param, value)| (param.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Filter flags shared by every command that retrieves items.
///
/// `--unread`, `--archive` and `--all` override each other, so when several
/// are given the last one on the command line wins.
#[derive(Debug, Clone, Default, Args)]
pub struct RetrieveArgs {
    /// Only unread items
    #[arg(long, overrides_with_all = ["archive", "all"])]
    pub unread: bool,

    /// Only archived items
    #[arg(long, overrides_with_all = ["unread", "all"])]
    pub archive: bool,

    /// Both unread and archived items
    #[arg(long, overrides_with_all = ["unread", "archive"])]
    pub all: bool,

    /// Only items with this tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Only favorited items
    #[arg(long)]
    pub favorite: bool,

    #[arg(long, value_enum)]
    pub content_type: Option<ContentType>,

    #[arg(long, value_enum)]
    pub sort: Option<SortOrder>,

    #[arg(long, value_enum)]
    pub detail_type: Option<DetailType>,

    /// Only items from this domain
    #[arg(long)]
    pub domain: Option<String>,

    /// Only items modified since this Unix timestamp
    #[arg(long, value_name = "UNIX_TS")]
    pub since: Option<i64>,

    /// Maximum number of items to return
    #[arg(long)]
    pub count: Option<u32>,

    /// Skip this many items
    #[arg(long)]
    pub offset: Option<u32>,
}

impl RetrieveArgs {
    /// Only the parameters the user actually set.
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();

        if let Some(state) = self.state() {
            params.set(Param::State, state);
        }
        if !self.tags.is_empty() {
            params.set(Param::Tag, self.tags.join(","));
        }
        if self.favorite {
            params.set(Param::Favorite, "1");
        }
        if let Some(content_type) = self.content_type {
            params.set(Param::ContentType, content_type.as_str());
        }
        if let Some(sort) = self.sort {
            params.set(Param::Sort, sort.as_str());
        }
        if let Some(detail) = self.detail_type {
            params.set(Param::DetailType, detail.as_str());
        }
        if let Some(domain) = &self.domain {
            params.set(Param::Domain, domain.clone());
        }
        if let Some(since) = self.since {
            params.set(Param::Since, since.to_string());
        }
        if let Some(count) = self.count {
            params.set(Param::Count, count.to_string());
        }
        if let Some(offset) = self.offset {
            params.set(Param::Offset, offset.to_string());
        }
        params
    }

    // clap leaves at most one of these set; built by hand, unread wins.
    fn state(&self) -> Option<&'static str> {
        if self.unread {
            Some("unread")
        } else if self.archive {
            Some("archive")
        } else if self.all {
            Some("all")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = QueryParams::defaults();
        assert_eq!(params.get(Param::Sort), Some("oldest"));
        assert_eq!(params.get(Param::DetailType), Some("simple"));
        assert_eq!(params.get(Param::State), None);
    }

    #[test]
    fn test_no_flags_yields_defaults() {
        let params = QueryParams::build(QueryParams::new(), &RetrieveArgs::default());
        assert_eq!(params, QueryParams::defaults());
    }

    #[test]
    fn test_tags_join_with_comma() {
        let flags = RetrieveArgs {
            tags: vec!["rust".into(), "later".into()],
            ..RetrieveArgs::default()
        };
        assert_eq!(flags.to_params().get(Param::Tag), Some("rust,later"));
    }

    #[test]
    fn test_flags_override_defaults() {
        let flags = RetrieveArgs {
            sort: Some(SortOrder::Newest),
            detail_type: Some(DetailType::Complete),
            count: Some(10),
            ..RetrieveArgs::default()
        };
        let params = QueryParams::build(QueryParams::new(), &flags);
        assert_eq!(params.get(Param::Sort), Some("newest"));
        assert_eq!(params.get(Param::DetailType), Some("complete"));
        assert_eq!(params.get(Param::Count), Some("10"));
    }

    #[test]
    fn test_command_fixed_values_sit_between_defaults_and_flags() {
        let fixed = QueryParams::new()
            .with(Param::Favorite, "1")
            .with(Param::State, "all");

        let untouched = QueryParams::build(fixed.clone(), &RetrieveArgs::default());
        assert_eq!(untouched.get(Param::State), Some("all"));
        assert_eq!(untouched.get(Param::Favorite), Some("1"));
        assert_eq!(untouched.get(Param::Sort), Some("oldest"));

        let flags = RetrieveArgs {
            unread: true,
            ..RetrieveArgs::default()
        };
        let overridden = QueryParams::build(fixed, &flags);
        assert_eq!(overridden.get(Param::State), Some("unread"));
        assert_eq!(overridden.get(Param::Favorite), Some("1"));
    }

    #[test]
    fn test_wire_names() {
        let params = QueryParams::new()
            .with(Param::ContentType, "video")
            .with(Param::DetailType, "simple");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("contentType", "video"), ("detailType", "simple")]);
    }
}
