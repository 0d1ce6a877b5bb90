// Command-line surface and command execution.
//
// The set of commands is a closed enum, so an unknown or missing command
// name is rejected by the parser with usage text and a non-zero exit.
// `execute` runs one parsed command against a [`Session`], writing
// everything meant for the user to `out`.

use crate::api::{Action, ActionKind, PocketApi, PocketClient};
use crate::credentials;
use crate::error::PocketError;
use crate::export::LocalExport;
use crate::format;
use crate::item::{find_by_url, Item};
use crate::query::{Param, QueryParams, RetrieveArgs};
use crate::session::Session;
use crate::ui::{self, DialoguerPrompter, Prompter};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "pocket",
    version,
    about = "Command-line client for your Pocket list",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Credentials file
    #[arg(long, global = true, env = "POCKET_CREDENTIALS", value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Application consumer key, used when authentication is needed
    #[arg(long, global = true, env = "POCKET_CONSUMER_KEY", hide_env_values = true)]
    pub consumer_key: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Authorize this client and store the credentials
    Authenticate,
    /// Print the URL of every matching item
    List(RetrieveArgs),
    /// Print the total word count of matching items
    Words(RetrieveArgs),
    /// Print URLs of items matching a search string
    Search {
        query: String,
        #[command(flatten)]
        filters: RetrieveArgs,
    },
    /// Print URLs of favorited items
    Favorites(RetrieveArgs),
    /// Save a new URL
    Add { url: String, title: Option<String> },
    /// Archive the item saved under URL
    Archive { url: String },
    /// Move the item saved under URL back to the list
    Readd { url: String },
    /// Mark the item saved under URL as favorite
    Favorite { url: String },
    /// Remove the favorite mark from the item saved under URL
    Unfavorite { url: String },
    /// Delete the item saved under URL
    Delete { url: String },
    /// Sort items into category folders of internet shortcuts
    Local {
        /// Where to write the folders; without it categories are only listed
        output_dir: Option<PathBuf>,
        #[command(flatten)]
        filters: RetrieveArgs,
    },
    /// Dump the raw retrieval response as JSON
    Raw(RetrieveArgs),
}

/// Entry point used by the binary: real HTTP client, terminal prompts,
/// stdout.
pub fn run(cli: Cli) -> Result<()> {
    let api = PocketClient::from_env().context("Failed to build HTTP client")?;
    let path = cli
        .credentials
        .clone()
        .unwrap_or_else(credentials::default_path);
    debug!(path = %path.display(), "using credentials file");

    let mut session = Session::new(api, DialoguerPrompter, path, cli.consumer_key.clone());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &mut session, &mut out)
}

/// Run one command.
pub fn execute<A, P, W>(command: &Command, session: &mut Session<A, P>, out: &mut W) -> Result<()>
where
    A: PocketApi,
    P: Prompter,
    W: Write,
{
    match command {
        Command::Authenticate => {
            let credentials = session.authenticate()?;
            ui::success(&format!(
                "Saved credentials to {}",
                session.credentials_path().display()
            ));
            writeln!(out, "Authenticated as {}", credentials.username)?;
        }
        Command::List(filters) => {
            let items = fetch(session, QueryParams::new(), filters)?;
            format::write_urls(&items, out)?;
        }
        Command::Words(filters) => {
            let items = fetch(session, QueryParams::new(), filters)?;
            writeln!(out, "{}", format::total_words(&items))?;
        }
        Command::Search { query, filters } => {
            let fixed = QueryParams::new().with(Param::Search, query.as_str());
            let items = fetch(session, fixed, filters)?;
            format::write_urls(&items, out)?;
        }
        Command::Favorites(filters) => {
            let fixed = QueryParams::new()
                .with(Param::Favorite, "1")
                .with(Param::State, "all");
            let items = fetch(session, fixed, filters)?;
            format::write_urls(&items, out)?;
        }
        Command::Add { url, title } => {
            session.add(url, title.as_deref())?;
            writeln!(out, "Added {}", url)?;
        }
        Command::Archive { url } => modify_by_url(session, ActionKind::Archive, url, out)?,
        Command::Readd { url } => modify_by_url(session, ActionKind::Readd, url, out)?,
        Command::Favorite { url } => modify_by_url(session, ActionKind::Favorite, url, out)?,
        Command::Unfavorite { url } => modify_by_url(session, ActionKind::Unfavorite, url, out)?,
        Command::Delete { url } => modify_by_url(session, ActionKind::Delete, url, out)?,
        Command::Local {
            output_dir,
            filters,
        } => {
            let export = LocalExport::new(output_dir.as_deref());
            let items = fetch(session, QueryParams::new(), filters)?;
            let tally = export.run(&items, out)?;
            if let Some(target) = export.target() {
                ui::success(&format!(
                    "Wrote shortcuts for {} items under {}",
                    tally.total(),
                    target.display()
                ));
            }
            tally.write_report(out)?;
        }
        Command::Raw(filters) => {
            let params = QueryParams::build(QueryParams::new(), filters);
            let response = session.retrieve(&params)?;
            format::write_raw_json(response.raw(), out)?;
        }
    }
    Ok(())
}

fn fetch<A: PocketApi, P: Prompter>(
    session: &mut Session<A, P>,
    fixed: QueryParams,
    filters: &RetrieveArgs,
) -> Result<Vec<Item>> {
    let params = QueryParams::build(fixed, filters);
    Ok(session.retrieve(&params)?.items()?)
}

/// Find the id of the item saved under `url`, searching every state.
pub fn lookup_item_id<A: PocketApi, P: Prompter>(
    session: &mut Session<A, P>,
    url: &str,
) -> Result<Option<String>> {
    let mut params = QueryParams::defaults().with(Param::State, "all");
    match url::Url::parse(url).ok().as_ref().and_then(url::Url::host_str) {
        Some(domain) => params.set(Param::Domain, domain),
        None => debug!(%url, "no host in URL, searching without a domain filter"),
    }

    let items = session.retrieve(&params)?.items()?;
    Ok(find_by_url(&items, url).map(|item| item.item_id.clone()))
}

fn modify_by_url<A, P, W>(
    session: &mut Session<A, P>,
    action: ActionKind,
    url: &str,
    out: &mut W,
) -> Result<()>
where
    A: PocketApi,
    P: Prompter,
    W: Write,
{
    let item_id = lookup_item_id(session, url)?
        .ok_or_else(|| PocketError::ItemNotFound(url.to_string()))?;
    debug!(%item_id, ?action, "modifying item");

    session.modify(&[Action { action, item_id }])?;
    writeln!(out, "{} {}", confirmation(action), url)?;
    Ok(())
}

fn confirmation(action: ActionKind) -> &'static str {
    match action {
        ActionKind::Archive => "Archived",
        ActionKind::Readd => "Re-added",
        ActionKind::Favorite => "Favorited",
        ActionKind::Unfavorite => "Unfavorited",
        ActionKind::Delete => "Deleted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_missing_command_shows_help() {
        let err = Cli::try_parse_from(["pocket"]).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let err = Cli::try_parse_from(["pocket", "frobnicate"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_last_state_flag_wins() {
        let cli = parse(&["pocket", "list", "--unread", "--archive", "--all"]);
        let Command::List(filters) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(filters.to_params().get(Param::State), Some("all"));

        let cli = parse(&["pocket", "list", "--all", "--unread"]);
        let Command::List(filters) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(filters.to_params().get(Param::State), Some("unread"));
    }

    #[test]
    fn test_repeated_tags() {
        let cli = parse(&["pocket", "words", "--tag=rust", "--tag", "later"]);
        let Command::Words(filters) = cli.command else {
            panic!("expected words");
        };
        assert_eq!(filters.to_params().get(Param::Tag), Some("rust,later"));
    }

    #[test]
    fn test_local_and_search_arguments() {
        let cli = parse(&["pocket", "local", "/tmp/out", "--archive"]);
        let Command::Local {
            output_dir,
            filters,
        } = cli.command
        else {
            panic!("expected local");
        };
        assert_eq!(output_dir, Some(PathBuf::from("/tmp/out")));
        assert!(filters.archive);

        let cli = parse(&["pocket", "search", "rust lang", "--sort", "newest"]);
        let Command::Search { query, filters } = cli.command else {
            panic!("expected search");
        };
        assert_eq!(query, "rust lang");
        assert_eq!(filters.to_params().get(Param::Sort), Some("newest"));
    }

    #[test]
    fn test_bad_flag_value_is_rejected() {
        assert!(Cli::try_parse_from(["pocket", "list", "--count", "many"]).is_err());
        assert!(Cli::try_parse_from(["pocket", "list", "--sort", "sideways"]).is_err());
    }

    #[test]
    fn test_add_with_optional_title() {
        let cli = parse(&["pocket", "add", "https://example.com", "Example"]);
        let Command::Add { url, title } = cli.command else {
            panic!("expected add");
        };
        assert_eq!(url, "https://example.com");
        assert_eq!(title.as_deref(), Some("Example"));
    }
}
