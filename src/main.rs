// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, run the command.
// - Returns `anyhow::Result` so any failure prints and exits non-zero.

use clap::Parser;
use pocket_cli::cli::{self, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise only warnings unless --verbose.
    let default_filter = if cli.verbose {
        "pocket_cli=debug"
    } else {
        "pocket_cli=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    cli::run(cli)
}
