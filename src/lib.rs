// Library root
// -----------
// The binary (`main.rs`) only parses arguments, sets up logging and hands
// over to `cli::run`; everything else lives here so it can be tested
// without a terminal or network.
//
// Module responsibilities:
// - `api`: the `PocketApi` trait and the blocking HTTP client behind it.
// - `credentials`: the three-line credentials file.
// - `session`: loads credentials on first use and runs the OAuth flow.
// - `query`: turns filter flags into retrieval parameters.
// - `item`: decoding of saved items and URL lookup.
// - `format` / `export`: what the commands print or write to disk.
// - `cli`: the command enum and `execute`.
// - `ui`: prompts, spinner and styled status lines.
pub mod api;
pub mod cli;
pub mod credentials;
pub mod error;
pub mod export;
pub mod format;
pub mod item;
pub mod query;
pub mod session;
pub mod ui;

pub use api::{PocketApi, PocketClient};
pub use credentials::Credentials;
pub use error::PocketError;
pub use session::Session;
