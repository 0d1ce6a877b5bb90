// UI layer: the few interactive bits of the client. Prompts use `dialoguer`,
// progress uses an `indicatif` spinner and status lines are styled with
// `crossterm`. Everything here writes to the terminal's stderr so stdout
// stays clean for piping URLs and JSON.

use crate::error::{PocketError, Result};
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Questions the authentication flow needs to ask the user.
///
/// The real implementation talks to the terminal; tests script the answers.
pub trait Prompter {
    /// Ask for the application's consumer key.
    fn consumer_key(&mut self) -> Result<String>;

    /// Show `authorize_url` and block until the user says whether they
    /// approved access there. There is no timeout.
    fn confirm_authorization(&mut self, authorize_url: &str) -> Result<bool>;
}

/// Terminal prompts backed by `dialoguer`.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn consumer_key(&mut self) -> Result<String> {
        let key: String = Input::new()
            .with_prompt("Pocket consumer key")
            .interact_text()
            .map_err(PocketError::Prompt)?;
        Ok(key.trim().to_string())
    }

    fn confirm_authorization(&mut self, authorize_url: &str) -> Result<bool> {
        eprintln!("Open this URL in your browser and authorize the application:");
        eprintln!("  {}", authorize_url.underlined());
        let approved = Confirm::new()
            .with_prompt("Have you authorized the application?")
            .default(true)
            .wait_for_newline(true)
            .interact()
            .map_err(PocketError::Prompt)?;
        Ok(approved)
    }
}

/// Spinner shown on stderr while a remote call is in flight. It draws
/// nothing when stderr is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn success(message: &str) {
    eprintln!("{} {}", "✓".green(), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.yellow());
}
