// Authenticated access to the API for the duration of one run.
//
// Credentials are loaded from disk the first time a call needs them and
// never again during the run. If the file is absent the interactive OAuth
// flow runs once and its result is persisted before any call goes out.

use crate::api::{Action, PocketApi};
use crate::credentials::Credentials;
use crate::error::{PocketError, Result};
use crate::item::RetrieveResponse;
use crate::query::QueryParams;
use crate::ui::{self, Prompter};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the service sends the browser after the user approves access.
pub const REDIRECT_URI: &str = "https://getpocket.com";

pub struct Session<A, P> {
    api: A,
    prompter: P,
    credentials_path: PathBuf,
    consumer_key: Option<String>,
    credentials: Option<Credentials>,
    loaded: bool,
}

impl<A: PocketApi, P: Prompter> Session<A, P> {
    /// `consumer_key` is only used if authentication has to run; otherwise
    /// the user is prompted for one.
    pub fn new(
        api: A,
        prompter: P,
        credentials_path: impl Into<PathBuf>,
        consumer_key: Option<String>,
    ) -> Self {
        Session {
            api,
            prompter,
            credentials_path: credentials_path.into(),
            consumer_key,
            credentials: None,
            loaded: false,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// Run the full OAuth exchange and overwrite the credentials file.
    pub fn authenticate(&mut self) -> Result<Credentials> {
        let consumer_key = match &self.consumer_key {
            Some(key) => key.clone(),
            None => self.prompter.consumer_key()?,
        };

        let start = self.api.start_authentication(&consumer_key, REDIRECT_URI)?;
        debug!(code = %start.request_code, "received request code");

        if !self.prompter.confirm_authorization(&start.authorize_url)? {
            return Err(PocketError::Auth("authorization was not confirmed".into()));
        }

        let grant = self
            .api
            .finish_authentication(&consumer_key, &start.request_code)?;
        let credentials = Credentials {
            consumer_key,
            access_token: grant.access_token,
            username: grant.username,
        };
        credentials.save(&self.credentials_path)?;
        info!(path = %self.credentials_path.display(), "saved credentials");

        self.credentials = Some(credentials.clone());
        self.loaded = true;
        Ok(credentials)
    }

    /// Make sure credentials are available, loading or creating them once.
    fn ensure_credentials(&mut self) -> Result<()> {
        if !self.loaded {
            self.credentials = Credentials::load(&self.credentials_path)?;
            self.loaded = true;
        }
        if self.credentials.is_none() {
            ui::warning("No stored credentials, starting authentication.");
            self.authenticate()?;
        }
        Ok(())
    }

    fn loaded_credentials(&self) -> Result<&Credentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| PocketError::Auth("no credentials available".into()))
    }

    pub fn retrieve(&mut self, params: &QueryParams) -> Result<RetrieveResponse> {
        self.ensure_credentials()?;
        let credentials = self.loaded_credentials()?;
        debug!(?params, "retrieving items");

        let spinner = ui::spinner("Fetching items...");
        let response = self.api.retrieve(credentials, params);
        spinner.finish_and_clear();
        response
    }

    pub fn add(&mut self, url: &str, title: Option<&str>) -> Result<Value> {
        self.ensure_credentials()?;
        let credentials = self.loaded_credentials()?;
        self.api.add(credentials, url, title)
    }

    pub fn modify(&mut self, actions: &[Action]) -> Result<Value> {
        self.ensure_credentials()?;
        let credentials = self.loaded_credentials()?;
        self.api.modify(credentials, actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AccessGrant, ActionKind, AuthStart};
    use serde_json::json;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeApi {
        retrieves: Cell<usize>,
        authorized: bool,
    }

    impl PocketApi for FakeApi {
        fn start_authentication(&self, _key: &str, redirect_uri: &str) -> Result<AuthStart> {
            Ok(AuthStart {
                request_code: "code-1".into(),
                authorize_url: crate::api::authorize_url("code-1", redirect_uri),
            })
        }

        fn finish_authentication(&self, _key: &str, code: &str) -> Result<AccessGrant> {
            assert_eq!(code, "code-1");
            if !self.authorized {
                return Err(PocketError::Auth("authorization not granted".into()));
            }
            Ok(AccessGrant {
                access_token: "token-1".into(),
                username: "reader".into(),
            })
        }

        fn retrieve(
            &self,
            creds: &Credentials,
            _params: &QueryParams,
        ) -> Result<RetrieveResponse> {
            assert_eq!(creds.access_token, "token-1");
            self.retrieves.set(self.retrieves.get() + 1);
            Ok(RetrieveResponse::new(json!({"list": []})))
        }

        fn add(&self, _creds: &Credentials, _url: &str, _: Option<&str>) -> Result<Value> {
            Ok(json!({"status": 1}))
        }

        fn modify(&self, _creds: &Credentials, actions: &[Action]) -> Result<Value> {
            Ok(json!({"status": 1, "action_results": vec![true; actions.len()]}))
        }
    }

    struct ScriptedPrompter {
        key: &'static str,
        confirm: bool,
        asked: usize,
    }

    impl Prompter for ScriptedPrompter {
        fn consumer_key(&mut self) -> Result<String> {
            self.asked += 1;
            Ok(self.key.to_string())
        }

        fn confirm_authorization(&mut self, authorize_url: &str) -> Result<bool> {
            assert!(authorize_url.contains("request_token=code-1"));
            Ok(self.confirm)
        }
    }

    fn prompter(confirm: bool) -> ScriptedPrompter {
        ScriptedPrompter {
            key: "prompted-key",
            confirm,
            asked: 0,
        }
    }

    #[test]
    fn test_bootstrap_persists_credentials() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".pocket");
        let api = FakeApi {
            authorized: true,
            ..FakeApi::default()
        };
        let mut session = Session::new(api, prompter(true), &path, None);

        session.retrieve(&QueryParams::defaults()).unwrap();

        let saved = Credentials::load(&path).unwrap().unwrap();
        assert_eq!(saved.consumer_key, "prompted-key");
        assert_eq!(saved.access_token, "token-1");
        assert_eq!(saved.username, "reader");
        assert_eq!(session.prompter.asked, 1);
    }

    #[test]
    fn test_supplied_consumer_key_skips_prompt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".pocket");
        let api = FakeApi {
            authorized: true,
            ..FakeApi::default()
        };
        let mut session = Session::new(api, prompter(true), &path, Some("flag-key".into()));

        let creds = session.authenticate().unwrap();
        assert_eq!(creds.consumer_key, "flag-key");
        assert_eq!(session.prompter.asked, 0);
    }

    #[test]
    fn test_stored_credentials_load_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".pocket");
        Credentials {
            consumer_key: "k".into(),
            access_token: "token-1".into(),
            username: "reader".into(),
        }
        .save(&path)
        .unwrap();

        let mut session = Session::new(FakeApi::default(), prompter(true), &path, None);
        session.retrieve(&QueryParams::defaults()).unwrap();

        // Later calls must not go back to the file.
        std::fs::remove_file(&path).unwrap();
        session.retrieve(&QueryParams::defaults()).unwrap();
        session
            .modify(&[Action {
                action: ActionKind::Archive,
                item_id: "1".into(),
            }])
            .unwrap();

        assert_eq!(session.api().retrieves.get(), 2);
        assert_eq!(session.prompter.asked, 0);
    }

    #[test]
    fn test_declined_confirmation_is_auth_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".pocket");
        let mut session = Session::new(FakeApi::default(), prompter(false), &path, None);

        let err = session.retrieve(&QueryParams::defaults()).unwrap_err();
        assert!(matches!(err, PocketError::Auth(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_unapproved_code_is_auth_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".pocket");
        let mut session = Session::new(FakeApi::default(), prompter(true), &path, None);

        let err = session.authenticate().unwrap_err();
        assert!(matches!(err, PocketError::Auth(_)));
        assert!(!path.exists());
    }

    struct ClosedTerminal;

    impl Prompter for ClosedTerminal {
        fn consumer_key(&mut self) -> Result<String> {
            Err(PocketError::Prompt(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed",
            )))
        }

        fn confirm_authorization(&mut self, _authorize_url: &str) -> Result<bool> {
            panic!("confirmation asked before a consumer key was read");
        }
    }

    #[test]
    fn test_terminal_failure_is_prompt_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".pocket");
        let mut session = Session::new(FakeApi::default(), ClosedTerminal, &path, None);

        let err = session.retrieve(&QueryParams::defaults()).unwrap_err();
        assert!(matches!(err, PocketError::Prompt(_)));
        assert_eq!(session.api().retrieves.get(), 0);
        assert!(!path.exists());
    }
}
