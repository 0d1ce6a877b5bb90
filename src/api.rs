// API client module: a small blocking HTTP client for the Pocket v3 API.
// Every call is a JSON POST; the caller supplies the credentials so the
// client itself stays stateless apart from the connection pool.
//
// `PocketApi` is the seam the rest of the crate talks to, which lets the
// commands run against an in-memory fake in tests.

use crate::credentials::Credentials;
use crate::error::{PocketError, Result};
use crate::item::RetrieveResponse;
use crate::query::QueryParams;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Base URL used when `POCKET_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://getpocket.com/v3";

/// Page the user visits to grant access to a request token.
pub const AUTHORIZE_URL: &str = "https://getpocket.com/auth/authorize";

/// Result of the first OAuth step: the request code and where to send the
/// user to approve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStart {
    pub request_code: String,
    pub authorize_url: String,
}

/// Result of the final OAuth step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessGrant {
    pub access_token: String,
    pub username: String,
}

/// Item mutations accepted by the `send` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Archive,
    Readd,
    Favorite,
    Unfavorite,
    Delete,
}

/// One entry of a modify batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub action: ActionKind,
    pub item_id: String,
}

/// The four logical operations the service offers.
pub trait PocketApi {
    fn start_authentication(&self, consumer_key: &str, redirect_uri: &str) -> Result<AuthStart>;

    /// Fails with `PocketError::Auth` if the user has not approved the code.
    fn finish_authentication(&self, consumer_key: &str, request_code: &str)
        -> Result<AccessGrant>;

    fn retrieve(&self, credentials: &Credentials, params: &QueryParams)
        -> Result<RetrieveResponse>;

    fn add(&self, credentials: &Credentials, url: &str, title: Option<&str>) -> Result<Value>;

    /// Actions are applied in order.
    fn modify(&self, credentials: &Credentials, actions: &[Action]) -> Result<Value>;
}

/// Build the URL the user must open to approve `request_code`.
pub fn authorize_url(request_code: &str, redirect_uri: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("request_token", request_code)
        .append_pair("redirect_uri", redirect_uri)
        .finish();
    format!("{AUTHORIZE_URL}?{query}")
}

/// Blocking reqwest client for the real service.
#[derive(Clone)]
pub struct PocketClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct RequestTokenBody<'a> {
    consumer_key: &'a str,
    redirect_uri: &'a str,
}

#[derive(Deserialize)]
struct RequestTokenReply {
    code: String,
}

#[derive(Serialize)]
struct AccessTokenBody<'a> {
    consumer_key: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct AddBody<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

#[derive(Serialize)]
struct SendBody<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    actions: &'a [Action],
}

impl PocketClient {
    /// Create a client for `POCKET_API_URL`, falling back to the public API.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("POCKET_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pocket-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(PocketClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// POST `body` to `endpoint` and return the decoded JSON reply.
    /// Non-success statuses become `PocketError::Api` carrying `X-Error`.
    fn post<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, "POST");

        let res = self
            .client
            .post(&url)
            .header("X-Accept", "application/json")
            .json(body)
            .send()?;

        let status = res.status();
        if !status.is_success() {
            let message = res
                .headers()
                .get("X-Error")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_owned());
            debug!(%url, status = status.as_u16(), %message, "request rejected");
            return Err(PocketError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(res.json()?)
    }
}

impl PocketApi for PocketClient {
    fn start_authentication(&self, consumer_key: &str, redirect_uri: &str) -> Result<AuthStart> {
        let body = RequestTokenBody {
            consumer_key,
            redirect_uri,
        };
        let reply: RequestTokenReply = serde_json::from_value(self.post("oauth/request", &body)?)?;
        Ok(AuthStart {
            authorize_url: authorize_url(&reply.code, redirect_uri),
            request_code: reply.code,
        })
    }

    fn finish_authentication(
        &self,
        consumer_key: &str,
        request_code: &str,
    ) -> Result<AccessGrant> {
        let body = AccessTokenBody {
            consumer_key,
            code: request_code,
        };
        match self.post("oauth/authorize", &body) {
            Ok(reply) => Ok(serde_json::from_value(reply)?),
            Err(PocketError::Api { status, message })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                Err(PocketError::Auth(format!(
                    "authorization not granted ({message})"
                )))
            }
            Err(e) => Err(e),
        }
    }

    fn retrieve(
        &self,
        credentials: &Credentials,
        params: &QueryParams,
    ) -> Result<RetrieveResponse> {
        let mut body = Map::new();
        for (key, value) in params.iter() {
            body.insert(key.to_string(), Value::from(value));
        }
        body.insert("consumer_key".into(), Value::from(credentials.consumer_key.as_str()));
        body.insert("access_token".into(), Value::from(credentials.access_token.as_str()));

        Ok(RetrieveResponse::new(self.post("get", &body)?))
    }

    fn add(&self, credentials: &Credentials, url: &str, title: Option<&str>) -> Result<Value> {
        let body = AddBody {
            consumer_key: &credentials.consumer_key,
            access_token: &credentials.access_token,
            url,
            title,
        };
        self.post("add", &body)
    }

    fn modify(&self, credentials: &Credentials, actions: &[Action]) -> Result<Value> {
        let body = SendBody {
            consumer_key: &credentials.consumer_key,
            access_token: &credentials.access_token,
            actions,
        };
        self.post("send", &body)
    }
}
