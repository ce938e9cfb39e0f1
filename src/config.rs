//! Startup configuration.
//!
//! Everything here is read once, before the first request is sent. The
//! environment is accessed through a lookup closure so callers (and tests)
//! decide where values come from; [`Config::from_env`] wires it to the
//! process environment.

use snafu::{OptionExt, ResultExt, Snafu};
use std::fmt;
use tracing::{debug, warn};
use url::Url;

/// Variables searched for the API key, in priority order.
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];
/// Overrides the model used for every request.
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// Overrides the API base URL.
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "API key not found; set {} (or {}) in the environment or a .env file",
        API_KEY_VARS[0],
        API_KEY_VARS[1]
    ))]
    MissingCredential,

    #[snafu(display("invalid API base URL '{url}'"))]
    InvalidBaseUrl { source: url::ParseError, url: String },
}

/// The API key authorizing every call.
///
/// Blank keys are rejected at construction, so a `Credential` is always
/// usable. `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a key, returning `None` for an empty or whitespace-only value.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        (!key.is_empty()).then_some(Self(key))
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}

/// Looks `name` up in the process environment; unset or non-UTF-8 is `None`.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Reads the credential from the process environment.
pub fn load_credential() -> Result<Credential, Error> {
    load_credential_from(env_lookup)
}

/// Reads the credential through `lookup`, trying each of [`API_KEY_VARS`].
///
/// A variable that is set but blank counts as absent and the next one is tried.
pub fn load_credential_from<F>(lookup: F) -> Result<Credential, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let credential = API_KEY_VARS
        .into_iter()
        .find_map(|name| lookup(name).and_then(Credential::new));

    match &credential {
        Some(credential) => debug!(
            api_key.loaded = true,
            api_key.length = credential.expose().len(),
            "api key loaded"
        ),
        None => debug!(api_key.loaded = false, "api key not found"),
    }

    credential.context(MissingCredentialSnafu)
}

/// Everything needed to talk to the service.
#[derive(Debug, Clone)]
pub struct Config {
    pub credential: Credential,
    /// Model resource name, always prefixed with `models/`
    pub model: String,
    /// API root; always ends with `/`
    pub base_url: Url,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(env_lookup)
    }

    /// Loads configuration through `lookup`.
    ///
    /// The credential is required; model and base URL fall back to
    /// [`DEFAULT_MODEL`] and [`DEFAULT_BASE_URL`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = load_credential_from(&lookup)?;

        let model = non_blank(lookup(MODEL_VAR))
            .map(|model| normalize_model(&model))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = match non_blank(lookup(BASE_URL_VAR)) {
            Some(raw) => parse_base_url(&raw)?,
            None => parse_base_url(DEFAULT_BASE_URL)?,
        };

        debug!(%model, %base_url, "configuration loaded");

        Ok(Self {
            credential,
            model,
            base_url,
        })
    }
}

/// Loads `.env` from the working directory (or a parent) into the process
/// environment. A missing file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env file"),
        Err(error) if error.not_found() => debug!("no .env file found"),
        Err(error) => warn!(%error, "failed to load .env file"),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn normalize_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

fn parse_base_url(raw: &str) -> Result<Url, Error> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).context(InvalidBaseUrlSnafu { url: raw })
}
