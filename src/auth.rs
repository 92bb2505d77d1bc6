//! Authentication credentials and the on-disk JWT cache.
//!
//! A JWT is needed for requests scoped to user interactions (operations the
//! UI would perform, e.g. schema changes). A long-lived database token is
//! enough when only rows are created/read/updated/deleted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Default location of the JWT cache used by [`crate::BaserowClient::login`].
pub const DEFAULT_CREDENTIALS_FILE: &str = ".baserow-creds.json";

/// The credential attached to every request. Setting one kind replaces the
/// other; the two schemes are mutually exclusive on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Jwt(String),
    Token(String),
}

impl Credentials {
    /// Render the `Authorization` header value.
    pub fn header_value(&self) -> String {
        match self {
            Credentials::Jwt(jwt) => format!("JWT {}", jwt),
            Credentials::Token(token) => format!("Token {}", token),
        }
    }

    pub fn jwt(&self) -> Option<&str> {
        match self {
            Credentials::Jwt(jwt) => Some(jwt),
            Credentials::Token(_) => None,
        }
    }
}

/// JSON file mapping `url -> username -> jwt`, so a previously generated JWT
/// can be reused across processes and refreshed instead of re-authenticating
/// with a password.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CredentialsCache {
    #[serde(flatten)]
    entries: HashMap<String, HashMap<String, String>>,
    #[serde(skip)]
    path: PathBuf,
}

impl CredentialsCache {
    /// Load the cache from `path`, or start empty if the file does not exist
    /// or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE));
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::error!(path = %path.display(), %err, "unable to parse credentials file");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        CredentialsCache { entries, path }
    }

    /// Cached JWT for the given server URL and username, if any.
    pub fn get(&self, url: &str, username: &str) -> Option<&str> {
        self.entries
            .get(url)
            .and_then(|users| users.get(username))
            .map(String::as_str)
    }

    /// Store a JWT for the given server URL and username and write the file.
    pub fn put(&mut self, url: &str, username: &str, jwt: &str) -> Result<(), ApiError> {
        self.entries
            .entry(url.to_string())
            .or_default()
            .insert(username.to_string(), jwt.to_string());
        let text = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(())
    }
}
