//! Credential store for the posting service
//!
//! Four opaque secrets, read once at startup from `credentials.toml` and
//! overridable through environment variables.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable names, in field order
pub const ENV_CONSUMER_KEY: &str = "PHOTO_BOOTH_CONSUMER_KEY";
pub const ENV_CONSUMER_SECRET: &str = "PHOTO_BOOTH_CONSUMER_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "PHOTO_BOOTH_ACCESS_TOKEN";
pub const ENV_ACCESS_TOKEN_SECRET: &str = "PHOTO_BOOTH_ACCESS_TOKEN_SECRET";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("failed to read credentials file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid credentials file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing credential `{0}`")]
    Missing(&'static str),
}

/// OAuth 1.0a user-context credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    access_token: Option<String>,
    access_token_secret: Option<String>,
}

impl Credentials {
    /// Load from `path` (if it exists), then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        let file = if path.exists() {
            info!("Loading credentials from {:?}", path);
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            debug!("No credentials file at {:?}", path);
            CredentialsFile::default()
        };

        Self::resolve(file, |name| std::env::var(name).ok())
    }

    fn resolve(
        file: CredentialsFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CredentialsError> {
        let pick = |from_env: Option<String>, from_file: Option<String>, name: &'static str| {
            from_env
                .or(from_file)
                .filter(|v| !v.is_empty())
                .ok_or(CredentialsError::Missing(name))
        };

        Ok(Self {
            consumer_key: pick(env(ENV_CONSUMER_KEY), file.consumer_key, "consumer_key")?,
            consumer_secret: pick(env(ENV_CONSUMER_SECRET), file.consumer_secret, "consumer_secret")?,
            access_token: pick(env(ENV_ACCESS_TOKEN), file.access_token, "access_token")?,
            access_token_secret: pick(
                env(ENV_ACCESS_TOKEN_SECRET),
                file.access_token_secret,
                "access_token_secret",
            )?,
        })
    }
}
