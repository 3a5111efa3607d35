//! Environment-derived configuration, validated once at startup.

use tracing::warn;

pub const DEFAULT_PORT: u16 = 3002;
pub const DEFAULT_LOGICWARE_API_URL: &str = "https://gw.logicwareperu.com";
pub const DEFAULT_MANTRA_API_URL: &str = "https://wbpback.mantra.chat";
pub const DEFAULT_MANTRA_TAG_ID: &str = "TAG_NO_CALIFICADO";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT is not a valid port number: {0}")]
    InvalidPort(String),
    #[error("X_API_KEY and X_SUBDOMAIN must be set in production")]
    MissingCredentials,
}

#[derive(Debug, Clone)]
pub struct MantraConfig {
    pub group_id: String,
    pub api_key: String,
    pub tag_id: String,
}

impl MantraConfig {
    pub fn is_configured(&self) -> bool {
        !self.group_id.is_empty() && !self.api_key.is_empty()
    }
}

/// Loaded once at startup; the credential fields are never mutated and never
/// logged in full.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_key: String,
    pub subdomain: String,
    pub environment: Environment,
    pub mantra: MantraConfig,
    pub logicware_api_url: String,
    pub mantra_api_url: String,
}

impl Config {
    /// Reads the configuration from the environment. Missing LogicWare
    /// credentials are fatal in production, a warning otherwise. The env-var
    /// names match the original deployment's `.env` files.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match getenv("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        let api_key = getenv("X_API_KEY").unwrap_or_default();
        let subdomain = getenv("X_SUBDOMAIN").unwrap_or_default();
        let environment =
            Environment::from_tag(&getenv("NODE_ENV").unwrap_or_default());

        if api_key.is_empty() || subdomain.is_empty() {
            if environment == Environment::Production {
                return Err(ConfigError::MissingCredentials);
            }
            warn!(message = "X_API_KEY / X_SUBDOMAIN not set, LogicWare calls will fail");
        }

        let mantra = MantraConfig {
            group_id: getenv("MANTRA_GROUP_ID").unwrap_or_default(),
            api_key: getenv("MANTRA_API_KEY").unwrap_or_default(),
            tag_id: getenv("MANTRA_TAG_ID")
                .unwrap_or_else(|| DEFAULT_MANTRA_TAG_ID.to_owned()),
        };
        if !mantra.is_configured() {
            warn!(message = "MANTRA_GROUP_ID / MANTRA_API_KEY not set, contact submission will fail");
        }

        Ok(Self {
            port,
            api_key,
            subdomain,
            environment,
            mantra,
            logicware_api_url: getenv("LOGICWARE_API_URL")
                .unwrap_or_else(|| DEFAULT_LOGICWARE_API_URL.to_owned()),
            mantra_api_url: getenv("MANTRA_API_URL")
                .unwrap_or_else(|| DEFAULT_MANTRA_API_URL.to_owned()),
        })
    }

    pub fn api_key_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn subdomain_configured(&self) -> bool {
        !self.subdomain.is_empty()
    }
}

fn getenv(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|val| !val.is_empty())
}
