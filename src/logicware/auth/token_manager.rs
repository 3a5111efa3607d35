use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::{AuthError, Clock, SystemClock, TokenProvider};

/// Safety margin below the real token lifetime; the gateway does not report
/// one, so the cache assumes 55 minutes.
const TOKEN_TTL_MINUTES: i64 = 55;

/// Caches the bearer token obtained from a [`TokenProvider`] and refreshes
/// it once it expires. Reads take the `cached` lock only; a miss serializes
/// behind the `refresh` guard so concurrent misses perform a single
/// authentication call.
pub struct TokenManager {
    provider: Box<dyn TokenProvider>,
    clock: Box<dyn Clock>,
    ttl: Duration,
    cached: RwLock<Option<Record>>,
    refresh: Mutex<()>,
}

#[derive(Debug, Clone)]
pub struct Record {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Record {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    Expired,
}

impl TokenState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Expired => "expired",
        }
    }
}

/// Cache snapshot reported by the health endpoint.
#[derive(Debug, Clone)]
pub struct TokenStatus {
    pub state: TokenState,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenManager {
    pub fn new(provider: impl TokenProvider + 'static) -> Self {
        Self::with_clock(provider, SystemClock)
    }

    pub fn with_clock(
        provider: impl TokenProvider + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            provider: Box::new(provider),
            clock: Box::new(clock),
            ttl: Duration::minutes(TOKEN_TTL_MINUTES),
            cached: RwLock::const_new(None),
            refresh: Mutex::const_new(()),
        }
    }

    /// Returns a usable token, refreshing the cache when the stored one is
    /// absent or past its expiry. A failed refresh leaves the cache as it
    /// was.
    pub async fn get_token(&self) -> Result<Record, AuthError> {
        if let Some(record) = self.lookup().await {
            debug!(message = "Using cached token", token_expires_at = %record.expires_at);
            return Ok(record);
        }

        let _refresh = self.refresh.lock().await;

        // Another caller may have refreshed while we waited on the guard.
        if let Some(record) = self.lookup().await {
            debug!(message = "Token refreshed by a concurrent caller", token_expires_at = %record.expires_at);
            return Ok(record);
        }

        let token_is_stale = self.cached.read().await.is_some();
        info!(
            message = "No valid cached token, about to get a new one",
            token_is_stale,
        );

        let access_token = self.provider.fetch_token().await?;
        let record = Record {
            access_token,
            expires_at: self.clock.now() + self.ttl,
        };
        self.cached.write().await.replace(record.clone());

        debug!(message = "Got new token", token_expires_at = %record.expires_at);

        Ok(record)
    }

    /// The manager's notion of current time, so callers reporting cache
    /// state alongside a timestamp agree with it under an injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current cache state without triggering a refresh.
    pub async fn status(&self) -> TokenStatus {
        let now = self.clock.now();
        match &*self.cached.read().await {
            Some(record) if !record.is_expired(now) => TokenStatus {
                state: TokenState::Valid,
                expires_at: Some(record.expires_at),
            },
            Some(record) => TokenStatus {
                state: TokenState::Expired,
                expires_at: Some(record.expires_at),
            },
            None => TokenStatus {
                state: TokenState::Expired,
                expires_at: None,
            },
        }
    }

    async fn lookup(&self) -> Option<Record> {
        let now = self.clock.now();
        self.cached
            .read()
            .await
            .as_ref()
            .filter(|record| !record.is_expired(now))
            .cloned()
    }
}
