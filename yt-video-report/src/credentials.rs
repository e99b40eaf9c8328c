//! Cached OAuth credentials.
//!
//! A run needs one usable access token. [`acquire`] tries, in order: the token cached on disk
//! by a previous run, a refresh of that token, and finally the interactive flow of an
//! [`Authorizer`]. Whatever comes out of the last two is written back to the [`TokenCache`].

use crate::oauth::Authorizer;
use eyre::Context;
use jiff::{SignedDuration, Timestamp};
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Subtracted from the server-provided lifetime so a token never expires mid-request.
const EXPIRY_SAFETY_BUFFER: SignedDuration = SignedDuration::from_secs(300);

/// Assumed lifetime (buffer already applied) when the server does not say.
const DEFAULT_LIFETIME: SignedDuration = SignedDuration::from_secs(3300);

/// An OAuth token together with the moment its access token stops being usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBoundAccessToken {
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer)
    expires_at: Timestamp,
}

impl TimeBoundAccessToken {
    /// Creates a token that is already expired, forcing a refresh before first use.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Timestamp::UNIX_EPOCH,
            token,
        }
    }

    /// Wraps a token that was just issued by the server.
    ///
    /// The expiry time is calculated from the token's `expires_in` field minus a 5-minute
    /// safety buffer.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Self::calculate_token_expiry(&token),
            token,
        }
    }

    pub fn raw_token(&self) -> &BasicTokenResponse {
        &self.token
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn access_token(&self) -> &str {
        self.token.access_token().secret()
    }

    /// Whether the access token can still be presented to the API.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Timestamp::now())
    }

    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }

    /// Refreshes this token through `authorizer`, preserving the refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token was successfully refreshed
    /// * `Ok(false)` - Refresh failed (invalid grant, no refresh token, etc.)
    /// * `Err(_)` - Network or other error occurred
    pub async fn refresh(&mut self, authorizer: &impl Authorizer) -> eyre::Result<bool> {
        tracing::trace!("refreshing token");
        match authorizer
            .refresh(&self.token)
            .await
            .context("refresh OAuth token")?
        {
            Some(new_token) => {
                let old_token = std::mem::replace(&mut self.token, new_token);

                // Google usually leaves the refresh token out of refresh responses.
                if self.token.refresh_token().is_none() {
                    tracing::trace!("new token lacks refresh token, preserving original");
                    self.token
                        .set_refresh_token(old_token.refresh_token().cloned());
                }

                self.expires_at = Self::calculate_token_expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn calculate_token_expiry(token: &BasicTokenResponse) -> Timestamp {
        let now = Timestamp::now();
        match token.expires_in() {
            Some(expires_in) => {
                let lifetime = SignedDuration::try_from(expires_in).unwrap_or(DEFAULT_LIFETIME);
                now.saturating_add(lifetime - EXPIRY_SAFETY_BUFFER)
                    .unwrap_or(now)
            }
            None => now.saturating_add(DEFAULT_LIFETIME).unwrap_or(now),
        }
    }
}

/// The JSON file a token is kept in between runs.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached token.
    ///
    /// A missing file means there is no token yet. A file that cannot be parsed is treated
    /// the same way, since the interactive flow will overwrite it.
    pub async fn load(&self) -> eyre::Result<Option<TimeBoundAccessToken>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read token cache {}", self.path.display()));
            }
        };
        match serde_json::from_str(&json) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ignoring unreadable token cache"
                );
                Ok(None)
            }
        }
    }

    /// Writes `token` to the cache, readable only by the current user.
    pub async fn save(&self, token: &TimeBoundAccessToken) -> eyre::Result<()> {
        let json = serde_json::to_string_pretty(token).context("serialize OAuth token")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("write token cache {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .with_context(|| {
                    format!("set permissions on token cache {}", self.path.display())
                })?;
        }

        tracing::debug!(path = %self.path.display(), "saved OAuth token");
        Ok(())
    }
}

/// Returns a usable token, running the interactive flow only if nothing else works.
pub async fn acquire(
    cache: &TokenCache,
    authorizer: &impl Authorizer,
) -> eyre::Result<TimeBoundAccessToken> {
    if let Some(mut token) = cache.load().await? {
        if token.is_valid() {
            tracing::debug!(expires_at = %token.expires_at, "using cached OAuth token");
            return Ok(token);
        }

        tracing::info!("cached OAuth token expired, refreshing");
        if token.refresh(authorizer).await? {
            cache.save(&token).await?;
            return Ok(token);
        }
        tracing::warn!("cached OAuth token could not be refreshed, re-authorizing");
    } else {
        tracing::info!(path = %cache.path.display(), "no cached OAuth token");
    }

    let token = TimeBoundAccessToken::new(
        authorizer
            .authorize()
            .await
            .context("authorize access to YouTube")?,
    );
    cache.save(&token).await?;
    Ok(token)
}
