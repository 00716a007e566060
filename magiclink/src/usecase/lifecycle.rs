use chrono::{DateTime, Duration, Utc};
use rand::RngExt;

use crate::domain::repository::TokenStore;
use crate::domain::types::{MAX_GENERATION_ATTEMPTS, MagicLink, SECRET_LEN};
use crate::error::{MagicLinkError, StoreError};

/// Charset for generating secrets (64 URL-safe symbols, so every character
/// carries 6 bits of entropy).
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn generate_secret() -> String {
    let mut rng = rand::rng();
    (0..SECRET_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Token state machine: an issued token is valid until consumed or expired;
/// used and expired are both terminal.
#[derive(Clone)]
pub struct TokenLifecycle<S: TokenStore> {
    pub store: S,
}

impl<S: TokenStore> TokenLifecycle<S> {
    /// Issue a fresh token for `email`, expiring `ttl` from now.
    ///
    /// Secret uniqueness is enforced by the store's unique index; on a
    /// collision the secret is regenerated, up to `MAX_GENERATION_ATTEMPTS`
    /// times.
    pub async fn issue(&self, email: &str, ttl: Duration) -> Result<MagicLink, MagicLinkError> {
        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let secret = generate_secret();
            let now = Utc::now();
            match self.store.insert(email, &secret, now, now + ttl).await {
                Ok(link) => return Ok(link),
                Err(StoreError::DuplicateSecret) => continue,
                Err(StoreError::Backend(e)) => return Err(MagicLinkError::Internal(e)),
            }
        }
        // Repeated collisions point at an entropy or store problem.
        tracing::error!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "secret generation exhausted"
        );
        Err(MagicLinkError::GenerationExhausted)
    }

    /// Look up a token that is still redeemable. Unknown, expired and
    /// already-used secrets all collapse into `InvalidOrExpired` so callers
    /// cannot probe which tokens exist.
    pub async fn validate(&self, secret: &str) -> Result<MagicLink, MagicLinkError> {
        self.store
            .find_valid_by_secret(secret, Utc::now())
            .await?
            .ok_or(MagicLinkError::InvalidOrExpired)
    }

    /// Consume a previously validated token. The store's conditional update
    /// lets exactly one concurrent caller win; losers get `InvalidOrExpired`.
    pub async fn consume(&self, link: &MagicLink) -> Result<(), MagicLinkError> {
        if self.store.mark_used(link.id, Utc::now()).await? {
            Ok(())
        } else {
            Err(MagicLinkError::InvalidOrExpired)
        }
    }

    /// Remove every token past its expiry, used or not. Maintenance only,
    /// never on the authentication path.
    pub async fn cleanup(&self, now: DateTime<Utc>) -> Result<u64, MagicLinkError> {
        Ok(self.store.delete_expired(now).await?)
    }
}
