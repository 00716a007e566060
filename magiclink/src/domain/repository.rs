#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{Identity, LinkEmail, MagicLink};
use crate::error::{MagicLinkError, StoreError};

/// Durable storage for issued magic-link tokens.
pub trait TokenStore: Send + Sync {
    /// Insert a new token row. Fails with `StoreError::DuplicateSecret` when
    /// `secret` collides with an existing row (unique index), letting the
    /// caller regenerate.
    async fn insert(
        &self,
        email: &str,
        secret: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<MagicLink, StoreError>;

    async fn find_by_secret(&self, secret: &str) -> Result<Option<MagicLink>, StoreError>;

    /// Find a token that is unused and unexpired, judged against the single
    /// `now` supplied by the caller.
    async fn find_valid_by_secret(
        &self,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MagicLink>, StoreError>;

    /// Set `used_at` only where it is still null, returning whether this
    /// caller performed the transition. `false` means another caller already
    /// consumed the token; this conditional update is the single-use
    /// guarantee under concurrent redemption.
    async fn mark_used(&self, id: Uuid, used_at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Delete every token with `expires_at < now`, used or not. Returns the
    /// number of rows removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn count_all(&self) -> Result<u64, StoreError>;

    async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Port for looking up accounts in the external user directory.
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, MagicLinkError>;
}

/// Port handing a magic-link email to an async delivery pipeline. `enqueue`
/// returns once the message is queued; delivery itself is never observed.
pub trait Mailer: Send + Sync {
    async fn enqueue(&self, email: &LinkEmail) -> Result<(), MagicLinkError>;
}

/// Fixed-window attempt counters shared by every caller of the same key.
///
/// The window starts at the first hit after a reset and the count drops to
/// zero once the window elapses. This is a fixed-window counter, not a
/// sliding log.
pub trait RateLimiter: Send + Sync {
    async fn too_many_attempts(
        &self,
        key: &str,
        max_attempts: u32,
    ) -> Result<bool, MagicLinkError>;

    /// Seconds until the window for `key` resets; 0 when no window is active.
    async fn available_in(&self, key: &str) -> Result<u64, MagicLinkError>;

    /// Record one attempt, starting the window if none is active. Increments
    /// are atomic with respect to concurrent callers.
    async fn hit(&self, key: &str, window_secs: u64) -> Result<(), MagicLinkError>;

    async fn remaining_attempts(
        &self,
        key: &str,
        max_attempts: u32,
    ) -> Result<u32, MagicLinkError>;
}
