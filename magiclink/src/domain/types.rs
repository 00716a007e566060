use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// User identity resolved through the external user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// One-time magic-link token backing an emailed login URL.
#[derive(Debug, Clone)]
pub struct MagicLink {
    pub id: Uuid,
    /// Associated address; one email may have several outstanding tokens.
    pub email: String,
    /// High-entropy URL-safe secret, the sole credential. Never logged.
    pub secret: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set exactly once on consumption; a used token never reverts.
    pub used_at: Option<DateTime<Utc>>,
}

impl MagicLink {
    /// A token is valid iff it is unused and `now` is strictly before
    /// `expires_at` (`now == expires_at` is already expired).
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Rate-limit scope; issuance checks them in order email → ip → global and
/// the first exceeded scope wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateScope {
    Email,
    Ip,
    Global,
}

impl RateScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Ip => "ip",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for RateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound message content for a magic-link email.
#[derive(Debug, Clone, Serialize)]
pub struct LinkEmail {
    pub token_id: Uuid,
    pub recipient: String,
    pub subject: String,
    /// Full redemption URL with the secret embedded.
    pub link: String,
    /// For display in the email body.
    pub expires_in_minutes: i64,
}

/// Read-only store counts for health tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenStats {
    pub total: u64,
    pub expired: u64,
}

/// Secret length in characters over a 64-symbol URL-safe alphabet (≈258 bits).
pub const SECRET_LEN: usize = 43;

/// Bounded retries when a generated secret collides with an existing row.
pub const MAX_GENERATION_ATTEMPTS: usize = 5;
