use crate::domain::types::RateScope;

/// Magic-link domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum MagicLinkError {
    #[error("too many requests ({scope}), retry in {retry_after_secs}s")]
    RateLimited {
        scope: RateScope,
        retry_after_secs: u64,
    },
    #[error("user not found")]
    UserNotFound,
    #[error("invalid or expired link")]
    InvalidOrExpired,
    #[error("secret generation exhausted")]
    GenerationExhausted,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl MagicLinkError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidOrExpired => "INVALID_OR_EXPIRED",
            Self::GenerationExhausted => "GENERATION_EXHAUSTED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

/// Token store failure modes. `DuplicateSecret` is the unique-index signal
/// that drives the generation retry loop.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate secret")]
    DuplicateSecret,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for MagicLinkError {
    fn from(err: StoreError) -> Self {
        match err {
            // A collision surfacing outside the generation retry loop is a
            // caller bug, not a domain outcome.
            StoreError::DuplicateSecret => {
                Self::Internal(anyhow::anyhow!("duplicate secret outside generation"))
            }
            StoreError::Backend(e) => Self::Internal(e),
        }
    }
}
