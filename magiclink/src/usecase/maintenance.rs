use chrono::Utc;

use crate::domain::repository::TokenStore;
use crate::domain::types::TokenStats;
use crate::error::MagicLinkError;

/// Periodic sweep removing tokens past expiry, used or not. Driven by an
/// external scheduler; never part of the authentication path.
pub struct CleanupExpiredUseCase<S: TokenStore> {
    pub store: S,
}

impl<S: TokenStore> CleanupExpiredUseCase<S> {
    pub async fn execute(&self) -> Result<u64, MagicLinkError> {
        let deleted = self.store.delete_expired(Utc::now()).await?;
        tracing::info!(deleted, "expired magic links removed");
        Ok(deleted)
    }
}

/// Read-only token counts for external health tooling.
pub struct TokenStatsUseCase<S: TokenStore> {
    pub store: S,
}

impl<S: TokenStore> TokenStatsUseCase<S> {
    pub async fn execute(&self) -> Result<TokenStats, MagicLinkError> {
        let now = Utc::now();
        Ok(TokenStats {
            total: self.store.count_all().await?,
            expired: self.store.count_expired(now).await?,
        })
    }
}
