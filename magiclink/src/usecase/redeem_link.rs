use crate::domain::repository::{TokenStore, UserDirectory};
use crate::domain::types::Identity;
use crate::error::MagicLinkError;
use crate::usecase::lifecycle::TokenLifecycle;

/// "Redeem a link" orchestration: validate, consume, resolve the identity.
pub struct RedeemLinkUseCase<S: TokenStore, U: UserDirectory> {
    pub tokens: TokenLifecycle<S>,
    pub users: U,
}

impl<S: TokenStore, U: UserDirectory> RedeemLinkUseCase<S, U> {
    /// All token failures collapse into `InvalidOrExpired`. A user that
    /// vanished after issuance is reported distinctly; the token itself
    /// already proved validity, so there is nothing left to hide.
    pub async fn execute(&self, secret: &str) -> Result<Identity, MagicLinkError> {
        let link = self.tokens.validate(secret).await?;
        self.tokens.consume(&link).await?;

        self.users
            .find_by_email(&link.email)
            .await?
            .ok_or(MagicLinkError::UserNotFound)
    }
}
