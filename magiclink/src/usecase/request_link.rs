use chrono::Duration;

use crate::config::{MagicLinkConfig, ScopeLimit};
use crate::domain::repository::{Mailer, RateLimiter, TokenStore, UserDirectory};
use crate::domain::types::{LinkEmail, RateScope};
use crate::error::MagicLinkError;
use crate::usecase::lifecycle::TokenLifecycle;

fn email_key(email: &str) -> String {
    format!("magiclink:email:{email}")
}

fn ip_key(ip: &str) -> String {
    format!("magiclink:ip:{ip}")
}

const GLOBAL_KEY: &str = "magiclink:global";

pub struct RequestLinkInput {
    pub email: String,
    /// Client address for the per-IP limiter scope; `None` skips that scope.
    pub client_ip: Option<String>,
}

/// "Request a link" orchestration: rate limiting, user lookup, token
/// issuance, link construction and email enqueue.
pub struct RequestLinkUseCase<S, U, M, R>
where
    S: TokenStore,
    U: UserDirectory,
    M: Mailer,
    R: RateLimiter,
{
    pub tokens: TokenLifecycle<S>,
    pub users: U,
    pub mailer: M,
    pub limiter: R,
    pub config: MagicLinkConfig,
}

impl<S, U, M, R> RequestLinkUseCase<S, U, M, R>
where
    S: TokenStore,
    U: UserDirectory,
    M: Mailer,
    R: RateLimiter,
{
    pub async fn execute(&self, input: RequestLinkInput) -> Result<(), MagicLinkError> {
        // 1. Limiter checks in order email → ip → global; first exceeded
        //    scope wins.
        if self.config.rate_limiting.enabled {
            self.check_limits(&input).await?;
        }

        // 2. User lookup. This reveals address existence to the caller; the
        //    embedding application decides whether to collapse the response.
        self.users
            .find_by_email(&input.email)
            .await?
            .ok_or(MagicLinkError::UserNotFound)?;

        // 3. Issue token.
        let ttl = Duration::minutes(self.config.link_expiration_minutes);
        let link = self.tokens.issue(&input.email, ttl).await?;

        // 4. Redemption URL with the secret as the last path segment.
        let url = format!(
            "{}/{}",
            self.config.login_url.trim_end_matches('/'),
            link.secret
        );

        // 5. Queue the email. A failed enqueue is surfaced; delivery is not
        //    observed here.
        self.mailer
            .enqueue(&LinkEmail {
                token_id: link.id,
                recipient: input.email.clone(),
                subject: self.config.email_subject.clone(),
                link: url,
                expires_in_minutes: self.config.link_expiration_minutes,
            })
            .await?;

        // 6. Budget is consumed only by fully successful issuance; rejected
        //    and failed requests never hit the counters.
        if self.config.rate_limiting.enabled {
            self.hit_limiters(&input).await?;
        }

        tracing::info!(email = %input.email, "magic link enqueued");
        Ok(())
    }

    /// Attempts left for `email` in the current window. Unlimited
    /// (`u32::MAX`) when rate limiting is disabled.
    pub async fn remaining_attempts(&self, email: &str) -> Result<u32, MagicLinkError> {
        if !self.config.rate_limiting.enabled {
            return Ok(u32::MAX);
        }
        self.limiter
            .remaining_attempts(
                &email_key(email),
                self.config.rate_limiting.per_email.max_attempts,
            )
            .await
    }

    async fn check_limits(&self, input: &RequestLinkInput) -> Result<(), MagicLinkError> {
        let limits = &self.config.rate_limiting;
        self.check_scope(RateScope::Email, &email_key(&input.email), limits.per_email)
            .await?;
        if let Some(ip) = &input.client_ip {
            self.check_scope(RateScope::Ip, &ip_key(ip), limits.per_ip)
                .await?;
        }
        self.check_scope(RateScope::Global, GLOBAL_KEY, limits.global)
            .await
    }

    async fn check_scope(
        &self,
        scope: RateScope,
        key: &str,
        limit: ScopeLimit,
    ) -> Result<(), MagicLinkError> {
        if self.limiter.too_many_attempts(key, limit.max_attempts).await? {
            let retry_after_secs = self.limiter.available_in(key).await?;
            return Err(MagicLinkError::RateLimited {
                scope,
                retry_after_secs,
            });
        }
        Ok(())
    }

    async fn hit_limiters(&self, input: &RequestLinkInput) -> Result<(), MagicLinkError> {
        let limits = &self.config.rate_limiting;
        self.limiter
            .hit(&email_key(&input.email), limits.per_email.decay_minutes * 60)
            .await?;
        if let Some(ip) = &input.client_ip {
            self.limiter
                .hit(&ip_key(ip), limits.per_ip.decay_minutes * 60)
                .await?;
        }
        self.limiter
            .hit(GLOBAL_KEY, limits.global.decay_minutes * 60)
            .await
    }
}
