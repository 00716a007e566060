/// Per-scope fixed-window limit: `max_attempts` within `decay_minutes`.
#[derive(Debug, Clone, Copy)]
pub struct ScopeLimit {
    pub max_attempts: u32,
    pub decay_minutes: u64,
}

/// Rate-limit settings for the three issuance scopes.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub per_email: ScopeLimit,
    pub per_ip: ScopeLimit,
    pub global: ScopeLimit,
}

/// Magic-link configuration, loaded once at startup and read-only thereafter.
#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    /// Token time-to-live in minutes.
    pub link_expiration_minutes: i64,
    /// Where the embedding application sends the user after login.
    pub login_redirect: String,
    /// Subject line for the magic-link email.
    pub email_subject: String,
    /// Base URL for redemption links; the secret becomes the last path segment.
    pub login_url: String,
    pub rate_limiting: RateLimitConfig,
}

impl Default for MagicLinkConfig {
    fn default() -> Self {
        Self {
            link_expiration_minutes: 15,
            login_redirect: "/dashboard".to_owned(),
            email_subject: "Your Magic Login Link".to_owned(),
            login_url: "http://localhost/magic-link/login".to_owned(),
            rate_limiting: RateLimitConfig {
                enabled: true,
                per_email: ScopeLimit {
                    max_attempts: 3,
                    decay_minutes: 60,
                },
                per_ip: ScopeLimit {
                    max_attempts: 10,
                    decay_minutes: 60,
                },
                global: ScopeLimit {
                    max_attempts: 100,
                    decay_minutes: 60,
                },
            },
        }
    }
}

impl MagicLinkConfig {
    /// Load from `MAGICLINK_*` environment variables, falling back to the
    /// defaults above for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            link_expiration_minutes: env_or(
                "MAGICLINK_EXPIRATION_MINUTES",
                defaults.link_expiration_minutes,
            ),
            login_redirect: std::env::var("MAGICLINK_LOGIN_REDIRECT")
                .unwrap_or(defaults.login_redirect),
            email_subject: std::env::var("MAGICLINK_EMAIL_SUBJECT")
                .unwrap_or(defaults.email_subject),
            login_url: std::env::var("MAGICLINK_LOGIN_URL").unwrap_or(defaults.login_url),
            rate_limiting: RateLimitConfig {
                enabled: env_or("MAGICLINK_RATE_LIMITING_ENABLED", true),
                per_email: ScopeLimit {
                    max_attempts: env_or("MAGICLINK_EMAIL_MAX_ATTEMPTS", 3),
                    decay_minutes: env_or("MAGICLINK_EMAIL_DECAY_MINUTES", 60),
                },
                per_ip: ScopeLimit {
                    max_attempts: env_or("MAGICLINK_IP_MAX_ATTEMPTS", 10),
                    decay_minutes: env_or("MAGICLINK_IP_DECAY_MINUTES", 60),
                },
                global: ScopeLimit {
                    max_attempts: env_or("MAGICLINK_GLOBAL_MAX_ATTEMPTS", 100),
                    decay_minutes: env_or("MAGICLINK_GLOBAL_DECAY_MINUTES", 60),
                },
            },
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
