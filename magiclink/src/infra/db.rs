use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, SqlErr,
};
use uuid::Uuid;

use magiclink_schema::{magic_links, outbox_events};

use crate::domain::repository::{Mailer, TokenStore};
use crate::domain::types::{LinkEmail, MagicLink};
use crate::error::{MagicLinkError, StoreError};

// ── Token store ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTokenStore {
    pub db: DatabaseConnection,
}

impl TokenStore for DbTokenStore {
    async fn insert(
        &self,
        email: &str,
        secret: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<MagicLink, StoreError> {
        let result = magic_links::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_owned()),
            secret: Set(secret.to_owned()),
            issued_at: Set(issued_at),
            expires_at: Set(expires_at),
            used_at: Set(None),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(model) => Ok(link_from_model(model)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(StoreError::DuplicateSecret)
            }
            Err(e) => Err(StoreError::Backend(
                anyhow::Error::new(e).context("insert magic link"),
            )),
        }
    }

    async fn find_by_secret(&self, secret: &str) -> Result<Option<MagicLink>, StoreError> {
        let model = magic_links::Entity::find()
            .filter(magic_links::Column::Secret.eq(secret))
            .one(&self.db)
            .await
            .context("find magic link by secret")?;
        Ok(model.map(link_from_model))
    }

    async fn find_valid_by_secret(
        &self,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MagicLink>, StoreError> {
        let model = magic_links::Entity::find()
            .filter(magic_links::Column::Secret.eq(secret))
            .filter(magic_links::Column::UsedAt.is_null())
            .filter(magic_links::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await
            .context("find valid magic link")?;
        Ok(model.map(link_from_model))
    }

    async fn mark_used(&self, id: Uuid, used_at: DateTime<Utc>) -> Result<bool, StoreError> {
        // Conditional update: only one concurrent redeemer can flip used_at.
        let result = magic_links::Entity::update_many()
            .col_expr(magic_links::Column::UsedAt, Expr::value(used_at))
            .filter(magic_links::Column::Id.eq(id))
            .filter(magic_links::Column::UsedAt.is_null())
            .exec(&self.db)
            .await
            .context("mark magic link used")?;
        Ok(result.rows_affected == 1)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = magic_links::Entity::delete_many()
            .filter(magic_links::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await
            .context("delete expired magic links")?;
        Ok(result.rows_affected)
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        let count = magic_links::Entity::find()
            .count(&self.db)
            .await
            .context("count magic links")?;
        Ok(count)
    }

    async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let count = magic_links::Entity::find()
            .filter(magic_links::Column::ExpiresAt.lt(now))
            .count(&self.db)
            .await
            .context("count expired magic links")?;
        Ok(count)
    }
}

fn link_from_model(model: magic_links::Model) -> MagicLink {
    MagicLink {
        id: model.id,
        email: model.email,
        secret: model.secret,
        issued_at: model.issued_at,
        expires_at: model.expires_at,
        used_at: model.used_at,
    }
}

// ── Outbox mailer ─────────────────────────────────────────────────────────────

/// Queues magic-link emails as outbox rows; a relay worker owns delivery.
/// The idempotency key ties the event to its token so a retried enqueue
/// cannot double-send.
#[derive(Clone)]
pub struct OutboxMailer {
    pub db: DatabaseConnection,
}

impl Mailer for OutboxMailer {
    async fn enqueue(&self, email: &LinkEmail) -> Result<(), MagicLinkError> {
        let now = Utc::now();
        outbox_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set("magic_link_email".to_owned()),
            payload: Set(serde_json::json!({
                "recipient": email.recipient,
                "subject": email.subject,
                "link": email.link,
                "expires_in_minutes": email.expires_in_minutes,
            })),
            idempotency_key: Set(format!("magic_link_email:{}", email.token_id)),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(now),
            next_attempt_at: Set(now),
            processed_at: Set(None),
            failed_at: Set(None),
        }
        .insert(&self.db)
        .await
        .context("enqueue magic link email")?;
        Ok(())
    }
}
