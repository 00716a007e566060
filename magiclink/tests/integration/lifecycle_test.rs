use chrono::{Duration, Utc};

use magiclink::error::MagicLinkError;
use magiclink::usecase::lifecycle::TokenLifecycle;

use crate::helpers::{CollidingTokenStore, MockTokenStore, expired_link, used_link, valid_link};

#[tokio::test]
async fn issue_creates_unused_token_with_requested_ttl() {
    let store = MockTokenStore::new();
    let lifecycle = TokenLifecycle {
        store: store.clone(),
    };

    let ttl = Duration::minutes(15);
    let link = lifecycle.issue("alice@example.com", ttl).await.unwrap();

    assert_eq!(link.email, "alice@example.com");
    assert_eq!(link.secret.len(), 43, "43 chars over a 64-symbol alphabet");
    assert!(link.used_at.is_none());
    assert_eq!(link.expires_at, link.issued_at + ttl);

    let links = store.links_handle();
    assert_eq!(links.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn issued_secrets_are_unique_across_the_store() {
    let store = MockTokenStore::new();
    let lifecycle = TokenLifecycle {
        store: store.clone(),
    };

    for _ in 0..50 {
        lifecycle
            .issue("alice@example.com", Duration::minutes(15))
            .await
            .unwrap();
    }

    let links = store.links_handle();
    let links = links.lock().unwrap();
    let mut secrets: Vec<&str> = links.iter().map(|l| l.secret.as_str()).collect();
    secrets.sort_unstable();
    secrets.dedup();
    assert_eq!(secrets.len(), 50, "every issued secret must be distinct");
}

#[tokio::test]
async fn issue_retries_past_secret_collisions() {
    // Four collisions still leave one attempt within the retry budget.
    let store = CollidingTokenStore::new(4);
    let lifecycle = TokenLifecycle { store };

    let link = lifecycle
        .issue("alice@example.com", Duration::minutes(15))
        .await
        .unwrap();
    assert_eq!(link.email, "alice@example.com");
}

#[tokio::test]
async fn issue_gives_up_after_exhausting_retries() {
    let store = CollidingTokenStore::new(5);
    let lifecycle = TokenLifecycle { store };

    let result = lifecycle
        .issue("alice@example.com", Duration::minutes(15))
        .await;
    assert!(
        matches!(result, Err(MagicLinkError::GenerationExhausted)),
        "expected GenerationExhausted, got {result:?}"
    );
}

#[tokio::test]
async fn validate_returns_live_token() {
    let link = valid_link("alice@example.com", "live-secret");
    let lifecycle = TokenLifecycle {
        store: MockTokenStore::with_links(vec![link.clone()]),
    };

    let found = lifecycle.validate("live-secret").await.unwrap();
    assert_eq!(found.id, link.id);
}

#[tokio::test]
async fn validate_collapses_unknown_expired_and_used_into_one_error() {
    let lifecycle = TokenLifecycle {
        store: MockTokenStore::with_links(vec![
            expired_link("alice@example.com", "stale-secret"),
            used_link("alice@example.com", "spent-secret"),
        ]),
    };

    for secret in ["no-such-secret", "stale-secret", "spent-secret"] {
        let result = lifecycle.validate(secret).await;
        assert!(
            matches!(result, Err(MagicLinkError::InvalidOrExpired)),
            "secret {secret:?} should be indistinguishable, got {result:?}"
        );
    }
}

#[tokio::test]
async fn expiry_boundary_is_exclusive() {
    let link = valid_link("alice@example.com", "boundary-secret");
    let store = MockTokenStore::with_links(vec![link.clone()]);

    use magiclink::domain::repository::TokenStore as _;
    let just_before = link.expires_at - Duration::milliseconds(1);
    assert!(
        store
            .find_valid_by_secret("boundary-secret", just_before)
            .await
            .unwrap()
            .is_some()
    );
    // now == expires_at is already expired; validity is strictly less-than.
    assert!(
        store
            .find_valid_by_secret("boundary-secret", link.expires_at)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn consume_transitions_exactly_once() {
    let link = valid_link("alice@example.com", "one-shot");
    let store = MockTokenStore::with_links(vec![link.clone()]);
    let lifecycle = TokenLifecycle {
        store: store.clone(),
    };

    lifecycle.consume(&link).await.unwrap();

    let links = store.links_handle();
    assert!(links.lock().unwrap()[0].used_at.is_some());

    let second = lifecycle.consume(&link).await;
    assert!(
        matches!(second, Err(MagicLinkError::InvalidOrExpired)),
        "second consume must lose, got {second:?}"
    );
}

#[tokio::test]
async fn concurrent_consumers_have_exactly_one_winner() {
    let link = valid_link("alice@example.com", "contested");
    let store = MockTokenStore::with_links(vec![link.clone()]);

    use magiclink::domain::repository::TokenStore as _;
    let now = Utc::now();
    let a = {
        let store = store.clone();
        let id = link.id;
        tokio::spawn(async move { store.mark_used(id, now).await.unwrap() })
    };
    let b = {
        let store = store.clone();
        let id = link.id;
        tokio::spawn(async move { store.mark_used(id, now).await.unwrap() })
    };

    let (won_a, won_b) = (a.await.unwrap(), b.await.unwrap());
    assert!(won_a ^ won_b, "exactly one caller must win the transition");
}

#[tokio::test]
async fn cleanup_removes_all_and_only_expired_tokens() {
    let live = valid_link("alice@example.com", "live");
    let stale = expired_link("alice@example.com", "stale");
    let spent = used_link("bob@example.com", "spent"); // used but unexpired
    let mut spent_and_stale = used_link("carol@example.com", "spent-stale");
    spent_and_stale.expires_at = Utc::now() - Duration::minutes(1);

    let store = MockTokenStore::with_links(vec![live, stale, spent, spent_and_stale]);
    let lifecycle = TokenLifecycle {
        store: store.clone(),
    };

    let now = Utc::now();
    // Both expired tokens go, used or not; live and merely-used ones stay.
    assert_eq!(lifecycle.cleanup(now).await.unwrap(), 2);
    assert_eq!(lifecycle.cleanup(now).await.unwrap(), 0, "idempotent");

    let links = store.links_handle();
    let links = links.lock().unwrap();
    assert_eq!(links.len(), 2);
    assert!(links.iter().all(|l| l.expires_at >= now));
}
