use magiclink::domain::types::TokenStats;
use magiclink::usecase::maintenance::{CleanupExpiredUseCase, TokenStatsUseCase};

use crate::helpers::{MockTokenStore, expired_link, used_link, valid_link};

#[tokio::test]
async fn stats_report_total_and_expired_counts() {
    let store = MockTokenStore::with_links(vec![
        valid_link("alice@example.com", "a"),
        expired_link("alice@example.com", "b"),
        expired_link("bob@example.com", "c"),
        used_link("bob@example.com", "d"),
    ]);

    let stats = TokenStatsUseCase { store }.execute().await.unwrap();
    assert_eq!(
        stats,
        TokenStats {
            total: 4,
            expired: 2
        }
    );
}

#[tokio::test]
async fn cleanup_deletes_expired_and_reports_count() {
    let store = MockTokenStore::with_links(vec![
        valid_link("alice@example.com", "a"),
        expired_link("alice@example.com", "b"),
        expired_link("bob@example.com", "c"),
    ]);
    let cleanup = CleanupExpiredUseCase {
        store: store.clone(),
    };

    assert_eq!(cleanup.execute().await.unwrap(), 2);
    assert_eq!(cleanup.execute().await.unwrap(), 0, "second sweep is a no-op");

    let stats = TokenStatsUseCase { store }.execute().await.unwrap();
    assert_eq!(
        stats,
        TokenStats {
            total: 1,
            expired: 0
        }
    );
}

#[tokio::test]
async fn empty_store_reports_zeroes() {
    let store = MockTokenStore::new();
    let stats = TokenStatsUseCase {
        store: store.clone(),
    }
    .execute()
    .await
    .unwrap();
    assert_eq!(
        stats,
        TokenStats {
            total: 0,
            expired: 0
        }
    );
    assert_eq!(CleanupExpiredUseCase { store }.execute().await.unwrap(), 0);
}
