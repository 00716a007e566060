use std::time::Duration;

use magiclink::domain::repository::RateLimiter as _;
use magiclink::infra::memory::MemoryRateLimiter;

const WINDOW: u64 = 3600;

#[tokio::test]
async fn under_the_limit_is_not_rejected() {
    let limiter = MemoryRateLimiter::new();
    limiter.hit("k", WINDOW).await.unwrap();
    limiter.hit("k", WINDOW).await.unwrap();

    assert!(!limiter.too_many_attempts("k", 3).await.unwrap());
    assert_eq!(limiter.remaining_attempts("k", 3).await.unwrap(), 1);
}

#[tokio::test]
async fn at_the_limit_is_rejected() {
    let limiter = MemoryRateLimiter::new();
    for _ in 0..3 {
        limiter.hit("k", WINDOW).await.unwrap();
    }

    assert!(limiter.too_many_attempts("k", 3).await.unwrap());
    assert_eq!(limiter.remaining_attempts("k", 3).await.unwrap(), 0);
}

#[tokio::test]
async fn remaining_attempts_saturates_at_zero() {
    let limiter = MemoryRateLimiter::new();
    for _ in 0..5 {
        limiter.hit("k", WINDOW).await.unwrap();
    }
    assert_eq!(limiter.remaining_attempts("k", 3).await.unwrap(), 0);
}

#[tokio::test]
async fn available_in_reports_time_until_reset() {
    let limiter = MemoryRateLimiter::new();
    assert_eq!(
        limiter.available_in("k").await.unwrap(),
        0,
        "no window yet"
    );

    limiter.hit("k", WINDOW).await.unwrap();
    let wait = limiter.available_in("k").await.unwrap();
    assert!(wait > 0 && wait <= WINDOW, "wait was {wait}");
}

#[tokio::test]
async fn window_elapse_resets_the_counter() {
    let limiter = MemoryRateLimiter::new();
    limiter.hit("k", 1).await.unwrap();
    limiter.hit("k", 1).await.unwrap();
    assert!(limiter.too_many_attempts("k", 2).await.unwrap());

    tokio::time::sleep(Duration::from_millis(1200)).await;

    assert!(
        !limiter.too_many_attempts("k", 2).await.unwrap(),
        "counter must reset once the window elapses"
    );
    assert_eq!(limiter.remaining_attempts("k", 2).await.unwrap(), 2);

    // The next hit starts a fresh window.
    limiter.hit("k", 1).await.unwrap();
    assert_eq!(limiter.remaining_attempts("k", 2).await.unwrap(), 1);
}

#[tokio::test]
async fn keys_are_independent() {
    let limiter = MemoryRateLimiter::new();
    for _ in 0..3 {
        limiter.hit("magiclink:email:a@example.com", WINDOW).await.unwrap();
    }

    assert!(
        limiter
            .too_many_attempts("magiclink:email:a@example.com", 3)
            .await
            .unwrap()
    );
    assert!(
        !limiter
            .too_many_attempts("magiclink:email:b@example.com", 3)
            .await
            .unwrap()
    );
    assert!(!limiter.too_many_attempts("magiclink:global", 3).await.unwrap());
}
