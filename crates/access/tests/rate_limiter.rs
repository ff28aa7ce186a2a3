//! Integration tests for the sliding-window `RateLimiter`.

mod common;

use std::sync::Arc;

use biolens_core::clock::Clock;
use biolens_core::rate_limit::RateLimitPolicy;
use chrono::Duration;
use common::{harness, Backend};

const CLIENT: &str = "203.0.113.7";
const ENDPOINT: &str = "/api/v1/sessions";

#[tokio::test]
async fn fourth_request_in_window_is_denied() {
    let h = harness(Backend::FallbackOnly);
    let policy = RateLimitPolicy::new(3, 60);

    let mut outcomes = Vec::new();
    for _ in 0..4 {
        let d = h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap();
        outcomes.push((d.allowed, d.quota.remaining));
        h.clock.advance(Duration::seconds(1));
    }

    assert_eq!(
        outcomes,
        vec![(true, 2), (true, 1), (true, 0), (false, 0)]
    );
}

#[tokio::test]
async fn denied_requests_do_not_consume_slots() {
    let h = harness(Backend::FallbackOnly);
    let policy = RateLimitPolicy::new(2, 60);
    let start = h.clock.now();

    assert!(h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap().allowed);
    h.clock.advance(Duration::seconds(10));
    assert!(h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap().allowed);

    // Hammer the limit; none of these are recorded.
    for _ in 0..20 {
        h.clock.advance(Duration::seconds(1));
        assert!(!h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap().allowed);
    }

    // The first request leaves the window at exactly start + 60s.
    h.clock.set(start + Duration::seconds(60));
    let d = h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap();
    assert!(d.allowed);
    assert_eq!(d.quota.remaining, 0);
}

#[tokio::test]
async fn quota_metadata_is_reported() {
    let h = harness(Backend::FallbackOnly);
    let policy = RateLimitPolicy::new(100, 3600);
    let d = h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap();

    assert_eq!(d.quota.limit, 100);
    assert_eq!(d.quota.remaining, 99);
    assert_eq!(d.quota.window_seconds, 3600);
    assert_eq!(d.quota.reset_time, h.clock.now().timestamp() + 3600);
}

#[tokio::test]
async fn windows_are_keyed_by_client_and_endpoint() {
    let h = harness(Backend::FallbackOnly);
    let policy = RateLimitPolicy::new(1, 60);

    assert!(h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap().allowed);
    assert!(!h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap().allowed);
    assert!(h.limiter.check("198.51.100.2", ENDPOINT, policy).await.unwrap().allowed);
    assert!(h.limiter.check(CLIENT, "/health", policy).await.unwrap().allowed);
}

#[tokio::test]
async fn same_instant_burst_never_exceeds_limit() {
    let h = harness(Backend::FallbackOnly);
    let policy = RateLimitPolicy::new(5, 60);

    let mut allowed = 0;
    for _ in 0..50 {
        if h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap().allowed {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 5);
}

#[tokio::test]
async fn concurrent_checks_never_exceed_limit() {
    let h = Arc::new(harness(Backend::FallbackOnly));
    let policy = RateLimitPolicy::new(5, 60);

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap() })
        })
        .collect();

    let mut allowed = 0;
    for task in tasks {
        if task.await.unwrap().allowed {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 5);
}

#[tokio::test]
async fn durable_outage_degrades_to_fallback_counting() {
    let h = harness(Backend::DurableDown);
    let policy = RateLimitPolicy::new(2, 60);

    let results: Vec<bool> = {
        let mut v = Vec::new();
        for _ in 0..3 {
            v.push(h.limiter.check(CLIENT, ENDPOINT, policy).await.unwrap().allowed);
        }
        v
    };
    assert_eq!(results, vec![true, true, false]);
}

#[tokio::test]
async fn purge_drains_spent_windows_from_fallback() {
    let h = harness(Backend::FallbackOnly);
    let policy = RateLimitPolicy::new(5, 3600);

    for i in 0..1000 {
        let client = format!("198.51.{}.{}", i / 256, i % 256);
        assert!(h.limiter.check(&client, ENDPOINT, policy).await.unwrap().allowed);
    }
    assert_eq!(h.store.fallback().held().await, 1000);

    h.clock.advance(Duration::hours(2));
    assert_eq!(h.sessions.cleanup_expired().await.unwrap(), 0);
    assert_eq!(h.store.fallback().held().await, 1000);

    assert_eq!(h.limiter.purge_expired().await.unwrap(), 1000);
    assert_eq!(h.store.fallback().held().await, 0);
}

#[tokio::test]
async fn purge_keeps_windows_still_in_use() {
    let h = harness(Backend::FallbackOnly);
    let policy = RateLimitPolicy::new(5, 60);

    h.limiter.check("old", ENDPOINT, policy).await.unwrap();
    h.clock.advance(Duration::seconds(45));
    h.limiter.check("recent", ENDPOINT, policy).await.unwrap();
    h.clock.advance(Duration::seconds(30));

    assert_eq!(h.limiter.purge_expired().await.unwrap(), 1);
    let d = h.limiter.check("recent", ENDPOINT, policy).await.unwrap();
    assert_eq!(d.quota.remaining, 3);
}
