//! Login-attempt throttling for the admin login endpoint
//!
//! A pure rate-limit guard keyed by a throttle identifier (device id header
//! if present, else client IP). It never inspects credentials; it only counts
//! failures per identifier and enforces a temporary lockout.
//!
//! The [`ThrottleStore`] trait is the seam for multi-instance deployments: the
//! in-memory implementation below is process-local, so a fleet would swap in a
//! shared counter store behind the same interface.

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, net::SocketAddr};
use tokio::sync::RwLock;

/// Outcome of a throttle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    /// Identifier is locked out; carries whole minutes remaining (at least 1)
    /// so the client can render a meaningful message.
    Blocked { minutes_remaining: i64 },
}

/// Failure-count policy for the throttle
#[derive(Debug, Clone, Copy)]
pub struct ThrottlePolicy {
    /// Failures before an identifier is blocked
    pub max_attempts: u32,
    /// Lockout window once blocked
    pub block_duration: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            block_duration: Duration::minutes(5),
        }
    }
}

/// Store of login-attempt state keyed by throttle identifier
#[async_trait]
pub trait ThrottleStore: Send + Sync {
    /// Check whether an identifier may attempt a login right now.
    /// An elapsed block is cleared as a side effect.
    async fn is_allowed(&self, identifier: &str) -> ThrottleDecision;

    /// Record a failed attempt; sets the block once the policy limit is hit.
    async fn record_failure(&self, identifier: &str);

    /// Reset the identifier's state (called on successful login).
    async fn clear(&self, identifier: &str);
}

#[derive(Debug, Clone)]
struct AttemptRecord {
    count: u32,
    blocked_until: Option<DateTime<Utc>>,
    last_failure: DateTime<Utc>,
}

/// In-memory [`ThrottleStore`] for single-instance deployments and tests
pub struct InMemoryThrottleStore {
    attempts: RwLock<HashMap<String, AttemptRecord>>,
    policy: ThrottlePolicy,
}

impl InMemoryThrottleStore {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            attempts: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Drop records that are neither blocked nor recently active.
    /// Call periodically from a background task to bound memory.
    pub async fn purge_stale(&self) {
        let now = Utc::now();
        let horizon = self.policy.block_duration;
        let mut attempts = self.attempts.write().await;

        attempts.retain(|_, record| {
            if let Some(blocked_until) = record.blocked_until {
                if now < blocked_until {
                    return true;
                }
            }
            now - record.last_failure < horizon
        });
    }

    #[cfg(test)]
    async fn record_count(&self, identifier: &str) -> u32 {
        self.attempts
            .read()
            .await
            .get(identifier)
            .map(|r| r.count)
            .unwrap_or(0)
    }
}

impl Default for InMemoryThrottleStore {
    fn default() -> Self {
        Self::new(ThrottlePolicy::default())
    }
}

#[async_trait]
impl ThrottleStore for InMemoryThrottleStore {
    async fn is_allowed(&self, identifier: &str) -> ThrottleDecision {
        let now = Utc::now();
        let mut attempts = self.attempts.write().await;

        let Some(record) = attempts.get(identifier) else {
            return ThrottleDecision::Allowed;
        };

        if let Some(blocked_until) = record.blocked_until {
            if now < blocked_until {
                let seconds = (blocked_until - now).num_seconds().max(0);
                // Round up so "30 seconds left" reads as 1 minute.
                let minutes_remaining = ((seconds + 59) / 60).max(1);
                return ThrottleDecision::Blocked { minutes_remaining };
            }
            // Block elapsed: the identifier gets a fresh start.
            attempts.remove(identifier);
        }

        ThrottleDecision::Allowed
    }

    async fn record_failure(&self, identifier: &str) {
        let now = Utc::now();
        let mut attempts = self.attempts.write().await;

        let record = attempts
            .entry(identifier.to_string())
            .or_insert(AttemptRecord {
                count: 0,
                blocked_until: None,
                last_failure: now,
            });

        record.count += 1;
        record.last_failure = now;

        if record.count >= self.policy.max_attempts {
            record.blocked_until = Some(now + self.policy.block_duration);
            tracing::warn!(
                identifier = %identifier,
                failures = record.count,
                "Login identifier blocked"
            );
        }
    }

    async fn clear(&self, identifier: &str) {
        self.attempts.write().await.remove(identifier);
    }
}

/// Resolve the throttle identifier for a request: a client-supplied device id
/// wins, then forwarded/real IP headers, then the socket address.
pub fn throttle_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(device_id) = headers.get("x-device-id").and_then(|h| h.to_str().ok()) {
        let device_id = device_id.trim();
        if !device_id.is_empty() {
            return device_id.to_string();
        }
    }

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(ip) = forwarded.split(',').next() {
            let ip = ip.trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        return real_ip.trim().to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32, block_duration: Duration) -> ThrottlePolicy {
        ThrottlePolicy {
            max_attempts,
            block_duration,
        }
    }

    #[tokio::test]
    async fn test_blocks_after_max_failures() {
        let store = InMemoryThrottleStore::default();

        for _ in 0..4 {
            store.record_failure("device-1").await;
            assert_eq!(store.is_allowed("device-1").await, ThrottleDecision::Allowed);
        }

        // Fifth failure trips the block
        store.record_failure("device-1").await;
        match store.is_allowed("device-1").await {
            ThrottleDecision::Blocked { minutes_remaining } => {
                assert!((1..=5).contains(&minutes_remaining));
            }
            ThrottleDecision::Allowed => panic!("expected block after 5 failures"),
        }
    }

    #[tokio::test]
    async fn test_elapsed_block_clears_record() {
        let store = InMemoryThrottleStore::new(policy(3, Duration::zero()));

        for _ in 0..3 {
            store.record_failure("device-2").await;
        }

        // Zero-length window: the block has already elapsed, so the check
        // allows the attempt and wipes the stale record.
        assert_eq!(store.is_allowed("device-2").await, ThrottleDecision::Allowed);
        assert_eq!(store.record_count("device-2").await, 0);
    }

    #[tokio::test]
    async fn test_clear_resets_counter() {
        let store = InMemoryThrottleStore::default();

        for _ in 0..4 {
            store.record_failure("device-3").await;
        }
        store.clear("device-3").await;

        // One more failure is the first of a fresh series, not the fifth.
        store.record_failure("device-3").await;
        assert_eq!(store.is_allowed("device-3").await, ThrottleDecision::Allowed);
        assert_eq!(store.record_count("device-3").await, 1);
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let store = InMemoryThrottleStore::default();

        for _ in 0..5 {
            store.record_failure("attacker").await;
        }

        assert!(matches!(
            store.is_allowed("attacker").await,
            ThrottleDecision::Blocked { .. }
        ));
        assert_eq!(store.is_allowed("innocent").await, ThrottleDecision::Allowed);
    }

    #[tokio::test]
    async fn test_purge_keeps_blocked_records() {
        let store = InMemoryThrottleStore::default();

        for _ in 0..5 {
            store.record_failure("blocked-one").await;
        }
        store.record_failure("one-failure").await;

        store.purge_stale().await;

        // Blocked records survive purging; a recent single failure does too.
        assert!(matches!(
            store.is_allowed("blocked-one").await,
            ThrottleDecision::Blocked { .. }
        ));
        assert_eq!(store.record_count("one-failure").await, 1);
    }

    #[test]
    fn test_identifier_prefers_device_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-device-id", "unit-42".parse().unwrap());
        headers.insert("x-forwarded-for", "10.0.0.1".parse().unwrap());

        let peer: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        assert_eq!(throttle_identifier(&headers, Some(peer)), "unit-42");
    }

    #[test]
    fn test_identifier_falls_back_to_forwarded_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());

        assert_eq!(throttle_identifier(&headers, None), "10.0.0.1");
    }

    #[test]
    fn test_identifier_falls_back_to_socket_addr() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "192.168.1.5:443".parse().unwrap();

        assert_eq!(throttle_identifier(&headers, Some(peer)), "192.168.1.5");
        assert_eq!(throttle_identifier(&headers, None), "unknown");
    }
}
