/// Session Cache
///
/// Process-local record of which ids each client session has already been
/// served. One instance exists per namespace (recommendations, search,
/// browse), each with its own TTL and sweep interval.
///
/// # Guarantees
/// - `touch` on one session id is atomic (DashMap shard lock)
/// - An entry idle longer than the TTL reads as a fresh session even
///   before the sweeper removes it
/// - Memory is bounded by the sweep: expired entries are dropped every
///   `sweep_interval`
use dashmap::DashMap;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::SessionNamespaceConfig;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub namespace: String,
    pub ttl: Duration,
    pub sweep_interval: Duration,
}

impl SessionConfig {
    pub fn new(namespace: impl Into<String>, ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            namespace: namespace.into(),
            ttl,
            sweep_interval,
        }
    }

    pub fn from_settings(namespace: impl Into<String>, settings: &SessionNamespaceConfig) -> Self {
        Self::new(namespace, settings.ttl(), settings.sweep_interval())
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    /// Ids served to this session so far
    pub shown: HashSet<String>,
    pub last_touched: Instant,
}

impl SessionState {
    fn new_at(now: Instant) -> Self {
        Self {
            shown: HashSet::new(),
            last_touched: now,
        }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_touched) > ttl
    }

    /// Shown ids in a stable order
    pub fn shown_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.shown.iter().cloned().collect();
        ids.sort();
        ids
    }
}

pub struct SessionCache {
    entries: DashMap<String, SessionState>,
    config: SessionConfig,
}

impl SessionCache {
    pub fn new(config: SessionConfig) -> Self {
        info!(
            namespace = %config.namespace,
            ttl_secs = config.ttl.as_secs(),
            sweep_secs = config.sweep_interval.as_secs(),
            "Initializing session cache"
        );
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Snapshot of the session, creating it on miss and refreshing its TTL
    pub fn get(&self, session_id: &str) -> SessionState {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState::new_at(now));

        if entry.is_expired(self.config.ttl, now) {
            debug!(namespace = %self.config.namespace, "Session expired, starting over");
            *entry = SessionState::new_at(now);
        } else {
            entry.last_touched = now;
        }
        entry.clone()
    }

    /// Record served ids and refresh the TTL
    pub fn touch<I>(&self, session_id: &str, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState::new_at(now));

        if entry.is_expired(self.config.ttl, now) {
            *entry = SessionState::new_at(now);
        }
        entry.shown.extend(ids);
        entry.last_touched = now;
    }

    /// Remove expired entries, returning how many were dropped
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.config.ttl;
        self.entries.retain(|_, state| !state.is_expired(ttl, now));

        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            info!(
                namespace = %self.config.namespace,
                removed = removed,
                remaining = self.entries.len(),
                "Swept expired sessions"
            );
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
