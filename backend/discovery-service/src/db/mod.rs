//! Store collaborators
//!
//! The ranking core reads from an external PostgreSQL database through three
//! narrow traits. Filters are explicit predicate enums so every supported
//! condition is visible at the type level.
//!
//! Affinity is a single batched read keyed by the full candidate id set.
//! Nothing in this crate issues one query per candidate.

pub mod affinity_repo;
pub mod media_repo;
pub mod track_repo;

pub use affinity_repo::PgAffinityStore;
pub use media_repo::PgMediaStore;
pub use track_repo::PgTrackStore;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::models::{CandidateItem, TrackRecord, UserAffinity};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store read timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Short label for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            StoreError::Database(_) => "store_error",
            StoreError::Timeout(_) => "timeout",
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Conditions supported on the `media` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPredicate {
    PublicOnly,
    CategoryEquals(String),
    /// Case-insensitive substring match on title or description
    TextContains(String),
    CreatorEquals(String),
    IdNotIn(Vec<String>),
}

/// Conditions supported on the `verified_tracks` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackPredicate {
    /// Case-insensitive substring match on title, artist or album
    TextContains(String),
    GenreContains(String),
    MoodContains(String),
    ArtistContains(String),
    IdNotIn(Vec<String>),
}

/// A bounded read: predicates are AND-ed, ordering is fixed per table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery<P> {
    pub predicates: Vec<P>,
    pub limit: usize,
    pub offset: usize,
}

impl<P> CandidateQuery<P> {
    pub fn new(limit: usize) -> Self {
        Self {
            predicates: Vec::new(),
            limit,
            offset: 0,
        }
    }

    pub fn with(mut self, predicate: P) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_optional(self, predicate: Option<P>) -> Self {
        match predicate {
            Some(p) => self.with(p),
            None => self,
        }
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Public media, newest first, filtered by the query predicates
    async fn fetch_candidates(
        &self,
        query: &CandidateQuery<MediaPredicate>,
    ) -> StoreResult<Vec<CandidateItem>>;

    async fn distinct_categories(&self) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait TrackStore: Send + Sync {
    async fn count_tracks(&self, predicates: &[TrackPredicate]) -> StoreResult<u64>;

    /// Tracks ordered by verification time, newest first
    async fn fetch_tracks(
        &self,
        query: &CandidateQuery<TrackPredicate>,
    ) -> StoreResult<Vec<TrackRecord>>;

    async fn distinct_genres(&self) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait AffinityStore: Send + Sync {
    /// One round trip: liked candidates, subscriptions, liked creators, liked categories
    async fn load_affinity(
        &self,
        user_id: &str,
        candidate_ids: &[String],
    ) -> StoreResult<UserAffinity>;
}

/// Escape `%`, `_` and `\` so user text is matched literally by ILIKE
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Create the PostgreSQL pool and verify it with a bounded probe query
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_lazy(&config.url)?;

    match tokio::time::timeout(
        Duration::from_secs(config.acquire_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await
    {
        Ok(Ok(_)) => info!(
            max_connections = config.max_connections,
            "Database pool created and verified"
        ),
        // The service still starts: every endpoint has a degraded mode
        Ok(Err(e)) => tracing::warn!(error = %e, "Database verification failed at startup"),
        Err(_) => tracing::warn!(
            timeout_secs = config.acquire_timeout_secs,
            "Database verification timed out at startup"
        ),
    }

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("lo-fi"), "%lo-fi%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_candidate_query_builder() {
        let query = CandidateQuery::new(40)
            .with(MediaPredicate::PublicOnly)
            .with_optional(Some(MediaPredicate::CategoryEquals("Music".into())))
            .with_optional(None)
            .offset(5);

        assert_eq!(query.limit, 40);
        assert_eq!(query.offset, 5);
        assert_eq!(
            query.predicates,
            vec![
                MediaPredicate::PublicOnly,
                MediaPredicate::CategoryEquals("Music".into())
            ]
        );
    }
}
