/// Track Repository
///
/// Reads over the `verified_tracks` catalog
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;
use tracing::{debug, error};

use super::{like_pattern, CandidateQuery, StoreResult, TrackPredicate, TrackStore};
use crate::metrics;
use crate::models::TrackRecord;

#[derive(Debug, sqlx::FromRow)]
struct TrackRow {
    id: String,
    internal_uuid: String,
    title: String,
    artist: String,
    album: Option<String>,
    genre: Option<String>,
    mood: Option<String>,
    duration_ms: Option<i32>,
    release_date: Option<String>,
    isrc: Option<String>,
    verified_at: Option<DateTime<Utc>>,
}

impl From<TrackRow> for TrackRecord {
    fn from(row: TrackRow) -> Self {
        TrackRecord {
            id: row.id,
            internal_uuid: row.internal_uuid,
            title: row.title,
            artist: row.artist,
            album: row.album,
            genre: row.genre,
            mood: row.mood,
            duration_ms: row.duration_ms,
            release_date: row.release_date,
            isrc: row.isrc,
            verified_at: row.verified_at,
        }
    }
}

pub struct PgTrackStore {
    pool: PgPool,
}

impl PgTrackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_track_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[TrackPredicate]) {
    for predicate in predicates {
        match predicate {
            TrackPredicate::TextContains(text) => {
                let pattern = like_pattern(text);
                builder
                    .push(" AND (t.title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR t.artist ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR t.album ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            TrackPredicate::GenreContains(genre) => {
                builder.push(" AND t.genre ILIKE ").push_bind(like_pattern(genre));
            }
            TrackPredicate::MoodContains(mood) => {
                builder.push(" AND t.mood ILIKE ").push_bind(like_pattern(mood));
            }
            TrackPredicate::ArtistContains(artist) => {
                builder.push(" AND t.artist ILIKE ").push_bind(like_pattern(artist));
            }
            TrackPredicate::IdNotIn(ids) if !ids.is_empty() => {
                builder.push(" AND t.id <> ALL(").push_bind(ids.clone()).push(")");
            }
            TrackPredicate::IdNotIn(_) => {}
        }
    }
}

#[async_trait]
impl TrackStore for PgTrackStore {
    async fn count_tracks(&self, predicates: &[TrackPredicate]) -> StoreResult<u64> {
        let start = Instant::now();

        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM verified_tracks t WHERE TRUE");
        push_track_predicates(&mut builder, predicates);

        let total: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to count tracks: {}", e);
                e
            })?;

        metrics::observe_store_latency("tracks.count", start.elapsed());
        Ok(total.max(0) as u64)
    }

    async fn fetch_tracks(
        &self,
        query: &CandidateQuery<TrackPredicate>,
    ) -> StoreResult<Vec<TrackRecord>> {
        let start = Instant::now();

        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                t.id,
                t.internal_uuid,
                t.title,
                t.artist,
                t.album,
                t.genre,
                t.mood,
                t.duration_ms,
                t.release_date,
                t.isrc,
                t.verified_at
            FROM verified_tracks t
            WHERE TRUE"#,
        );
        push_track_predicates(&mut builder, &query.predicates);
        builder
            .push(" ORDER BY t.verified_at DESC NULLS LAST, t.created_at DESC LIMIT ")
            .push_bind(query.limit as i64)
            .push(" OFFSET ")
            .push_bind(query.offset as i64);

        let rows: Vec<TrackRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch tracks: {}", e);
                e
            })?;

        metrics::observe_store_latency("tracks.fetch", start.elapsed());
        debug!(rows = rows.len(), offset = query.offset, "Fetched tracks");

        Ok(rows.into_iter().map(TrackRecord::from).collect())
    }

    async fn distinct_genres(&self) -> StoreResult<Vec<String>> {
        let start = Instant::now();

        let genres = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT genre
            FROM verified_tracks
            WHERE genre IS NOT NULL AND genre <> ''
            ORDER BY genre
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        metrics::observe_store_latency("tracks.distinct_genres", start.elapsed());
        Ok(genres)
    }
}
