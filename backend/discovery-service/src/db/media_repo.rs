/// Media Repository
///
/// Candidate reads over the `media` table
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;
use tracing::{debug, error};

use super::{like_pattern, CandidateQuery, MediaPredicate, MediaStore, StoreResult};
use crate::metrics;
use crate::models::{CandidateItem, MediaType};

#[derive(Debug, sqlx::FromRow)]
struct MediaRow {
    id: String,
    uploader_id: Option<String>,
    uploader_name: Option<String>,
    category: Option<String>,
    media_type: String,
    title: String,
    description: Option<String>,
    url: Option<String>,
    thumbnail_url: Option<String>,
    likes: i64,
    views: i64,
    comment_count: i64,
    created_at: DateTime<Utc>,
}

impl From<MediaRow> for CandidateItem {
    fn from(row: MediaRow) -> Self {
        CandidateItem {
            id: row.id,
            creator_id: row.uploader_id,
            creator_name: row.uploader_name,
            category: row.category,
            media_type: MediaType::parse_lossy(&row.media_type),
            title: row.title,
            description: row.description,
            url: row.url,
            thumbnail_url: row.thumbnail_url,
            likes: row.likes.max(0) as u64,
            views: row.views.max(0) as u64,
            comment_count: row.comment_count.max(0) as u64,
            created_at: row.created_at,
        }
    }
}

pub struct PgMediaStore {
    pool: PgPool,
}

impl PgMediaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_media_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[MediaPredicate]) {
    for predicate in predicates {
        match predicate {
            MediaPredicate::PublicOnly => {
                builder.push(" AND m.is_public = TRUE");
            }
            MediaPredicate::CategoryEquals(category) => {
                builder.push(" AND m.category = ").push_bind(category.clone());
            }
            MediaPredicate::TextContains(text) => {
                let pattern = like_pattern(text);
                builder
                    .push(" AND (m.title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR m.description ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            MediaPredicate::CreatorEquals(creator_id) => {
                builder.push(" AND m.uploader_id = ").push_bind(creator_id.clone());
            }
            MediaPredicate::IdNotIn(ids) if !ids.is_empty() => {
                builder.push(" AND m.id <> ALL(").push_bind(ids.clone()).push(")");
            }
            MediaPredicate::IdNotIn(_) => {}
        }
    }
}

#[async_trait]
impl MediaStore for PgMediaStore {
    async fn fetch_candidates(
        &self,
        query: &CandidateQuery<MediaPredicate>,
    ) -> StoreResult<Vec<CandidateItem>> {
        let start = Instant::now();

        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                m.id,
                m.uploader_id,
                COALESCE(u.display_name, u.username) AS uploader_name,
                m.category,
                m.type AS media_type,
                m.title,
                m.description,
                m.url,
                m.thumbnail_url,
                COALESCE(m.likes, 0)::BIGINT AS likes,
                COALESCE(m.views, 0)::BIGINT AS views,
                (SELECT COUNT(*) FROM comments c WHERE c.media_id = m.id) AS comment_count,
                m.created_at
            FROM media m
            LEFT JOIN users u ON u.id = m.uploader_id
            WHERE TRUE"#,
        );
        push_media_predicates(&mut builder, &query.predicates);
        builder
            .push(" ORDER BY m.created_at DESC LIMIT ")
            .push_bind(query.limit as i64)
            .push(" OFFSET ")
            .push_bind(query.offset as i64);

        let rows: Vec<MediaRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch media candidates: {}", e);
                e
            })?;

        metrics::observe_store_latency("media.fetch_candidates", start.elapsed());
        debug!(rows = rows.len(), limit = query.limit, "Fetched media candidates");

        Ok(rows.into_iter().map(CandidateItem::from).collect())
    }

    async fn distinct_categories(&self) -> StoreResult<Vec<String>> {
        let start = Instant::now();

        let categories = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT category
            FROM media
            WHERE is_public = TRUE AND category IS NOT NULL AND category <> ''
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        metrics::observe_store_latency("media.distinct_categories", start.elapsed());
        Ok(categories)
    }
}
