/// Affinity Repository
///
/// Loads everything the scorer needs about a viewer in one statement:
/// the rows are tagged by kind and folded into a `UserAffinity`.
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Instant;
use tracing::{debug, error};

use super::{AffinityStore, StoreResult};
use crate::metrics;
use crate::models::UserAffinity;

const AFFINITY_SQL: &str = r#"
    SELECT 'liked_item' AS kind, l.media_id AS value
    FROM likes l
    WHERE l.user_id = $1 AND l.media_id = ANY($2)
    UNION ALL
    SELECT 'subscribed_creator', s.subscribed_to_id
    FROM subscriptions s
    WHERE s.subscriber_id = $1
    UNION ALL
    SELECT DISTINCT 'liked_creator', m.uploader_id
    FROM likes l
    JOIN media m ON m.id = l.media_id
    WHERE l.user_id = $1 AND m.uploader_id IS NOT NULL
    UNION ALL
    SELECT DISTINCT 'liked_category', m.category
    FROM likes l
    JOIN media m ON m.id = l.media_id
    WHERE l.user_id = $1 AND m.category IS NOT NULL
"#;

pub struct PgAffinityStore {
    pool: PgPool,
}

impl PgAffinityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Fold tagged `(kind, value)` rows into an affinity record
pub(crate) fn fold_affinity_rows<I>(rows: I) -> UserAffinity
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut affinity = UserAffinity::default();
    for (kind, value) in rows {
        match kind.as_str() {
            "liked_item" => {
                affinity.liked_item_ids.insert(value);
            }
            "subscribed_creator" => {
                affinity.subscribed_creator_ids.insert(value);
            }
            "liked_creator" => {
                affinity.liked_creator_ids.insert(value);
            }
            "liked_category" => {
                affinity.liked_categories.insert(value);
            }
            other => debug!(kind = other, "Ignoring unknown affinity row"),
        }
    }
    affinity
}

#[async_trait]
impl AffinityStore for PgAffinityStore {
    async fn load_affinity(
        &self,
        user_id: &str,
        candidate_ids: &[String],
    ) -> StoreResult<UserAffinity> {
        let start = Instant::now();

        let rows = sqlx::query_as::<_, (String, String)>(AFFINITY_SQL)
            .bind(user_id)
            .bind(candidate_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(user_id = user_id, "Failed to load user affinity: {}", e);
                e
            })?;

        metrics::observe_store_latency("affinity.load", start.elapsed());

        let affinity = fold_affinity_rows(rows);
        debug!(
            user_id = user_id,
            liked_items = affinity.liked_item_ids.len(),
            subscriptions = affinity.subscribed_creator_ids.len(),
            "Loaded user affinity"
        );
        Ok(affinity)
    }
}
