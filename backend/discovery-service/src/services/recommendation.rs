//! Recommendation pipeline
//!
//! fetch pool -> load affinity -> score -> diversify -> explore merge ->
//! cursor page -> record session
//!
//! The candidate store is the only hard dependency. When it fails or times
//! out the caller still gets a page, built from static placeholders. An
//! affinity failure only costs personalization.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::RankingConfig;
use crate::db::{AffinityStore, CandidateQuery, MediaPredicate, MediaStore};
use crate::metrics;
use crate::models::{
    CandidateItem, CursorPagination, RecommendationPage, RecommendedItem, SessionSummary,
    UserAffinity,
};
use crate::session::SessionCache;
use crate::utils::run_with_timeout;

use super::diversity::{distinct_creators, per_creator_cap, rerank_for_diversity};
use super::exploration::{clamp_epsilon, default_seed, trending_pool, Explorer};
use super::fallback::FALLBACK_CATEGORIES;
use super::pagination::paginate_by_cursor;
use super::scoring::Scorer;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 100;

/// Category value that means "no filter"
const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    pub limit: usize,
    pub category: Option<String>,
    pub epsilon: Option<f64>,
    /// Ids the client asks to skip explicitly
    pub exclude: Vec<String>,
    pub seed: Option<String>,
    pub cursor: Option<String>,
    pub session_id: Option<String>,
    /// Set when the server minted `session_id` for this request. Such a
    /// session is echoed back but not stored until the client sends it.
    pub issued_session: bool,
    pub exclude_recent: bool,
}

impl Default for RecommendationRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            category: None,
            epsilon: None,
            exclude: Vec::new(),
            seed: None,
            cursor: None,
            session_id: None,
            issued_session: false,
            exclude_recent: true,
        }
    }
}

fn category_filter(category: Option<&str>) -> Option<MediaPredicate> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
        .map(|c| MediaPredicate::CategoryEquals(c.to_string()))
}

pub struct RecommendationService {
    media: Arc<dyn MediaStore>,
    affinity: Arc<dyn AffinityStore>,
    sessions: Arc<SessionCache>,
    scorer: Scorer,
    ranking: RankingConfig,
    store_timeout: Duration,
}

impl RecommendationService {
    pub fn new(
        media: Arc<dyn MediaStore>,
        affinity: Arc<dyn AffinityStore>,
        sessions: Arc<SessionCache>,
        ranking: RankingConfig,
        store_timeout: Duration,
    ) -> Self {
        Self {
            media,
            affinity,
            sessions,
            scorer: Scorer::new(ranking.weights.clone()),
            ranking,
            store_timeout,
        }
    }

    /// Build one page of recommendations. Never fails: store trouble yields the fallback page.
    pub async fn recommend(
        &self,
        request: RecommendationRequest,
        viewer: Option<&str>,
    ) -> RecommendationPage {
        let limit = request.limit.clamp(1, MAX_LIMIT);
        let epsilon = clamp_epsilon(request.epsilon, self.ranking.default_epsilon);
        let now = Utc::now();
        let seed = request
            .seed
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_seed(now));

        let mut exclusions: HashSet<String> = request.exclude.iter().cloned().collect();
        let tracked_session = request
            .session_id
            .as_deref()
            .filter(|_| !request.issued_session);

        if request.exclude_recent {
            if let Some(session_id) = tracked_session {
                exclusions.extend(self.sessions.get(session_id).shown);
            }
        }
        let mut excluded_ids: Vec<String> = exclusions.iter().cloned().collect();
        excluded_ids.sort();

        let session = SessionSummary {
            id: request.session_id.clone(),
            excluded_count: exclusions.len(),
        };

        let query = CandidateQuery::new(self.ranking.pool_size(limit))
            .with(MediaPredicate::PublicOnly)
            .with_optional(category_filter(request.category.as_deref()))
            .with(MediaPredicate::IdNotIn(excluded_ids));

        let pool = match run_with_timeout(self.store_timeout, self.media.fetch_candidates(&query))
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!(
                    error = %e,
                    reason = e.reason(),
                    "Candidate store unavailable, serving fallback recommendations"
                );
                metrics::record_fallback("recommendations", e.reason());
                let mut page = RecommendationPage::fallback();
                page.session.id = request.session_id;
                return page;
            }
        };

        // Stores may ignore IdNotIn
        let pool: Vec<CandidateItem> = pool
            .into_iter()
            .filter(|item| !exclusions.contains(&item.id))
            .collect();

        if pool.is_empty() {
            debug!(excluded = exclusions.len(), "Empty candidate pool");
            return RecommendationPage::empty(limit, seed, session);
        }

        let affinity = self.load_affinity(viewer, &pool).await;

        let trending = trending_pool(&pool, now);
        let ranked = self.scorer.rank(pool, &affinity, now);
        let cap = per_creator_cap(limit, distinct_creators(&ranked));
        let diversified: Vec<CandidateItem> = rerank_for_diversity(ranked, cap)
            .into_iter()
            .map(|scored| scored.item)
            .collect();

        let explorer = Explorer::new(limit, epsilon);
        let super_list = explorer.build_super_list(diversified, trending, &seed);
        let page = paginate_by_cursor(&super_list, request.cursor.as_deref(), limit);

        if let Some(session_id) = tracked_session {
            self.sessions
                .touch(session_id, page.items.iter().map(|item| item.id.clone()));
        }

        info!(
            limit = limit,
            epsilon = epsilon,
            explore = explorer.explore_count(),
            per_creator_cap = cap,
            returned = page.items.len(),
            personalized = !affinity.is_empty(),
            "Served recommendations"
        );

        let items = page
            .items
            .into_iter()
            .map(|item| RecommendedItem {
                user_liked: affinity.liked_item_ids.contains(&item.id),
                item,
            })
            .collect();

        RecommendationPage {
            items,
            pagination: CursorPagination {
                total: super_list.len(),
                limit,
                next_cursor: page.next_cursor,
                has_more: page.has_more,
                seed: Some(seed),
            },
            session,
            fallback: false,
        }
    }

    /// One batched read for the whole pool; failure degrades to the anonymous viewer
    async fn load_affinity(&self, viewer: Option<&str>, pool: &[CandidateItem]) -> UserAffinity {
        let Some(user_id) = viewer else {
            return UserAffinity::default();
        };

        let ids: Vec<String> = pool.iter().map(|item| item.id.clone()).collect();
        match run_with_timeout(self.store_timeout, self.affinity.load_affinity(user_id, &ids)).await
        {
            Ok(affinity) => affinity,
            Err(e) => {
                warn!(
                    user_id = user_id,
                    error = %e,
                    "Affinity lookup failed, ranking as anonymous"
                );
                metrics::record_fallback("recommendations_affinity", e.reason());
                UserAffinity::default()
            }
        }
    }

    /// Distinct public categories, or a fixed list when the store is unavailable
    pub async fn categories(&self) -> Vec<String> {
        match run_with_timeout(self.store_timeout, self.media.distinct_categories()).await {
            Ok(categories) => categories,
            Err(e) => {
                warn!(error = %e, "Category lookup failed, serving fallback categories");
                metrics::record_fallback("categories", e.reason());
                FALLBACK_CATEGORIES.iter().map(|c| c.to_string()).collect()
            }
        }
    }
}
