//! Music catalog: search and browse over verified tracks
//!
//! Both operations paginate by offset against the store and de-duplicate
//! per client session. Store failures propagate; handlers answer them with
//! an explicit error body.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::db::{CandidateQuery, StoreResult, TrackPredicate, TrackStore};
use crate::models::{OffsetPagination, TrackPage, TrackRecord, TrackSession};
use crate::session::SessionCache;
use crate::utils::run_with_timeout;

use super::exploration::{default_seed, SeededRng};

pub const SEARCH_DEFAULT_LIMIT: usize = 20;
pub const SEARCH_MAX_LIMIT: usize = 100;
pub const BROWSE_DEFAULT_LIMIT: usize = 20;
pub const BROWSE_MAX_LIMIT: usize = 50;

/// Upper bound on rows fetched for a shuffled search page
const SEARCH_SHUFFLE_CEILING: usize = 100;
/// Upper bound on rows sampled for a browse page
const BROWSE_FETCH_CEILING: usize = 150;

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub artist: Option<String>,
    pub limit: usize,
    pub offset: usize,
    pub session_id: Option<String>,
    pub shuffle: bool,
    pub exclude_recent: bool,
    pub seed: Option<String>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            genre: None,
            mood: None,
            artist: None,
            limit: SEARCH_DEFAULT_LIMIT,
            offset: 0,
            session_id: None,
            shuffle: false,
            exclude_recent: true,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowseRequest {
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub limit: usize,
    pub session_id: Option<String>,
    pub exclude_viewed: bool,
    pub seed: Option<String>,
}

impl Default for BrowseRequest {
    fn default() -> Self {
        Self {
            genre: None,
            mood: None,
            limit: BROWSE_DEFAULT_LIMIT,
            session_id: None,
            exclude_viewed: true,
            seed: None,
        }
    }
}

/// `min(limit * min(3, ceil(100 / limit)), 150)`
pub fn browse_fetch_limit(limit: usize) -> usize {
    let limit = limit.max(1);
    let multiplier = ((100 + limit - 1) / limit).min(3);
    (limit * multiplier).min(BROWSE_FETCH_CEILING)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub struct MusicCatalogService {
    tracks: Arc<dyn TrackStore>,
    search_sessions: Arc<SessionCache>,
    browse_sessions: Arc<SessionCache>,
    store_timeout: Duration,
}

impl MusicCatalogService {
    pub fn new(
        tracks: Arc<dyn TrackStore>,
        search_sessions: Arc<SessionCache>,
        browse_sessions: Arc<SessionCache>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            tracks,
            search_sessions,
            browse_sessions,
            store_timeout,
        }
    }

    pub async fn search(&self, request: SearchRequest) -> StoreResult<TrackPage> {
        let limit = request.limit.clamp(1, SEARCH_MAX_LIMIT);
        let offset = request.offset;

        let excluded = match (request.session_id.as_deref(), request.exclude_recent) {
            (Some(session_id), true) => self.search_sessions.get(session_id).shown_ids(),
            _ => Vec::new(),
        };

        let mut predicates = Vec::new();
        if let Some(text) = non_empty(&request.query) {
            predicates.push(TrackPredicate::TextContains(text));
        }
        if let Some(genre) = non_empty(&request.genre) {
            predicates.push(TrackPredicate::GenreContains(genre));
        }
        if let Some(mood) = non_empty(&request.mood) {
            predicates.push(TrackPredicate::MoodContains(mood));
        }
        if let Some(artist) = non_empty(&request.artist) {
            predicates.push(TrackPredicate::ArtistContains(artist));
        }
        if !excluded.is_empty() {
            predicates.push(TrackPredicate::IdNotIn(excluded.clone()));
        }

        let total = run_with_timeout(self.store_timeout, self.tracks.count_tracks(&predicates)).await?;

        let fetch_limit = if request.shuffle {
            (limit * 3).min(SEARCH_SHUFFLE_CEILING)
        } else {
            limit
        };
        let query = CandidateQuery {
            predicates,
            limit: fetch_limit,
            offset,
        };
        let mut tracks = run_with_timeout(self.store_timeout, self.tracks.fetch_tracks(&query)).await?;

        if request.shuffle && tracks.len() > limit {
            let seed = request
                .seed
                .clone()
                .unwrap_or_else(|| default_seed(Utc::now()));
            SeededRng::from_seed_str(&seed).shuffle(&mut tracks);
        }
        tracks.truncate(limit);

        if let Some(session_id) = request.session_id.as_deref() {
            self.search_sessions
                .touch(session_id, tracks.iter().map(|t| t.id.clone()));
        }

        let has_more = (offset as u64).saturating_add(tracks.len() as u64) < total;
        debug!(
            total = total,
            offset = offset,
            returned = tracks.len(),
            excluded = excluded.len(),
            "Music search"
        );

        Ok(TrackPage {
            items: tracks,
            pagination: OffsetPagination {
                total,
                offset: Some(offset),
                limit,
                has_more,
            },
            session: TrackSession {
                id: request.session_id,
                excluded_count: Some(excluded.len()),
                viewed_count: None,
            },
        })
    }

    /// Seeded random sample of the catalog, skipping what the session already saw
    pub async fn browse(&self, request: BrowseRequest) -> StoreResult<TrackPage> {
        let limit = request.limit.clamp(1, BROWSE_MAX_LIMIT);

        let viewed = match (request.session_id.as_deref(), request.exclude_viewed) {
            (Some(session_id), true) => self.browse_sessions.get(session_id).shown_ids(),
            _ => Vec::new(),
        };

        let mut predicates = Vec::new();
        if let Some(genre) = non_empty(&request.genre) {
            predicates.push(TrackPredicate::GenreContains(genre));
        }
        if let Some(mood) = non_empty(&request.mood) {
            predicates.push(TrackPredicate::MoodContains(mood));
        }
        if !viewed.is_empty() {
            predicates.push(TrackPredicate::IdNotIn(viewed.clone()));
        }

        let total = run_with_timeout(self.store_timeout, self.tracks.count_tracks(&predicates)).await?;
        if total == 0 {
            return Ok(TrackPage {
                items: Vec::new(),
                pagination: OffsetPagination {
                    total: 0,
                    offset: None,
                    limit,
                    has_more: false,
                },
                session: TrackSession {
                    id: request.session_id,
                    excluded_count: None,
                    viewed_count: Some(viewed.len()),
                },
            });
        }

        let seed = request.seed.clone().unwrap_or_else(|| {
            format!(
                "{}:{}",
                default_seed(Utc::now()),
                request.session_id.as_deref().unwrap_or_default()
            )
        });
        let mut rng = SeededRng::from_seed_str(&seed);

        let fetch_limit = browse_fetch_limit(limit);
        let total_rows = usize::try_from(total).unwrap_or(usize::MAX);
        let start = rng.up_to(total_rows.saturating_sub(fetch_limit));

        let query = CandidateQuery {
            predicates,
            limit: fetch_limit,
            offset: start,
        };
        let mut tracks: Vec<TrackRecord> =
            run_with_timeout(self.store_timeout, self.tracks.fetch_tracks(&query)).await?;
        rng.shuffle(&mut tracks);
        tracks.truncate(limit);

        if let Some(session_id) = request.session_id.as_deref() {
            self.browse_sessions
                .touch(session_id, tracks.iter().map(|t| t.id.clone()));
        }

        info!(
            total = total,
            offset = start,
            returned = tracks.len(),
            previously_viewed = viewed.len(),
            "Music browse"
        );

        let returned = tracks.len();
        Ok(TrackPage {
            items: tracks,
            pagination: OffsetPagination {
                total,
                offset: None,
                limit,
                has_more: (returned as u64) < total,
            },
            session: TrackSession {
                id: request.session_id,
                excluded_count: None,
                viewed_count: Some(viewed.len() + returned),
            },
        })
    }

    pub async fn genres(&self) -> StoreResult<Vec<String>> {
        run_with_timeout(self.store_timeout, self.tracks.distinct_genres()).await
    }
}
