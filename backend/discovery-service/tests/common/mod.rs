//! In-memory stores shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use discovery_service::config::RankingConfig;
use discovery_service::db::{
    AffinityStore, CandidateQuery, MediaPredicate, MediaStore, StoreError, StoreResult,
    TrackPredicate, TrackStore,
};
use discovery_service::models::{CandidateItem, MediaType, TrackRecord, UserAffinity};
use discovery_service::services::{MusicCatalogService, RecommendationService};
use discovery_service::session::{SessionCache, SessionConfig};

pub const STORE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Healthy,
    Failing,
    /// Sleeps longer than any test timeout before answering
    Slow,
}

async fn behave(behavior: Behavior) -> StoreResult<()> {
    match behavior {
        Behavior::Healthy => Ok(()),
        Behavior::Failing => Err(StoreError::Database(sqlx::Error::PoolTimedOut)),
        Behavior::Slow => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

pub fn media_item(id: &str, creator: Option<&str>, likes: u64, views: u64, age_hours: i64) -> CandidateItem {
    CandidateItem {
        id: id.to_string(),
        creator_id: creator.map(str::to_string),
        creator_name: creator.map(|c| format!("{} name", c)),
        category: Some("Entertainment".to_string()),
        media_type: MediaType::Video,
        title: format!("Clip {}", id),
        description: None,
        url: Some(format!("https://cdn.example/{}.mp4", id)),
        thumbnail_url: None,
        likes,
        views,
        comment_count: 0,
        created_at: Utc::now() - ChronoDuration::hours(age_hours),
    }
}

/// `count` items spread round-robin over `creators` creators
pub fn media_pool(count: usize, creators: usize) -> Vec<CandidateItem> {
    (0..count)
        .map(|i| {
            let creator = format!("creator-{}", i % creators.max(1));
            media_item(
                &format!("m{:03}", i),
                Some(&creator),
                (i as u64 * 7) % 50,
                (i as u64 * 31) % 400,
                (i as i64 * 5) % 300,
            )
        })
        .collect()
}

pub fn track(id: &str, genre: &str, mood: &str) -> TrackRecord {
    TrackRecord {
        id: id.to_string(),
        internal_uuid: format!("00000000-0000-0000-0000-{:0>12}", id.len()),
        title: format!("Song {}", id),
        artist: format!("Artist {}", id),
        album: Some("Night Drive".to_string()),
        genre: Some(genre.to_string()),
        mood: Some(mood.to_string()),
        duration_ms: Some(180_000),
        release_date: Some("2023-01-01".to_string()),
        isrc: None,
        verified_at: Some(Utc::now()),
    }
}

pub fn catalog(count: usize) -> Vec<TrackRecord> {
    (0..count)
        .map(|i| {
            let genre = if i % 2 == 0 { "Phonk" } else { "Lo-Fi" };
            track(&format!("t{:03}", i), genre, "dark")
        })
        .collect()
}

pub struct InMemoryMediaStore {
    items: Vec<CandidateItem>,
    categories: Vec<String>,
    behavior: Behavior,
    pub fetches: AtomicUsize,
}

impl InMemoryMediaStore {
    pub fn new(items: Vec<CandidateItem>) -> Self {
        Self::with_behavior(items, Behavior::Healthy)
    }

    pub fn with_behavior(items: Vec<CandidateItem>, behavior: Behavior) -> Self {
        Self {
            items,
            categories: vec!["Entertainment".to_string(), "Music".to_string()],
            behavior,
            fetches: AtomicUsize::new(0),
        }
    }

    fn matches(item: &CandidateItem, predicate: &MediaPredicate) -> bool {
        match predicate {
            MediaPredicate::PublicOnly => true,
            MediaPredicate::CategoryEquals(c) => item.category.as_deref() == Some(c.as_str()),
            MediaPredicate::TextContains(t) => {
                contains_ci(Some(&item.title), t) || contains_ci(item.description.as_deref(), t)
            }
            MediaPredicate::CreatorEquals(c) => item.creator_id.as_deref() == Some(c.as_str()),
            MediaPredicate::IdNotIn(ids) => !ids.contains(&item.id),
        }
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn fetch_candidates(
        &self,
        query: &CandidateQuery<MediaPredicate>,
    ) -> StoreResult<Vec<CandidateItem>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        behave(self.behavior).await?;

        let mut matched: Vec<CandidateItem> = self
            .items
            .iter()
            .filter(|item| query.predicates.iter().all(|p| Self::matches(item, p)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn distinct_categories(&self) -> StoreResult<Vec<String>> {
        behave(self.behavior).await?;
        Ok(self.categories.clone())
    }
}

pub struct InMemoryTrackStore {
    tracks: Vec<TrackRecord>,
    behavior: Behavior,
}

impl InMemoryTrackStore {
    pub fn new(tracks: Vec<TrackRecord>) -> Self {
        Self::with_behavior(tracks, Behavior::Healthy)
    }

    pub fn with_behavior(tracks: Vec<TrackRecord>, behavior: Behavior) -> Self {
        Self { tracks, behavior }
    }

    fn matching(&self, predicates: &[TrackPredicate]) -> Vec<TrackRecord> {
        self.tracks
            .iter()
            .filter(|t| {
                predicates.iter().all(|p| match p {
                    TrackPredicate::TextContains(q) => {
                        contains_ci(Some(&t.title), q)
                            || contains_ci(Some(&t.artist), q)
                            || contains_ci(t.album.as_deref(), q)
                    }
                    TrackPredicate::GenreContains(g) => contains_ci(t.genre.as_deref(), g),
                    TrackPredicate::MoodContains(m) => contains_ci(t.mood.as_deref(), m),
                    TrackPredicate::ArtistContains(a) => contains_ci(Some(&t.artist), a),
                    TrackPredicate::IdNotIn(ids) => !ids.contains(&t.id),
                })
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TrackStore for InMemoryTrackStore {
    async fn count_tracks(&self, predicates: &[TrackPredicate]) -> StoreResult<u64> {
        behave(self.behavior).await?;
        Ok(self.matching(predicates).len() as u64)
    }

    async fn fetch_tracks(
        &self,
        query: &CandidateQuery<TrackPredicate>,
    ) -> StoreResult<Vec<TrackRecord>> {
        behave(self.behavior).await?;
        Ok(self
            .matching(&query.predicates)
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn distinct_genres(&self) -> StoreResult<Vec<String>> {
        behave(self.behavior).await?;
        let mut genres: Vec<String> = self.tracks.iter().filter_map(|t| t.genre.clone()).collect();
        genres.sort();
        genres.dedup();
        Ok(genres)
    }
}

#[derive(Default)]
pub struct InMemoryAffinityStore {
    by_user: HashMap<String, UserAffinity>,
    pub calls: AtomicUsize,
}

impl InMemoryAffinityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: &str, affinity: UserAffinity) -> Self {
        self.by_user.insert(user_id.to_string(), affinity);
        self
    }
}

#[async_trait]
impl AffinityStore for InMemoryAffinityStore {
    async fn load_affinity(
        &self,
        user_id: &str,
        candidate_ids: &[String],
    ) -> StoreResult<UserAffinity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut affinity = self.by_user.get(user_id).cloned().unwrap_or_default();
        affinity
            .liked_item_ids
            .retain(|id| candidate_ids.contains(id));
        Ok(affinity)
    }
}

pub fn session_cache(namespace: &str, ttl: Duration) -> Arc<SessionCache> {
    Arc::new(SessionCache::new(SessionConfig::new(
        namespace,
        ttl,
        Duration::from_secs(60),
    )))
}

pub fn recommendation_service(
    media: Arc<dyn MediaStore>,
    affinity: Arc<dyn AffinityStore>,
    sessions: Arc<SessionCache>,
    store_timeout: Duration,
) -> RecommendationService {
    RecommendationService::new(media, affinity, sessions, RankingConfig::default(), store_timeout)
}

pub fn music_service(tracks: Arc<dyn TrackStore>) -> MusicCatalogService {
    MusicCatalogService::new(
        tracks,
        session_cache("search", Duration::from_secs(3600)),
        session_cache("browse", Duration::from_secs(7200)),
        STORE_TIMEOUT,
    )
}
