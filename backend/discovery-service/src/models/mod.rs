use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Media kind as stored in the `media.type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    Video,
    Image,
    Audio,
}

impl MediaType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Video => "VIDEO",
            Self::Image => "IMAGE",
            Self::Audio => "AUDIO",
        }
    }

    /// Unknown values map to `Image`, the neutral type that gets no bonus
    pub fn parse_lossy(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "VIDEO" => Self::Video,
            "AUDIO" => Self::Audio,
            _ => Self::Image,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recommendable media post, as read from the candidate store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub media_type: MediaType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Primary popularity signal
    pub likes: u64,
    /// Secondary popularity signal
    pub views: u64,
    pub comment_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Per-request view of what the viewer already engaged with.
///
/// Built once per request from a single batched store read. The default
/// value is the anonymous viewer and yields no affinity bonus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAffinity {
    /// Candidate ids (from the current pool) the viewer has liked
    pub liked_item_ids: HashSet<String>,
    pub subscribed_creator_ids: HashSet<String>,
    pub liked_creator_ids: HashSet<String>,
    pub liked_categories: HashSet<String>,
}

impl UserAffinity {
    pub fn is_empty(&self) -> bool {
        self.liked_item_ids.is_empty()
            && self.subscribed_creator_ids.is_empty()
            && self.liked_creator_ids.is_empty()
            && self.liked_categories.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub item: CandidateItem,
    pub score: f64,
}

/// Recommended item as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedItem {
    #[serde(flatten)]
    pub item: CandidateItem,
    pub user_liked: bool,
}

/// Verified catalog track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    pub id: String,
    #[serde(rename = "uuid")]
    pub internal_uuid: String,
    pub title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPagination {
    pub total: usize,
    pub limit: usize,
    pub next_cursor: Option<String>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Option<String>,
    pub excluded_count: usize,
}

/// Response body of `GET /api/media/recommendations`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationPage {
    pub items: Vec<RecommendedItem>,
    pub pagination: CursorPagination,
    pub session: SessionSummary,
    /// True when the store was unavailable and static placeholder items were served
    pub fallback: bool,
}

impl RecommendationPage {
    pub fn empty(limit: usize, seed: String, session: SessionSummary) -> Self {
        Self {
            items: Vec::new(),
            pagination: CursorPagination {
                total: 0,
                limit,
                next_cursor: None,
                has_more: false,
                seed: Some(seed),
            },
            session,
            fallback: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPagination {
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    pub limit: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSession {
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewed_count: Option<usize>,
}

/// Response body of `GET /api/music/search` and `GET /api/music/browse`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPage {
    pub items: Vec<TrackRecord>,
    pub pagination: OffsetPagination,
    pub session: TrackSession,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_parse_lossy() {
        assert_eq!(MediaType::parse_lossy("video"), MediaType::Video);
        assert_eq!(MediaType::parse_lossy("AUDIO"), MediaType::Audio);
        assert_eq!(MediaType::parse_lossy("IMAGE"), MediaType::Image);
        assert_eq!(MediaType::parse_lossy("gif"), MediaType::Image);
    }

    #[test]
    fn test_recommended_item_flattens_candidate() {
        let item = RecommendedItem {
            item: CandidateItem {
                id: "m1".to_string(),
                creator_id: Some("u1".to_string()),
                creator_name: None,
                category: None,
                media_type: MediaType::Video,
                title: "Clip".to_string(),
                description: None,
                url: None,
                thumbnail_url: None,
                likes: 3,
                views: 10,
                comment_count: 0,
                created_at: Utc::now(),
            },
            user_liked: true,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "m1");
        assert_eq!(json["creatorId"], "u1");
        assert_eq!(json["mediaType"], "VIDEO");
        assert_eq!(json["userLiked"], true);
        assert!(json.get("category").is_none());
    }
}
