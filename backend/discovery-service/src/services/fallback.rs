//! Static recommendations for when the candidate store is unavailable
//!
//! A short fixed list of placeholder videos keeps the feed rendering during
//! a database outage. Responses built here carry `fallback: true` so clients
//! and dashboards can tell them apart from ranked output.

use chrono::Utc;

use crate::models::{
    CandidateItem, CursorPagination, MediaType, RecommendationPage, RecommendedItem,
    SessionSummary,
};

/// Served by the categories endpoint when the store is unavailable
pub const FALLBACK_CATEGORIES: [&str; 3] = ["All", "Entertainment", "Sports"];

const SAMPLE_BUCKET: &str = "https://storage.googleapis.com/gtv-videos-bucket/sample";

/// (id, creator, file stem, title, description, views, likes, comments)
const PLACEHOLDERS: [(&str, &str, &str, &str, &str, u64, u64, u64); 5] = [
    ("1", "Sample Videos", "ForBiggerJoyrides", "For Bigger Joyrides", "An exciting ride through the city", 1200, 150, 45),
    ("2", "Epic Videos", "ForBiggerBlazes", "For Bigger Blazes", "Epic fire and flames showcase", 800, 89, 23),
    ("3", "Thrill Seekers", "ForBiggerEscapes", "For Bigger Escapes", "Thrilling escape sequences", 1500, 200, 67),
    ("4", "Fun Times", "ForBiggerFun", "For Bigger Fun", "Pure entertainment and fun", 900, 120, 34),
    ("5", "Action Central", "ForBiggerMeltdowns", "For Bigger Meltdowns", "Intense action sequences", 1100, 180, 56),
];

pub fn placeholder_items() -> Vec<CandidateItem> {
    let now = Utc::now();
    PLACEHOLDERS
        .iter()
        .map(
            |&(id, creator, stem, title, description, views, likes, comments)| CandidateItem {
                id: id.to_string(),
                creator_id: Some(id.to_string()),
                creator_name: Some(creator.to_string()),
                category: None,
                media_type: MediaType::Video,
                title: format!("{} - Recommended", title),
                description: Some(description.to_string()),
                url: Some(format!("{}/{}.mp4", SAMPLE_BUCKET, stem)),
                thumbnail_url: Some(format!(
                    "https://placehold.co/720x1280/282828/ffffff?text=Video+{}",
                    id
                )),
                likes,
                views,
                comment_count: comments,
                created_at: now,
            },
        )
        .collect()
}

impl RecommendationPage {
    /// Fixed placeholder page; never paginates
    pub fn fallback() -> Self {
        let items: Vec<RecommendedItem> = placeholder_items()
            .into_iter()
            .map(|item| RecommendedItem {
                item,
                user_liked: false,
            })
            .collect();
        let total = items.len();

        Self {
            items,
            pagination: CursorPagination {
                total,
                limit: total,
                next_cursor: None,
                has_more: false,
                seed: None,
            },
            session: SessionSummary {
                id: None,
                excluded_count: 0,
            },
            fallback: true,
        }
    }
}
