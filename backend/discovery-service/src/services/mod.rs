//! Service layer for discovery-service
//!
//! Pure ranking stages (scoring, diversity, exploration, pagination) plus the
//! two orchestrating services that wire them to the stores and session caches.

pub mod diversity;
pub mod exploration;
pub mod fallback;
pub mod music;
pub mod pagination;
pub mod recommendation;
pub mod scoring;

pub use music::{BrowseRequest, MusicCatalogService, SearchRequest};
pub use recommendation::{RecommendationRequest, RecommendationService};
pub use scoring::{Scorer, ScoringWeights};
