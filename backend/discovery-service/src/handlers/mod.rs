use actix_web::web;

pub mod health;
pub mod music;
pub mod recommendation;

pub use health::{liveness, readiness, ReadinessProbe};
pub use music::{browse_tracks, get_genres, search_tracks, BrowseQuery, SearchQuery};
pub use recommendation::{get_categories, get_recommendations, RecommendationQuery};

/// Register every discovery route; the services are expected as `web::Data` app data
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_recommendations)
        .service(get_categories)
        .service(search_tracks)
        .service(browse_tracks)
        .service(get_genres);
}
