pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};

pub use services::{
    BrowseRequest, MusicCatalogService, RecommendationRequest, RecommendationService,
    SearchRequest,
};
pub use session::{SessionCache, SessionConfig};
