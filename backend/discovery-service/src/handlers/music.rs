/// Music Catalog Handlers
///
/// GET /api/music/search, GET /api/music/browse, GET /api/music/genres.
/// Store failures answer 500 with an explicit error and an empty item list.
use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::models::TrackRecord;
use crate::services::music::{
    BROWSE_DEFAULT_LIMIT, BROWSE_MAX_LIMIT, SEARCH_DEFAULT_LIMIT, SEARCH_MAX_LIMIT,
};
use crate::services::{BrowseRequest, MusicCatalogService, SearchRequest};
use crate::utils::params;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub artist: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub session_id: Option<String>,
    pub shuffle: Option<String>,
    pub exclude_recent: Option<String>,
    pub seed: Option<String>,
}

impl SearchQuery {
    pub fn into_request(self) -> SearchRequest {
        SearchRequest {
            query: params::non_blank(self.q.as_deref()),
            genre: params::non_blank(self.genre.as_deref()),
            mood: params::non_blank(self.mood.as_deref()),
            artist: params::non_blank(self.artist.as_deref()),
            limit: params::bounded_usize(
                self.limit.as_deref(),
                SEARCH_DEFAULT_LIMIT,
                1,
                SEARCH_MAX_LIMIT,
            ),
            offset: params::offset(self.offset.as_deref()),
            session_id: params::non_blank(self.session_id.as_deref()),
            shuffle: params::flag(self.shuffle.as_deref(), false),
            exclude_recent: params::flag(self.exclude_recent.as_deref(), true),
            seed: params::non_blank(self.seed.as_deref()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseQuery {
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub limit: Option<String>,
    pub session_id: Option<String>,
    pub exclude_viewed: Option<String>,
    pub seed: Option<String>,
}

impl BrowseQuery {
    pub fn into_request(self) -> BrowseRequest {
        BrowseRequest {
            genre: params::non_blank(self.genre.as_deref()),
            mood: params::non_blank(self.mood.as_deref()),
            limit: params::bounded_usize(
                self.limit.as_deref(),
                BROWSE_DEFAULT_LIMIT,
                1,
                BROWSE_MAX_LIMIT,
            ),
            session_id: params::non_blank(self.session_id.as_deref()),
            exclude_viewed: params::flag(self.exclude_viewed.as_deref(), true),
            seed: params::non_blank(self.seed.as_deref()),
        }
    }
}

/// Error body: an empty list is still present so clients can render without branching
#[derive(Debug, Serialize)]
pub struct CatalogErrorResponse {
    pub error: &'static str,
    pub items: Vec<TrackRecord>,
}

fn catalog_error(message: &'static str) -> HttpResponse {
    HttpResponse::InternalServerError().json(CatalogErrorResponse {
        error: message,
        items: Vec::new(),
    })
}

#[derive(Debug, Serialize)]
pub struct GenresResponse {
    pub genres: Vec<String>,
}

/// GET /api/music/search
#[get("/api/music/search")]
pub async fn search_tracks(
    query: web::Query<SearchQuery>,
    service: web::Data<MusicCatalogService>,
) -> HttpResponse {
    match service.search(query.into_inner().into_request()).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(e) => {
            error!(error = %e, reason = e.reason(), "Music search failed");
            catalog_error("Search failed")
        }
    }
}

/// GET /api/music/browse
#[get("/api/music/browse")]
pub async fn browse_tracks(
    query: web::Query<BrowseQuery>,
    service: web::Data<MusicCatalogService>,
) -> HttpResponse {
    match service.browse(query.into_inner().into_request()).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(e) => {
            error!(error = %e, reason = e.reason(), "Music browse failed");
            catalog_error("Browse failed")
        }
    }
}

/// GET /api/music/genres
#[get("/api/music/genres")]
pub async fn get_genres(service: web::Data<MusicCatalogService>) -> HttpResponse {
    match service.genres().await {
        Ok(genres) => HttpResponse::Ok().json(GenresResponse { genres }),
        Err(e) => {
            error!(error = %e, "Genre lookup failed");
            catalog_error("Genres unavailable")
        }
    }
}
