/// Media Recommendation Handlers
///
/// GET /api/media/recommendations and GET /api/media/categories.
/// Both always answer 200: store trouble is absorbed by fallback data.
use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::middleware::Viewer;
use crate::services::recommendation::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::services::{RecommendationRequest, RecommendationService};
use crate::utils::params;

/// Query parameters for GET /api/media/recommendations, kept as raw strings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationQuery {
    pub limit: Option<String>,
    pub category: Option<String>,
    pub epsilon: Option<String>,
    /// Comma separated ids
    pub exclude: Option<String>,
    pub seed: Option<String>,
    pub cursor: Option<String>,
    pub session_id: Option<String>,
    pub exclude_recent: Option<String>,
}

impl RecommendationQuery {
    pub fn into_request(self) -> RecommendationRequest {
        RecommendationRequest {
            limit: params::bounded_usize(self.limit.as_deref(), DEFAULT_LIMIT, 1, MAX_LIMIT),
            category: params::non_blank(self.category.as_deref()),
            epsilon: params::float(self.epsilon.as_deref()),
            exclude: params::id_list(self.exclude.as_deref()),
            seed: params::non_blank(self.seed.as_deref()),
            cursor: params::non_blank(self.cursor.as_deref()),
            session_id: params::non_blank(self.session_id.as_deref()),
            issued_session: false,
            exclude_recent: params::flag(self.exclude_recent.as_deref(), true),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// GET /api/media/recommendations
///
/// A caller without a session id gets a fresh one back in `session.id`.
#[get("/api/media/recommendations")]
pub async fn get_recommendations(
    query: web::Query<RecommendationQuery>,
    viewer: Viewer,
    service: web::Data<RecommendationService>,
) -> HttpResponse {
    let mut request = query.into_inner().into_request();
    if request.session_id.is_none() {
        request.session_id = Some(Uuid::new_v4().to_string());
        request.issued_session = true;
    }

    debug!(
        limit = request.limit,
        category = ?request.category,
        has_cursor = request.cursor.is_some(),
        anonymous = viewer.is_anonymous(),
        "Recommendation request"
    );

    let page = service.recommend(request, viewer.user_id()).await;
    HttpResponse::Ok().json(page)
}

/// GET /api/media/categories
#[get("/api/media/categories")]
pub async fn get_categories(service: web::Data<RecommendationService>) -> HttpResponse {
    HttpResponse::Ok().json(CategoriesResponse {
        categories: service.categories().await,
    })
}
