/// Health Handlers
///
/// Liveness answers as long as the process serves HTTP. Readiness runs a
/// bounded `SELECT 1` so orchestration stops routing traffic while the
/// store is unreachable.
use actix_web::{web, HttpResponse};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tracing::warn;

use crate::db::StoreError;
use crate::error::{AppError, Result};
use crate::utils::run_with_timeout;

pub struct ReadinessProbe {
    pool: PgPool,
    timeout: Duration,
}

impl ReadinessProbe {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn check(&self) -> std::result::Result<(), StoreError> {
        run_with_timeout(self.timeout, async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok::<(), StoreError>(())
        })
        .await
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

pub async fn readiness(probe: web::Data<ReadinessProbe>) -> Result<HttpResponse> {
    probe.check().await.map_err(|e| {
        warn!(error = %e, reason = e.reason(), "Readiness check failed");
        AppError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(HealthResponse { status: "ready" }))
}
