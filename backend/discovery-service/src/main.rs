use actix_web::{dev::Service, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use discovery_service::config::Config;
use discovery_service::db::{
    self, AffinityStore, MediaStore, PgAffinityStore, PgMediaStore, PgTrackStore, TrackStore,
};
use discovery_service::handlers;
use discovery_service::jobs::start_session_sweeper;
use discovery_service::metrics;
use discovery_service::services::{MusicCatalogService, RecommendationService};
use discovery_service::session::{SessionCache, SessionConfig};

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Starting discovery-service v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Environment: {}", config.app.env);

    let pool = match db::create_pool(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    let media: Arc<dyn MediaStore> = Arc::new(PgMediaStore::new(pool.clone()));
    let tracks: Arc<dyn TrackStore> = Arc::new(PgTrackStore::new(pool.clone()));
    let affinity: Arc<dyn AffinityStore> = Arc::new(PgAffinityStore::new(pool.clone()));

    let recommendation_sessions = Arc::new(SessionCache::new(SessionConfig::from_settings(
        "recommendations",
        &config.sessions.recommendations,
    )));
    let search_sessions = Arc::new(SessionCache::new(SessionConfig::from_settings(
        "search",
        &config.sessions.search,
    )));
    let browse_sessions = Arc::new(SessionCache::new(SessionConfig::from_settings(
        "browse",
        &config.sessions.browse,
    )));

    let store_timeout = config.database.store_timeout();
    let readiness = web::Data::new(handlers::ReadinessProbe::new(pool, store_timeout));
    let recommendation_service = web::Data::new(RecommendationService::new(
        media,
        affinity,
        Arc::clone(&recommendation_sessions),
        config.ranking.clone(),
        store_timeout,
    ));
    let music_service = web::Data::new(MusicCatalogService::new(
        tracks,
        Arc::clone(&search_sessions),
        Arc::clone(&browse_sessions),
        store_timeout,
    ));

    // Sweepers stop once the HTTP server has drained
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweepers = vec![
        start_session_sweeper(recommendation_sessions, shutdown_rx.clone()),
        start_session_sweeper(search_sessions, shutdown_rx.clone()),
        start_session_sweeper(browse_sessions, shutdown_rx),
    ];

    tracing::info!("Starting HTTP server on 0.0.0.0:{}", config.app.port);

    let http_result = HttpServer::new(move || {
        App::new()
            .app_data(recommendation_service.clone())
            .app_data(music_service.clone())
            .app_data(readiness.clone())
            .wrap(TracingLogger::default())
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let path = req
                    .match_pattern()
                    .unwrap_or_else(|| req.path().to_string());
                let start = Instant::now();

                let fut = srv.call(req);
                async move {
                    match fut.await {
                        Ok(res) => {
                            metrics::observe_http_request(
                                &method,
                                &path,
                                res.status().as_u16(),
                                start.elapsed(),
                            );
                            Ok(res)
                        }
                        Err(err) => {
                            metrics::observe_http_request(&method, &path, 500, start.elapsed());
                            Err(err)
                        }
                    }
                }
            })
            .route("/health", web::get().to(handlers::liveness))
            .route("/api/v1/health/live", web::get().to(handlers::liveness))
            .route("/api/v1/health/ready", web::get().to(handlers::readiness))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::configure)
    })
    .bind(format!("0.0.0.0:{}", config.app.port))?
    .run()
    .await;

    tracing::info!("HTTP server stopped, shutting down session sweepers");
    let _ = shutdown_tx.send(true);
    for sweeper in sweepers {
        let _ = sweeper.await;
    }

    http_result
}
