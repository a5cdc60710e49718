use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::services::scoring::ScoringWeights;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub ranking: RankingConfig,
    pub sessions: SessionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Upper bound on any single store read made while serving a request
    pub store_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    pub weights: ScoringWeights,
    pub default_epsilon: f64,
    pub pool_multiplier: usize,
    pub pool_floor: usize,
    pub pool_ceiling: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            default_epsilon: 0.1,
            pool_multiplier: 8,
            pool_floor: 80,
            pool_ceiling: 150,
        }
    }
}

impl RankingConfig {
    /// Candidate pool size for a requested page size
    pub fn pool_size(&self, limit: usize) -> usize {
        limit
            .saturating_mul(self.pool_multiplier)
            .max(self.pool_floor)
            .min(self.pool_ceiling)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionNamespaceConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl SessionNamespaceConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    pub recommendations: SessionNamespaceConfig,
    pub search: SessionNamespaceConfig,
    pub browse: SessionNamespaceConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            recommendations: SessionNamespaceConfig {
                ttl_secs: 3600,
                sweep_interval_secs: 300,
            },
            search: SessionNamespaceConfig {
                ttl_secs: 3600,
                sweep_interval_secs: 300,
            },
            browse: SessionNamespaceConfig {
                ttl_secs: 7200,
                sweep_interval_secs: 600,
            },
        }
    }
}

/// Read `key`, falling back to `default` when unset; a present but malformed value is an error
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        _ => Ok(default),
    }
}

/// Like `env_or`, but zero is rejected; sweeper intervals and TTLs must be positive
fn positive_secs_or(key: &str, default: u64) -> Result<u64> {
    let secs = env_or(key, default)?;
    if secs == 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(secs)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let weights_default = ScoringWeights::default();
        let ranking_default = RankingConfig::default();
        let sessions_default = SessionSettings::default();

        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: env_or("APP_PORT", 8000)?,
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", 8)?,
                min_connections: env_or("DATABASE_MIN_CONNECTIONS", 1)?,
                acquire_timeout_secs: env_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?,
                store_timeout_ms: env_or("STORE_TIMEOUT_MS", 2000)?,
            },
            ranking: RankingConfig {
                weights: ScoringWeights {
                    like_weight: env_or("RANK_LIKE_WEIGHT", weights_default.like_weight)?,
                    view_weight: env_or("RANK_VIEW_WEIGHT", weights_default.view_weight)?,
                    prior_likes: env_or("RANK_PRIOR_LIKES", weights_default.prior_likes)?,
                    prior_views: env_or("RANK_PRIOR_VIEWS", weights_default.prior_views)?,
                    half_life_days: env_or("RANK_HALF_LIFE_DAYS", weights_default.half_life_days)?,
                    subscribed_bonus: env_or(
                        "RANK_SUBSCRIBED_BONUS",
                        weights_default.subscribed_bonus,
                    )?,
                    liked_creator_bonus: env_or(
                        "RANK_LIKED_CREATOR_BONUS",
                        weights_default.liked_creator_bonus,
                    )?,
                    liked_category_bonus: env_or(
                        "RANK_LIKED_CATEGORY_BONUS",
                        weights_default.liked_category_bonus,
                    )?,
                    video_bonus: env_or("RANK_VIDEO_BONUS", weights_default.video_bonus)?,
                },
                default_epsilon: env_or("EXPLORE_EPSILON", ranking_default.default_epsilon)?,
                pool_multiplier: env_or("POOL_MULTIPLIER", ranking_default.pool_multiplier)?,
                pool_floor: env_or("POOL_FLOOR", ranking_default.pool_floor)?,
                pool_ceiling: env_or("POOL_CEILING", ranking_default.pool_ceiling)?,
            },
            sessions: SessionSettings {
                recommendations: SessionNamespaceConfig {
                    ttl_secs: positive_secs_or(
                        "RECOMMENDATION_SESSION_TTL_SECS",
                        sessions_default.recommendations.ttl_secs,
                    )?,
                    sweep_interval_secs: positive_secs_or(
                        "RECOMMENDATION_SESSION_SWEEP_SECS",
                        sessions_default.recommendations.sweep_interval_secs,
                    )?,
                },
                search: SessionNamespaceConfig {
                    ttl_secs: positive_secs_or(
                        "SEARCH_SESSION_TTL_SECS",
                        sessions_default.search.ttl_secs,
                    )?,
                    sweep_interval_secs: positive_secs_or(
                        "SEARCH_SESSION_SWEEP_SECS",
                        sessions_default.search.sweep_interval_secs,
                    )?,
                },
                browse: SessionNamespaceConfig {
                    ttl_secs: positive_secs_or(
                        "BROWSE_SESSION_TTL_SECS",
                        sessions_default.browse.ttl_secs,
                    )?,
                    sweep_interval_secs: positive_secs_or(
                        "BROWSE_SESSION_SWEEP_SECS",
                        sessions_default.browse.sweep_interval_secs,
                    )?,
                },
            },
        })
    }
}
