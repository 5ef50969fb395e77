//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache and generator wiring, and the Axum
//! server lifecycle.

use crate::application::services::{UrlService, UrlServiceSettings};
use crate::codegen::{
    CodeGenerator, CounterGenerator, GeneratorKind, HashGenerator, SnowflakeGenerator,
    SnowflakeSettings,
};
use crate::config::Config;
use crate::infrastructure::cache::{NullCache, RedisCache, RemoteCache, connect_manager};
use crate::infrastructure::counter::RedisCounter;
use crate::infrastructure::persistence::PgUrlRepository;
use crate::routes::app_router;
use crate::state::AppState;
use crate::telemetry::{MetricsRecorder, PrometheusMetrics};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Opens the PostgreSQL pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Connects to Redis if configured.
///
/// An unreachable Redis degrades to no remote cache, unless the counter
/// generator needs it.
async fn connect_redis(config: &Config) -> Result<Option<ConnectionManager>> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Remote cache disabled (NullCache)");
        return Ok(None);
    };

    match connect_manager(redis_url).await {
        Ok(manager) => {
            tracing::info!("Remote cache enabled (Redis)");
            Ok(Some(manager))
        }
        Err(e) if config.code_generator == GeneratorKind::Counter => {
            Err(e).context("Redis is required by the counter code generator")
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Ok(None)
        }
    }
}

fn build_generator(
    config: &Config,
    redis: Option<&ConnectionManager>,
) -> Result<Arc<dyn CodeGenerator>> {
    let generator: Arc<dyn CodeGenerator> = match config.code_generator {
        GeneratorKind::Counter => {
            let manager = redis
                .cloned()
                .context("Counter code generator requires Redis")?;
            Arc::new(CounterGenerator::new(RedisCounter::new(
                manager,
                config.cache_timeout(),
            )))
        }
        GeneratorKind::Hash => Arc::new(HashGenerator::new(config.hash_bytes)?),
        GeneratorKind::Snowflake => Arc::new(SnowflakeGenerator::new(SnowflakeSettings {
            node_id: config.snowflake_node_id,
            epoch_ms: config.snowflake_epoch_ms,
        })?),
    };

    tracing::info!("Code generator: {}", config.code_generator.as_str());
    Ok(generator)
}

/// Wires the URL service from configuration.
///
/// Shared by the HTTP server and the admin CLI.
///
/// # Errors
///
/// Returns an error if Redis is required but unreachable, or the generator
/// settings are invalid.
pub async fn build_url_service(
    config: &Config,
    pool: Arc<PgPool>,
    metrics: Arc<dyn MetricsRecorder>,
) -> Result<UrlService> {
    let redis = connect_redis(config).await?;

    let generator = build_generator(config, redis.as_ref())?;

    let remote: Arc<dyn RemoteCache> = match redis {
        Some(manager) => Arc::new(RedisCache::from_manager(
            manager,
            config.cache_ttl(),
            config.cache_timeout(),
        )),
        None => Arc::new(NullCache::new()),
    };

    let repository = Arc::new(PgUrlRepository::new(pool));

    Ok(UrlService::new(
        repository,
        generator,
        remote,
        metrics,
        UrlServiceSettings {
            local_capacity: config.l1_cache_capacity,
            base_url: config.base_url(),
        },
    ))
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Redis remote cache (or NullCache fallback)
/// - Code generator
/// - Axum HTTP server with graceful shutdown
///
/// The schema is expected to exist; migrations are not applied here.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection fails
/// - Redis is required but unreachable
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;

    let metrics = PrometheusMetrics::arc();
    let url_service = build_url_service(&config, Arc::new(pool.clone()), metrics.clone()).await?;

    let state = AppState::new(Arc::new(url_service), metrics);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
