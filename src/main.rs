use marketplace_backend::api::{self, AppState};
use marketplace_backend::bookings::{BookingRepository, BookingService, InMemoryBookingRepository};
use marketplace_backend::config::AppConfig;
use marketplace_backend::health::HealthChecker;
use marketplace_backend::logging::init_tracing;
use marketplace_backend::payments::factory::PaymentGatewayFactory;
use marketplace_backend::services::exchange_rate::RateResolver;
use marketplace_backend::services::order_metadata::{
    InMemoryOrderMetadataStore, OrderMetadataStore,
};
use marketplace_backend::services::payment_attempts::PaymentAttemptStore;
use marketplace_backend::services::payment_orchestrator::{
    OrchestratorConfig, PaymentOrchestrator,
};
use marketplace_backend::services::rate_providers::build_rate_providers;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.logging);
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        "🚀 Starting marketplace backend service"
    );

    // Payment gateways
    info!("💳 Initializing payment gateways...");
    let gateways = PaymentGatewayFactory::build(&config.gateways)?;
    info!(
        configured = ?gateways.list_configured(),
        environment = ?config.gateways.paypal.environment,
        "✅ Payment gateways initialized"
    );

    // Rate resolver
    let mut resolver = RateResolver::new(config.rates.resolver.clone());
    for provider in build_rate_providers(
        &config.rates.providers,
        config.rates.resolver.provider_timeout_secs,
    )? {
        resolver = resolver.add_provider(provider);
    }
    info!(
        providers = ?resolver.provider_names(),
        local_currency = %config.rates.local_currency,
        settlement_currency = %config.gateways.paypal.settlement_currency,
        "✅ Rate resolver initialized"
    );

    let order_metadata = init_order_metadata(&config).await?;
    info!(backend = order_metadata.backend(), "✅ Order metadata store initialized");

    let (booking_repository, db_pool) = init_booking_repository(&config).await?;

    let orchestrator = Arc::new(PaymentOrchestrator::new(
        gateways.clone(),
        Arc::new(resolver),
        order_metadata.clone(),
        Arc::new(PaymentAttemptStore::new()),
        OrchestratorConfig {
            local_currency: config.rates.local_currency.clone(),
            settlement_currency: config.gateways.paypal.settlement_currency.clone(),
        },
    ));
    let bookings = Arc::new(BookingService::new(booking_repository));

    #[allow(unused_mut)]
    let mut health_checker = HealthChecker::new(order_metadata, gateways);
    #[cfg(feature = "database")]
    if let Some(pool) = db_pool {
        health_checker = health_checker.with_database(pool);
    }
    #[cfg(not(feature = "database"))]
    let _ = db_pool;

    info!("🛣️  Setting up application routes...");
    let app = api::router(AppState::new(bookings, orchestrator, health_checker))
        .layer(api::cors_layer(&config.server.cors_allowed_origins));
    info!("✅ Routes configured");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("❌ Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

async fn init_order_metadata(config: &AppConfig) -> anyhow::Result<Arc<dyn OrderMetadataStore>> {
    #[cfg(feature = "cache")]
    if let Some(redis) = &config.redis {
        use marketplace_backend::cache::cache::RedisCache;
        use marketplace_backend::cache::{init_cache_pool, CacheConfig};
        use marketplace_backend::services::order_metadata::RedisOrderMetadataStore;

        info!("🔄 Initializing Redis cache connection pool...");
        let pool = init_cache_pool(CacheConfig::from(redis)).await?;
        return Ok(Arc::new(RedisOrderMetadataStore::new(
            RedisCache::new(pool),
            config.order_metadata.ttl,
        )));
    }

    if config.redis.is_some() && !cfg!(feature = "cache") {
        warn!("REDIS_URL is set but the cache feature is disabled, using in-memory order metadata");
    }
    Ok(Arc::new(InMemoryOrderMetadataStore::new(
        config.order_metadata.clone(),
    )))
}

#[cfg(feature = "database")]
type DbPool = Option<sqlx::PgPool>;
#[cfg(not(feature = "database"))]
type DbPool = Option<()>;

async fn init_booking_repository(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn BookingRepository>, DbPool)> {
    #[cfg(feature = "database")]
    if let Some(database) = &config.database {
        use marketplace_backend::database::booking_repository::PostgresBookingRepository;
        use marketplace_backend::database::{init_pool_from_config, run_migrations};

        info!("📊 Initializing database connection pool...");
        let pool = init_pool_from_config(database).await?;
        run_migrations(&pool).await?;
        info!(
            max_connections = database.max_connections,
            "✅ Database connection pool initialized"
        );
        return Ok((
            Arc::new(PostgresBookingRepository::new(pool.clone())),
            Some(pool),
        ));
    }

    if config.database.is_some() && !cfg!(feature = "database") {
        warn!("DATABASE_URL is set but the database feature is disabled, using in-memory bookings");
    } else {
        info!("⏭️  DATABASE_URL not set, bookings kept in memory");
    }
    Ok((Arc::new(InMemoryBookingRepository::new()), None))
}
