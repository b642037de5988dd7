//! Storefront payments server.
//!
//! Wires configuration, stores, the gateway client and the background
//! workers together and serves the axum API until Ctrl+C or SIGTERM.

use std::error::Error;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront_payments::adapters::http::{api_router, AuthState, PaymentsAppState};
use storefront_payments::adapters::{
    reconciliation_pool, HttpPaymentGateway, HttpWebhookForwarder, InMemoryIntentStore,
    IntentSweeper, JwtSessionValidator, PoolConfig, PostgresCommissionRepository,
    PostgresInventoryLedger, PostgresOrderRepository, RedisIntentStore, SystemClock,
};
use storefront_payments::application::handlers::{
    IngestSettings, LookupRetry, PrepareSettings, ReconcileTransactionHandler,
};
use storefront_payments::config::{AppConfig, ServerConfig};
use storefront_payments::ports::{Clock, IntentStore, ReconciliationQueue};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        sandbox = config.payment.is_test_mode(),
        "Starting storefront payments"
    );

    // Persistence
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let intents: Arc<dyn IntentStore> = match &config.redis.url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            let conn = tokio::time::timeout(
                config.redis.timeout(),
                client.get_multiplexed_async_connection(),
            )
            .await??;
            tracing::info!("Prepared intents stored in Redis");
            Arc::new(RedisIntentStore::new(
                conn,
                clock.clone(),
                config.redis.key_prefix.clone(),
            ))
        }
        None => {
            let store: Arc<dyn IntentStore> = Arc::new(InMemoryIntentStore::new(clock.clone()));
            let sweeper =
                IntentSweeper::new(store.clone(), clock.clone(), config.payment.sweep_interval());
            let rx = shutdown_rx.clone();
            tokio::spawn(async move { sweeper.run(rx).await });
            tracing::info!("Prepared intents stored in memory");
            store
        }
    };

    // Reconciliation
    let reconciler = Arc::new(ReconcileTransactionHandler::new(
        Arc::new(PostgresOrderRepository::new(pool.clone())),
        Arc::new(PostgresInventoryLedger::new(pool.clone())),
        Arc::new(PostgresCommissionRepository::new(pool.clone())),
        clock.clone(),
        LookupRetry {
            attempts: config.webhook.lookup_attempts,
            delay: config.webhook.lookup_delay(),
        },
    ));
    let forwarder = Arc::new(HttpWebhookForwarder::new(config.webhook.forward_timeout())?);
    let (queue, worker) = reconciliation_pool(
        reconciler,
        forwarder,
        PoolConfig {
            workers: config.webhook.workers,
            capacity: config.webhook.queue_capacity,
        },
    );
    let worker_handle = tokio::spawn(worker.run(shutdown_rx.clone()));
    let queue: Arc<dyn ReconciliationQueue> = Arc::new(queue);

    // HTTP
    let state = PaymentsAppState {
        orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
        intents,
        gateway: Arc::new(HttpPaymentGateway::from_config(&config.payment)?),
        queue,
        clock,
        checkout: PrepareSettings {
            public_key: config.payment.public_key.clone(),
            integrity_secret: config.payment.integrity_secret.clone(),
            currency: config.payment.currency()?,
            redirect_url: config.payment.redirect_url.clone(),
            tenant_prefix: config.webhook.tenant_prefix.clone(),
            intent_ttl_secs: config.payment.intent_ttl_secs(),
        },
        ingest: IngestSettings::new(
            config.payment.events_secret.clone(),
            config.webhook.max_event_age_secs,
            &config.webhook.tenant_prefix,
            config.webhook.forwarding.clone(),
        ),
    };
    let auth: AuthState = Arc::new(JwtSessionValidator::new(&config.auth));
    let app = with_layers(api_router(state, auth), &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Storefront payments listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the sweeper and let queued reconciliations finish.
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "Reconciliation worker panicked");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.server.log_level)));
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn with_layers(router: Router, server: &ServerConfig) -> Router {
    router
        .layer(cors_layer(&server.cors_origins_list()))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if origins.is_empty() {
        return CorsLayer::new();
    }
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
    tracing::info!("Shutdown signal received, stopping server...");
}
