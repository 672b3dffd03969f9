use std::net::SocketAddr;

use lectern_access_core::{AccessService, AccessStores};
use lectern_api::config::Config;
use lectern_api::state::AppState;
use lectern_db::Repositories;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("lectern_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lectern API");

    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        demo_window_secs = config.access.demo_window.as_secs(),
        "Configuration loaded"
    );

    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    let pool = lectern_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");
    lectern_db::run_migrations(&pool).await?;
    tracing::info!("Migrations applied");

    let stores = AccessStores::from(Repositories::new(pool.clone()));
    let access = AccessService::new(config.access.clone(), stores)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let state = AppState::new(access, pool, config);
    let app = lectern_api::build_router(state, metrics_handle);

    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Entitlement checks are a handful of indexed lookups
    let access_latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 10.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("lectern_operation_duration_seconds".to_string()),
            access_latency_buckets,
        )?
        .install_recorder()?;

    metrics::describe_counter!(
        "lectern_access_decisions_total",
        "Entitlement decisions by tier and outcome"
    );
    metrics::describe_counter!(
        "lectern_demo_grants_created_total",
        "Demo windows opened by subject kind"
    );
    metrics::describe_counter!(
        "lectern_checkouts_created_total",
        "Subscription checkouts recorded by plan"
    );
    metrics::describe_histogram!(
        "lectern_operation_duration_seconds",
        "Operation latency in seconds by operation and result"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = ?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
