//! API server entry point.

use common::Money;
use fulfillment::CatalogEntry;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::config::Config;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Products available to a freshly started server.
fn starter_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("p1", "Widget", Money::from_dollars(20), 100),
        CatalogEntry::new("p2", "Gadget", Money::from_dollars(7), 50),
        CatalogEntry::new("p3", "Gizmo", Money::from_cents(1250), 10),
    ]
}

fn describe_metrics() {
    metrics::describe_counter!("orders_placed_total", "Orders persisted by the place-order workflow");
    metrics::describe_counter!("payments_recorded_total", "Payments persisted by the record-payment workflow");
    metrics::describe_counter!("idempotency_hits_total", "Requests answered from the idempotency store");
    metrics::describe_counter!("single_flight_joined_total", "Requests that waited on an in-flight duplicate");
    metrics::describe_counter!("stock_adjustment_rejected_total", "Decrements rejected for insufficient stock");
    metrics::describe_histogram!("workflow_duration_seconds", metrics::Unit::Seconds, "Workflow latency");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");
    describe_metrics();

    // 3. Wire the workflows
    let state = api::create_default_state(config.workflow(), starter_catalog());
    let app = api::create_app(state, metrics_handle);

    // 4. Start server
    let addr = config.addr();
    tracing::info!(%addr, single_flight = config.single_flight, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
