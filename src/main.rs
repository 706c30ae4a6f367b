use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use qna_service::config::{AppConfig, StorageConfig};
use qna_service::error::AppError;
use qna_service::qna::{
    qna_router, AnswerNotifier, EmailNotifier, HostedTableRepository,
    InMemorySubmissionRepository, PostgresSubmissionRepository, QnaService,
};
use qna_service::telemetry;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Q&A Service",
    about = "Run the question-and-answer contact service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let notifier = Arc::new(EmailNotifier::from_config(config.smtp.as_ref()));
    if !notifier.is_configured() {
        info!("smtp settings absent; answer notifications disabled");
    }

    let api = build_qna_router(&config.storage, notifier).await?;

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(api)
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        storage = config.storage.label(),
        "qna service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Resolve the configured backend once and wire the workflow behind it. The
/// router that comes back is the same regardless of the adapter chosen.
async fn build_qna_router(
    storage: &StorageConfig,
    notifier: Arc<EmailNotifier>,
) -> Result<Router, AppError> {
    match storage {
        StorageConfig::Memory => {
            info!("using in-memory submission storage");
            let repository = Arc::new(InMemorySubmissionRepository::default());
            Ok(qna_router(Arc::new(QnaService::new(repository, notifier))))
        }
        StorageConfig::Postgres { database_url } => {
            info!("using postgres submission storage");
            let repository = Arc::new(PostgresSubmissionRepository::connect(database_url).await?);
            Ok(qna_router(Arc::new(QnaService::new(repository, notifier))))
        }
        StorageConfig::Hosted { base_url, api_key } => {
            info!("using hosted table submission storage");
            let repository = Arc::new(HostedTableRepository::new(base_url, api_key)?);
            Ok(qna_router(Arc::new(QnaService::new(repository, notifier))))
        }
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
