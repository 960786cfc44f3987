//! Oracle node
//!
//! Runs an in-process coordinator ledger with demo consumers and fulfills the
//! requests addressed to this node. Three concurrent subsystems:
//!
//! - **Listener**: startup catch-up scan + polling of the ledger event log.
//! - **Fulfiller**: consumes request jobs and submits fulfillments.
//! - **HTTP server**: probes, metrics, request lookups and demo endpoints
//!   for issuing requests.

use actix_web::{web, App, HttpResponse, HttpServer};
use oracle_coordinator::{CoordinatorError, RequestId};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod data_source;
mod devnet;
mod fulfiller;
mod listener;
mod metrics;
mod vrf;

use config::AppConfig;
use data_source::DataSource;
use devnet::{Devnet, SharedDevnet};
use metrics::Metrics;

/// Shared application state accessible from HTTP handlers.
struct AppState {
    devnet: SharedDevnet,
    /// Number of fulfillments currently in-flight.
    pending_count: Arc<AtomicU64>,
    metrics: Arc<Metrics>,
}

#[derive(Deserialize)]
struct RandomRequestBody {
    /// Hex-encoded 32-byte seed.
    seed: String,
}

/// Liveness probe: returns 200 if the process is running.
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Readiness / status probe: reports in-flight fulfillments and ledger height.
async fn status(data: web::Data<AppState>) -> HttpResponse {
    let pending = data.pending_count.load(Ordering::Relaxed);
    let devnet = data.devnet.lock().await;
    HttpResponse::Ok().json(serde_json::json!({
        "status": "running",
        "pending_fulfillments": pending,
        "slot": devnet.ledger.slot(),
        "requests_total": devnet.ledger.registry().request_counter(),
        "requests_pending": devnet.ledger.registry().pending().len(),
    }))
}

async fn get_metrics(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.metrics.to_json())
}

async fn get_request(data: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let Ok(id) = path.parse::<RequestId>() else {
        return HttpResponse::BadRequest().json(serde_json::json!({"error": "invalid request id"}));
    };
    let devnet = data.devnet.lock().await;
    match devnet.ledger.registry().get(&id) {
        Some(request) => HttpResponse::Ok().json(serde_json::json!({
            "id": request.id,
            "requester": request.requester,
            "authority": request.authority,
            "params": request.params,
            "status": request.status,
            "fee_paid": request.fee_paid.to_string(),
            "request_slot": request.request_slot,
            "fulfilled_slot": request.fulfilled_slot,
            "result": request.result.as_ref().map(hex::encode),
        })),
        None => HttpResponse::NotFound().json(serde_json::json!({"error": "unknown request"})),
    }
}

async fn consumers(data: web::Data<AppState>) -> HttpResponse {
    use oracle_coordinator::ConsumerCallback;

    let devnet = data.devnet.lock().await;
    let rainfall = &devnet.rainfall;
    let random = &devnet.random;
    HttpResponse::Ok().json(serde_json::json!({
        "rainfall": {
            "address": rainfall.address(),
            "balance": devnet.ledger.balance_of(&rainfall.address()).to_string(),
            "rainfall": rainfall.rainfall(),
            "outstanding": rainfall.outstanding().len(),
        },
        "random": {
            "address": random.address(),
            "balance": devnet.ledger.balance_of(&random.address()).to_string(),
            "random_result": hex::encode(random.random_result()),
            "outstanding": random.outstanding().len(),
        },
    }))
}

fn request_error_response(error: CoordinatorError) -> HttpResponse {
    warn!(error = %error, "Request rejected");
    let body = serde_json::json!({"error": error.to_string()});
    match error {
        CoordinatorError::UnfundedRequest { .. } => HttpResponse::PaymentRequired().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

async fn request_rainfall(data: web::Data<AppState>) -> HttpResponse {
    let result = data.devnet.lock().await.request_rainfall();
    match result {
        Ok(id) => HttpResponse::Ok().json(serde_json::json!({"request_id": id})),
        Err(e) => request_error_response(e),
    }
}

async fn request_random(
    data: web::Data<AppState>,
    body: web::Json<RandomRequestBody>,
) -> HttpResponse {
    let seed = body.seed.trim_start_matches("0x");
    let Some(seed) = hex::decode(seed)
        .ok()
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
    else {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({"error": "seed must be 32 hex-encoded bytes"}));
    };

    let result = data.devnet.lock().await.request_randomness(seed);
    match result {
        Ok(id) => HttpResponse::Ok().json(serde_json::json!({"request_id": id})),
        Err(e) => request_error_response(e),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    let config = AppConfig::from_env()?;

    info!(
        oracle = %config.oracle_address,
        vrf_coordinator = %config.vrf_coordinator_address,
        "Starting oracle node"
    );

    let devnet = Devnet::bootstrap(&config)?.shared();
    let data_source = Arc::new(match config.fixed_data_result {
        Some(value) => {
            info!(value, "Answering data requests with a fixed value");
            DataSource::Fixed(value)
        }
        None => DataSource::http(config.http_timeout)?,
    });

    let metrics = Arc::new(Metrics::new());
    let pending_count = Arc::new(AtomicU64::new(0));
    let (tx, rx) = mpsc::channel(256);

    // Queue anything that was already pending before the listener starts.
    let identities = config.identities();
    let cursor =
        listener::catch_up_pending_requests(&devnet, &identities, &tx, &metrics).await;

    // Background: poll the event log and forward jobs to the fulfiller.
    tokio::spawn(listener::listen_for_events(
        devnet.clone(),
        identities,
        cursor,
        config.poll_interval,
        tx,
        metrics.clone(),
    ));

    // Background: consume jobs and submit fulfillments.
    tokio::spawn(fulfiller::run_fulfiller(
        config.clone(),
        devnet.clone(),
        data_source,
        rx,
        pending_count.clone(),
        metrics.clone(),
    ));

    let state = web::Data::new(AppState {
        devnet,
        pending_count,
        metrics,
    });

    let addr = ("0.0.0.0", config.http_port);
    info!(port = config.http_port, "Starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(health))
            .route("/status", web::get().to(status))
            .route("/metrics", web::get().to(get_metrics))
            .route("/requests/{id}", web::get().to(get_request))
            .route("/consumers", web::get().to(consumers))
            .route("/consumers/rainfall/request", web::post().to(request_rainfall))
            .route("/consumers/random/request", web::post().to(request_random))
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
