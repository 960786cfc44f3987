//! Fulfillment engine: consumes request jobs, computes the answer and submits
//! it to the ledger as the request's bound authority.
//!
//! - Randomness requests are answered with HMAC-SHA256 output over the
//!   registry-derived seed.
//! - Data requests are answered by the configured [`DataSource`].

use anyhow::{Context, Result};
use oracle_coordinator::{encode_uint, CoordinatorError, RequestParams};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, instrument, warn};

use crate::config::AppConfig;
use crate::data_source::DataSource;
use crate::devnet::{DevnetError, SharedDevnet};
use crate::listener::FulfillmentJob;
use crate::metrics::Metrics;
use crate::vrf::compute_randomness;

/// Whether retrying can never succeed: the ledger rejected the fulfillment
/// for a reason that another attempt will not change.
fn is_non_retryable(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<DevnetError>() {
        Some(DevnetError::UnknownConsumer(_)) => true,
        Some(DevnetError::Coordinator(e)) => matches!(
            e,
            CoordinatorError::AlreadyFulfilled(_)
                | CoordinatorError::UnauthorizedFulfiller { .. }
                | CoordinatorError::UnknownRequest(_)
                | CoordinatorError::ConsumerMismatch { .. }
                | CoordinatorError::CallbackFailed(_)
        ),
        None => false,
    }
}

/// Main fulfiller loop.
pub async fn run_fulfiller(
    config: AppConfig,
    devnet: SharedDevnet,
    data_source: Arc<DataSource>,
    mut rx: mpsc::Receiver<FulfillmentJob>,
    pending_count: Arc<AtomicU64>,
    metrics: Arc<Metrics>,
) {
    let semaphore = Arc::new(Semaphore::new(config.fulfillment_concurrency));

    while let Some(job) = rx.recv().await {
        pending_count.fetch_add(1, Ordering::Relaxed);

        let permit = match semaphore.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => {
                error!("Semaphore closed, stopping fulfiller");
                break;
            }
        };
        let cfg = config.clone();
        let devnet = devnet.clone();
        let source = data_source.clone();
        let pending = pending_count.clone();
        let met = metrics.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let start = Instant::now();

            info!(
                request_id = %job.request_id,
                requester = %job.requester,
                authority = %job.authority.address(),
                slot = job.request_slot,
                "Fulfilling request"
            );

            match fulfill_with_retries(&devnet, &cfg, &source, &job).await {
                Ok(()) => {
                    let latency_ms = start.elapsed().as_millis() as u64;
                    met.record_fulfillment(latency_ms);
                    info!(
                        request_id = %job.request_id,
                        latency_ms,
                        "Fulfilled successfully"
                    );
                }
                Err(e) => handle_fulfillment_error(&job, e, &met),
            }

            pending.fetch_sub(1, Ordering::Relaxed);
        });
    }

    info!("Fulfiller channel closed, shutting down");
}

fn handle_fulfillment_error(job: &FulfillmentJob, error: anyhow::Error, metrics: &Metrics) {
    let err_str = format!("{error:#}");
    if is_non_retryable(&error) {
        metrics.record_rejection();
        warn!(
            request_id = %job.request_id,
            reason = %err_str,
            "Skipping request (non-retryable)"
        );
    } else {
        metrics.record_failure();
        error!(
            request_id = %job.request_id,
            error = %err_str,
            "Failed to fulfill"
        );
    }
}

/// Compute the result payload the consumer expects for this job.
async fn compute_result(
    config: &AppConfig,
    data_source: &DataSource,
    job: &FulfillmentJob,
) -> Result<Vec<u8>> {
    match &job.params {
        RequestParams::Randomness { .. } => {
            let seed = job
                .vrf_seed
                .context("randomness request carries no derived seed")?;
            let randomness =
                compute_randomness(&config.hmac_secret, &seed, job.request_slot, &job.request_id);
            Ok(randomness.to_vec())
        }
        RequestParams::Data { url, path } => {
            let value = data_source.fetch(url, path).await?;
            info!(request_id = %job.request_id, %url, %path, value, "Fetched data");
            Ok(encode_uint(u128::from(value)))
        }
    }
}

/// Compute and submit one fulfillment.
#[instrument(skip_all, fields(request_id = %job.request_id))]
async fn fulfill_once(
    devnet: &SharedDevnet,
    config: &AppConfig,
    data_source: &DataSource,
    job: &FulfillmentJob,
) -> Result<()> {
    let result = compute_result(config, data_source, job).await?;

    let mut devnet = devnet.lock().await;
    devnet
        .fulfill(job.requester, job.request_id, &result, job.authority.address())
        .context("fulfill transaction rejected")?;
    Ok(())
}

/// Fulfill with exponential backoff on retryable errors.
async fn fulfill_with_retries(
    devnet: &SharedDevnet,
    config: &AppConfig,
    data_source: &DataSource,
    job: &FulfillmentJob,
) -> Result<()> {
    let mut retry_delay = Duration::from_millis(config.initial_retry_delay_ms);

    for attempt in 0..config.max_retries {
        match fulfill_once(devnet, config, data_source, job).await {
            Ok(()) => return Ok(()),
            Err(e) if is_non_retryable(&e) => return Err(e),
            Err(e) if attempt + 1 < config.max_retries => {
                warn!(
                    request_id = %job.request_id,
                    attempt = attempt + 1,
                    delay = ?retry_delay,
                    error = %format!("{e:#}"),
                    "Fulfillment failed, retrying"
                );
                tokio::time::sleep(retry_delay).await;
                retry_delay = retry_delay.saturating_mul(2).min(Duration::from_secs(60));
            }
            Err(e) => return Err(e),
        }
    }

    anyhow::bail!(
        "max retries ({}) exceeded for request_id={}",
        config.max_retries,
        job.request_id
    )
}
