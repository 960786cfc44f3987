//! Event listener for the coordinator ledger.
//!
//! Two complementary strategies ensure no requests are missed:
//!
//! 1. **Catch-up scan** ([`catch_up_pending_requests`]): on startup, walks
//!    the registry for `Pending` requests bound to this node's identities.
//!
//! 2. **Live poll** ([`listen_for_events`]): polls the append-only event log
//!    from the cursor returned by the scan and forwards every new
//!    `RequestCreated` addressed to this node.

use std::sync::Arc;
use std::time::Duration;

use oracle_coordinator::{
    Address, FulfillerAuthority, LedgerEvent, OracleRequest, RequestCreated, RequestId,
    RequestParams,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::devnet::SharedDevnet;
use crate::metrics::Metrics;

/// Work item handed from the listener to the fulfiller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentJob {
    pub request_id: RequestId,
    pub requester: Address,
    pub authority: FulfillerAuthority,
    pub params: RequestParams,
    pub vrf_seed: Option<[u8; 32]>,
    pub request_slot: u64,
}

impl From<&RequestCreated> for FulfillmentJob {
    fn from(event: &RequestCreated) -> Self {
        Self {
            request_id: event.id,
            requester: event.requester,
            authority: event.authority,
            params: event.params.clone(),
            vrf_seed: event.vrf_seed,
            request_slot: event.request_slot,
        }
    }
}

impl From<&OracleRequest> for FulfillmentJob {
    fn from(request: &OracleRequest) -> Self {
        Self {
            request_id: request.id,
            requester: request.requester,
            authority: request.authority,
            params: request.params.clone(),
            vrf_seed: request.vrf_seed,
            request_slot: request.request_slot,
        }
    }
}

/// Queue every pending request bound to one of `identities`.
///
/// Returns the event-log cursor at the moment of the scan; anything created
/// afterwards is picked up by [`listen_for_events`]. The scan and the cursor
/// are read under the same lock, so nothing falls between them.
pub async fn catch_up_pending_requests(
    devnet: &SharedDevnet,
    identities: &[Address],
    tx: &mpsc::Sender<FulfillmentJob>,
    metrics: &Metrics,
) -> u64 {
    info!("Scanning for pending requests");

    let (jobs, cursor) = {
        let devnet = devnet.lock().await;
        let jobs: Vec<FulfillmentJob> = devnet
            .ledger
            .registry()
            .pending()
            .into_iter()
            .filter(|r| identities.contains(&r.authority.address()))
            .map(FulfillmentJob::from)
            .collect();
        (jobs, devnet.ledger.events().head())
    };

    info!(count = jobs.len(), cursor, "Found pending requests");
    for job in jobs {
        info!(
            request_id = %job.request_id,
            requester = %job.requester,
            slot = job.request_slot,
            "Queued pending request"
        );
        metrics.record_request();
        if tx.send(job).await.is_err() {
            error!("Channel closed while catching up pending requests");
            break;
        }
    }
    cursor
}

/// Poll the event log from `cursor` and forward `RequestCreated` events
/// addressed to one of `identities`. Runs until the channel closes.
pub async fn listen_for_events(
    devnet: SharedDevnet,
    identities: Vec<Address>,
    mut cursor: u64,
    poll_interval: Duration,
    tx: mpsc::Sender<FulfillmentJob>,
    metrics: Arc<Metrics>,
) {
    info!(cursor, interval = ?poll_interval, "Listening for request events");

    loop {
        let (jobs, head) = {
            let devnet = devnet.lock().await;
            let records = devnet.ledger.events().since(cursor);
            let jobs = collect_jobs(records.iter().map(|r| &r.event), &identities);
            (jobs, devnet.ledger.events().head())
        };
        cursor = head;

        for job in jobs {
            info!(
                request_id = %job.request_id,
                requester = %job.requester,
                slot = job.request_slot,
                "Received RequestCreated event"
            );
            metrics.record_request();
            if tx.send(job).await.is_err() {
                error!("Channel closed, stopping listener");
                return;
            }
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Pick out the request events this node is responsible for.
fn collect_jobs<'a>(
    events: impl Iterator<Item = &'a LedgerEvent>,
    identities: &[Address],
) -> Vec<FulfillmentJob> {
    events
        .filter_map(|event| match event {
            LedgerEvent::RequestCreated(created) => Some(created),
            _ => None,
        })
        .filter(|created| {
            let ours = identities.contains(&created.authority.address());
            if !ours {
                debug!(request_id = %created.id, "Ignoring request for another authority");
            }
            ours
        })
        .map(FulfillmentJob::from)
        .collect()
}
