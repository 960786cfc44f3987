use serde::Serialize;

use crate::state::{Address, Amount, FulfillerAuthority, RequestId, RequestParams};

/// Emitted when a new request is created.
///
/// The off-chain fulfiller watches the event log for these records. Nothing
/// in the coordinator depends on the event ever being observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestCreated {
    pub id: RequestId,
    pub requester: Address,
    pub authority: FulfillerAuthority,
    pub params: RequestParams,
    pub vrf_seed: Option<[u8; 32]>,
    pub fee: Amount,
    pub request_slot: u64,
}

/// Emitted when the authority fulfills a request and the consumer accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestFulfilled {
    pub id: RequestId,
    pub requester: Address,
    pub fulfilled_slot: u64,
}

/// Emitted for every token movement, including fee escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    RequestCreated(RequestCreated),
    RequestFulfilled(RequestFulfilled),
    Transfer(Transfer),
}

/// A log entry with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub slot: u64,
    pub event: LedgerEvent,
}

/// Append-only event log. Readers keep their own cursor and poll with
/// [`EventLog::since`]; there is no acknowledgment and no removal.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&mut self, slot: u64, event: LedgerEvent) {
        let sequence = self.records.len() as u64;
        self.records.push(EventRecord {
            sequence,
            slot,
            event,
        });
    }

    /// Records with `sequence >= cursor`.
    pub fn since(&self, cursor: u64) -> &[EventRecord] {
        let start = usize::try_from(cursor)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    /// Cursor positioned after the last record.
    pub fn head(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    pub fn requests_created(&self) -> impl Iterator<Item = &RequestCreated> {
        self.records.iter().filter_map(|r| match &r.event {
            LedgerEvent::RequestCreated(e) => Some(e),
            _ => None,
        })
    }
}
