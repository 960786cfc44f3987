//! Paid request/fulfillment coordinator.
//!
//! A consumer pays a fee to issue a request; an off-chain oracle or
//! randomness provider watches the event log for [`RequestCreated`], computes
//! the answer, and submits exactly one fulfillment that the coordinator
//! routes back into the consumer.
//!
//! ## Request lifecycle
//!
//! 1. **Request**: the consumer calls [`create_request`]; the fee moves to
//!    the authority, a request is stored with status `Pending`, and
//!    [`RequestCreated`] is emitted.
//! 2. **Fulfill**: the bound authority calls [`fulfill`]; the consumer's
//!    callback stores the result and the status becomes `Fulfilled`.
//!
//! A request with no fulfillment stays `Pending` forever: there is no
//! expiry, cancellation or refund.

pub mod callback;
pub mod derivation;
pub mod errors;
pub mod escrow;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod state;
pub mod token;

pub use callback::{decode_u64, decode_word, encode_uint, ConsumerCallback};
pub use errors::{CallbackError, CoordinatorError};
pub use events::{EventLog, EventRecord, LedgerEvent, RequestCreated, RequestFulfilled, Transfer};
pub use ledger::Ledger;
pub use state::{
    Address, Amount, FulfillerAuthority, OracleRequest, RequestId, RequestParams, RequestStatus,
    TOKEN,
};

/// Submit a new request, charging `fee` to the requester.
///
/// Fails with `UnfundedRequest` and leaves the ledger untouched when the
/// requester cannot cover the fee.
pub fn create_request(
    ledger: &mut Ledger,
    requester: Address,
    authority: FulfillerAuthority,
    params: RequestParams,
    fee: Amount,
) -> Result<RequestId, CoordinatorError> {
    instructions::request::handler(ledger, requester, authority, params, fee)
}

/// Fulfill a pending request with a result payload.
///
/// Only the consumer's bound authority may call this, only once per request.
pub fn fulfill<C>(
    ledger: &mut Ledger,
    consumer: &mut C,
    id: RequestId,
    result: &[u8],
    caller: Address,
) -> Result<(), CoordinatorError>
where
    C: ConsumerCallback + ?Sized,
{
    instructions::fulfill::handler(ledger, consumer, id, result, caller)
}
