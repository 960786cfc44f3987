use thiserror::Error;

use crate::state::{Address, Amount, RequestId};

/// Error codes for the coordinator.
///
/// Every error is local to the call that raised it; a rejected call leaves
/// the ledger exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// The escrow debit exceeds the account's balance.
    #[error("insufficient balance for {account}: needed {needed}, available {available}")]
    InsufficientBalance {
        account: Address,
        needed: Amount,
        available: Amount,
    },
    /// The requester cannot cover the request fee; nothing was minted.
    #[error("request from {requester} is unfunded: fee {fee}, balance {balance}")]
    UnfundedRequest {
        requester: Address,
        fee: Amount,
        balance: Amount,
    },
    /// Caller is not the authority bound to the request.
    #[error("{caller} is not the designated fulfiller")]
    UnauthorizedFulfiller { caller: Address },
    /// No request with this id was ever created.
    #[error("unknown request {0}")]
    UnknownRequest(RequestId),
    /// The request has already been resolved.
    #[error("request {0} is already fulfilled")]
    AlreadyFulfilled(RequestId),
    /// The request was issued by a different consumer than the one being called back.
    #[error("request {id} belongs to {requester}, not {consumer}")]
    ConsumerMismatch {
        id: RequestId,
        requester: Address,
        consumer: Address,
    },
    /// The consumer rejected the result; the request stays pending.
    #[error("consumer callback failed: {0}")]
    CallbackFailed(#[from] CallbackError),
    /// Id derivation produced an id that is already registered.
    #[error("request id {0} already exists")]
    DuplicateRequestId(RequestId),
    /// The request counter or a nonce would overflow u64 (practically unreachable).
    #[error("request counter overflow")]
    CounterOverflow,
    /// Crediting the recipient would overflow its balance.
    #[error("balance overflow for {0}")]
    BalanceOverflow(Address),
    #[error("zero address not allowed")]
    ZeroAddressNotAllowed,
}

/// Errors a consumer raises while handling a fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    /// Result payload is not a single 32-byte word.
    #[error("malformed result payload: expected 32 bytes, got {0}")]
    MalformedPayload(usize),
    /// Decoded value does not fit the consumer's result slot.
    #[error("result value does not fit in {0}")]
    ValueOutOfRange(&'static str),
    /// The consumer has no outstanding request with this id.
    #[error("no outstanding request {0}")]
    UnexpectedRequest(RequestId),
}
