use tracing::{info, warn};

use crate::derivation;
use crate::errors::CoordinatorError;
use crate::escrow;
use crate::events::{LedgerEvent, RequestCreated};
use crate::ledger::Ledger;
use crate::state::{
    Address, Amount, FulfillerAuthority, OracleRequest, RequestId, RequestParams, RequestStatus,
};

/// Create a new request.
///
/// 1. Checks the requester can cover `fee` (`UnfundedRequest` otherwise).
/// 2. Derives a fresh correlation id from the requester's nonce (and, for
///    randomness, the registry entropy).
/// 3. Moves `fee` from the requester to the authority.
/// 4. Records the request as `Pending`, bumps the nonce, counter and entropy.
/// 5. Emits [`RequestCreated`].
///
/// Every fallible step runs before the first write.
pub fn handler(
    ledger: &mut Ledger,
    requester: Address,
    authority: FulfillerAuthority,
    params: RequestParams,
    fee: Amount,
) -> Result<RequestId, CoordinatorError> {
    if requester.is_zero() || authority.address().is_zero() {
        return Err(CoordinatorError::ZeroAddressNotAllowed);
    }

    let balance = ledger.balance_of(&requester);
    if !escrow::can_cover(ledger, &requester, fee) {
        warn!(%requester, fee, balance, "Rejected unfunded request");
        return Err(CoordinatorError::UnfundedRequest {
            requester,
            fee,
            balance,
        });
    }

    let registry = &ledger.registry;
    let nonce = registry.nonce_of(&requester);
    let next_nonce = nonce
        .checked_add(1)
        .ok_or(CoordinatorError::CounterOverflow)?;
    let next_counter = registry
        .request_counter
        .checked_add(1)
        .ok_or(CoordinatorError::CounterOverflow)?;

    let (id, vrf_seed) = match &params {
        RequestParams::Data { .. } => (derivation::data_request_id(&requester, nonce), None),
        RequestParams::Randomness {
            key_hash,
            user_seed,
        } => {
            let seed =
                derivation::vrf_seed(key_hash, user_seed, &requester, nonce, &registry.entropy);
            (derivation::randomness_request_id(key_hash, &seed), Some(seed))
        }
    };

    if registry.contains(&id) {
        return Err(CoordinatorError::DuplicateRequestId(id));
    }

    escrow::debit(ledger, requester, authority.address(), fee).map_err(|e| match e {
        CoordinatorError::InsufficientBalance { available, .. } => {
            CoordinatorError::UnfundedRequest {
                requester,
                fee,
                balance: available,
            }
        }
        other => other,
    })?;

    let request_slot = ledger.slot();
    let registry = &mut ledger.registry;
    registry.requests.insert(
        id,
        OracleRequest {
            id,
            requester,
            authority,
            params: params.clone(),
            vrf_seed,
            fee_paid: fee,
            status: RequestStatus::Pending,
            request_slot,
            fulfilled_slot: None,
            result: None,
        },
    );
    registry.nonces.insert(requester, next_nonce);
    registry.request_counter = next_counter;
    registry.entropy = derivation::next_entropy(&registry.entropy, &id, request_slot);

    ledger.emit(LedgerEvent::RequestCreated(RequestCreated {
        id,
        requester,
        authority,
        params,
        vrf_seed,
        fee,
        request_slot,
    }));
    ledger.advance_slot();

    info!(
        request_id = %id,
        %requester,
        authority = %authority.address(),
        fee,
        slot = request_slot,
        "Request created"
    );
    Ok(id)
}
