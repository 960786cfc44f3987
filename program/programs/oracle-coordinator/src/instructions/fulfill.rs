use tracing::{info, warn};

use crate::callback::ConsumerCallback;
use crate::errors::CoordinatorError;
use crate::events::{LedgerEvent, RequestFulfilled};
use crate::ledger::Ledger;
use crate::state::{Address, RequestId, RequestStatus};

/// Fulfill a pending request and deliver the result to its consumer.
///
/// Checks, in order:
/// 1. `caller` is the consumer's bound authority (`UnauthorizedFulfiller`).
/// 2. The request exists (`UnknownRequest`).
/// 3. `caller` is the authority bound to the request (`UnauthorizedFulfiller`).
/// 4. The request was issued by this consumer (`ConsumerMismatch`).
/// 5. The request is `Pending` (`AlreadyFulfilled`).
///
/// The consumer callback runs before the status transition. If it fails the
/// request stays `Pending` and can be fulfilled again later; if it succeeds
/// nothing after it can fail, so callback and transition apply together.
pub fn handler<C>(
    ledger: &mut Ledger,
    consumer: &mut C,
    id: RequestId,
    result: &[u8],
    caller: Address,
) -> Result<(), CoordinatorError>
where
    C: ConsumerCallback + ?Sized,
{
    if !consumer.authority().is(&caller) {
        warn!(request_id = %id, %caller, "Rejected fulfillment from unauthorized caller");
        return Err(CoordinatorError::UnauthorizedFulfiller { caller });
    }

    let request = ledger
        .registry
        .get(&id)
        .ok_or(CoordinatorError::UnknownRequest(id))?;

    if !request.authority.is(&caller) {
        warn!(request_id = %id, %caller, "Caller is not the authority bound to this request");
        return Err(CoordinatorError::UnauthorizedFulfiller { caller });
    }
    let consumer_address = consumer.address();
    if request.requester != consumer_address {
        return Err(CoordinatorError::ConsumerMismatch {
            id,
            requester: request.requester,
            consumer: consumer_address,
        });
    }
    if request.status != RequestStatus::Pending {
        warn!(request_id = %id, "Rejected repeated fulfillment");
        return Err(CoordinatorError::AlreadyFulfilled(id));
    }
    let requester = request.requester;

    if let Err(e) = consumer.on_fulfilled(id, result) {
        warn!(request_id = %id, error = %e, "Consumer callback failed, request stays pending");
        return Err(e.into());
    }

    let fulfilled_slot = ledger.slot();
    let request = ledger
        .registry
        .requests
        .get_mut(&id)
        .ok_or(CoordinatorError::UnknownRequest(id))?;
    request.status = RequestStatus::Fulfilled;
    request.fulfilled_slot = Some(fulfilled_slot);
    request.result = Some(result.to_vec());

    ledger.emit(LedgerEvent::RequestFulfilled(RequestFulfilled {
        id,
        requester,
        fulfilled_slot,
    }));
    ledger.advance_slot();

    info!(request_id = %id, %requester, slot = fulfilled_slot, "Request fulfilled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{decode_u64, encode_uint};
    use crate::errors::CallbackError;
    use crate::instructions::request;
    use crate::state::{FulfillerAuthority, RequestParams};

    const CONSUMER: Address = Address([0x31; 20]);
    const ORACLE: Address = Address([0x32; 20]);
    const STRANGER: Address = Address([0x33; 20]);

    /// Minimal consumer storing the last value it was handed.
    struct Recorder {
        address: Address,
        value: Option<u64>,
        calls: usize,
    }

    impl ConsumerCallback for Recorder {
        fn address(&self) -> Address {
            self.address
        }

        fn authority(&self) -> FulfillerAuthority {
            FulfillerAuthority::Oracle(ORACLE)
        }

        fn on_fulfilled(&mut self, _id: RequestId, result: &[u8]) -> Result<(), CallbackError> {
            let value = decode_u64(result)?;
            self.value = Some(value);
            self.calls += 1;
            Ok(())
        }
    }

    fn setup() -> (Ledger, Recorder, RequestId) {
        let mut ledger = Ledger::new();
        ledger.mint(CONSUMER, 100).unwrap();
        let id = request::handler(
            &mut ledger,
            CONSUMER,
            FulfillerAuthority::Oracle(ORACLE),
            RequestParams::Data {
                url: "http://example.com".into(),
                path: "x".into(),
            },
            1,
        )
        .unwrap();
        let recorder = Recorder {
            address: CONSUMER,
            value: None,
            calls: 0,
        };
        (ledger, recorder, id)
    }

    #[test]
    fn authorized_fulfillment_transitions_once() {
        let (mut ledger, mut consumer, id) = setup();
        handler(&mut ledger, &mut consumer, id, &encode_uint(7), ORACLE).unwrap();

        let request = ledger.registry().get(&id).unwrap();
        assert_eq!(request.status, RequestStatus::Fulfilled);
        assert_eq!(request.result.as_deref(), Some(encode_uint(7).as_slice()));
        assert_eq!(consumer.value, Some(7));

        let err = handler(&mut ledger, &mut consumer, id, &encode_uint(8), ORACLE).unwrap_err();
        assert_eq!(err, CoordinatorError::AlreadyFulfilled(id));
        assert_eq!(consumer.value, Some(7));
        assert_eq!(consumer.calls, 1);
    }

    #[test]
    fn stranger_cannot_fulfill() {
        let (mut ledger, mut consumer, id) = setup();
        let events_before = ledger.events().len();

        let err = handler(&mut ledger, &mut consumer, id, &encode_uint(1), STRANGER).unwrap_err();
        assert_eq!(err, CoordinatorError::UnauthorizedFulfiller { caller: STRANGER });
        assert_eq!(ledger.registry().status(&id), Some(RequestStatus::Pending));
        assert_eq!(consumer.value, None);
        assert_eq!(ledger.events().len(), events_before);
    }

    #[test]
    fn authority_check_precedes_existence_check() {
        let (mut ledger, mut consumer, _) = setup();
        let missing = RequestId([0xee; 32]);

        let err =
            handler(&mut ledger, &mut consumer, missing, &encode_uint(1), STRANGER).unwrap_err();
        assert!(matches!(err, CoordinatorError::UnauthorizedFulfiller { .. }));

        let err = handler(&mut ledger, &mut consumer, missing, &encode_uint(1), ORACLE).unwrap_err();
        assert_eq!(err, CoordinatorError::UnknownRequest(missing));
    }

    #[test]
    fn failed_callback_keeps_request_pending() {
        let (mut ledger, mut consumer, id) = setup();

        let err = handler(&mut ledger, &mut consumer, id, &[1, 2, 3], ORACLE).unwrap_err();
        assert_eq!(
            err,
            CoordinatorError::CallbackFailed(CallbackError::MalformedPayload(3))
        );
        assert_eq!(ledger.registry().status(&id), Some(RequestStatus::Pending));

        handler(&mut ledger, &mut consumer, id, &encode_uint(9), ORACLE).unwrap();
        assert_eq!(consumer.value, Some(9));
    }

    #[test]
    fn other_consumers_request_is_rejected() {
        let (mut ledger, _, id) = setup();
        let mut other = Recorder {
            address: STRANGER,
            value: None,
            calls: 0,
        };

        let err = handler(&mut ledger, &mut other, id, &encode_uint(1), ORACLE).unwrap_err();
        assert!(matches!(err, CoordinatorError::ConsumerMismatch { .. }));
        assert_eq!(other.calls, 0);
    }
}
