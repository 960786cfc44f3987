use oracle_consumers::{ApiConsumer, RandomNumberConsumer, API_FEE, RAINFALL_PATH, RAINFALL_URL};
use oracle_coordinator::{
    create_request, encode_uint, fulfill, Address, CallbackError, CoordinatorError,
    FulfillerAuthority, Ledger, LedgerEvent, RequestParams, RequestStatus, TOKEN,
};

const ORACLE: Address = Address([
    0x3a, 0xa5, 0xeb, 0xb1, 0x0d, 0xc7, 0x97, 0xca, 0xc8, 0x28, 0x52, 0x4e, 0x59, 0xa3, 0x33, 0xd0,
    0xa3, 0x71, 0x44, 0x3c,
]);
const VRF_COORDINATOR: Address = Address([
    0xf0, 0xd5, 0x43, 0x49, 0xad, 0xdc, 0xf7, 0x04, 0xf7, 0x7a, 0xe1, 0x5b, 0x96, 0x51, 0x0d, 0xea,
    0x15, 0xcb, 0x79, 0x52,
]);
const API_CONSUMER: Address = Address([0xa1; 20]);
const RANDOM_CONSUMER: Address = Address([0xa2; 20]);
const STRANGER: Address = Address([0xbe; 20]);

fn funded_api_consumer(ledger: &mut Ledger) -> ApiConsumer {
    ledger.mint(API_CONSUMER, 10 * TOKEN).unwrap();
    ApiConsumer::new(API_CONSUMER, ORACLE)
}

#[test]
fn unfunded_consumer_cannot_request() {
    let mut ledger = Ledger::new();
    let mut consumer = ApiConsumer::new(API_CONSUMER, ORACLE);

    let err = consumer.request_rainfall(&mut ledger).unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::UnfundedRequest { fee, balance: 0, .. } if fee == API_FEE
    ));
    assert!(ledger.events().is_empty());
    assert!(consumer.outstanding().is_empty());
}

#[test]
fn funded_request_pays_oracle_and_emits_event() {
    let mut ledger = Ledger::new();
    let mut consumer = funded_api_consumer(&mut ledger);
    let cursor = ledger.events().head();

    let id = consumer.request_rainfall(&mut ledger).unwrap();

    assert_eq!(ledger.balance_of(&API_CONSUMER), 10 * TOKEN - TOKEN / 10);
    assert_eq!(ledger.balance_of(&ORACLE), TOKEN / 10);
    assert_eq!(ledger.registry().status(&id), Some(RequestStatus::Pending));

    let created: Vec<_> = ledger
        .events()
        .since(cursor)
        .iter()
        .filter_map(|r| match &r.event {
            LedgerEvent::RequestCreated(e) => Some(e.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id, id);
    assert_eq!(created[0].requester, API_CONSUMER);
    assert_eq!(
        created[0].params,
        RequestParams::Data {
            url: RAINFALL_URL.into(),
            path: RAINFALL_PATH.into(),
        }
    );
}

#[test]
fn oracle_fulfills_rainfall_exactly_once() {
    let mut ledger = Ledger::new();
    let mut consumer = funded_api_consumer(&mut ledger);
    let id = consumer.request_rainfall(&mut ledger).unwrap();

    fulfill(&mut ledger, &mut consumer, id, &encode_uint(45720), ORACLE).unwrap();
    assert_eq!(ledger.registry().status(&id), Some(RequestStatus::Fulfilled));
    assert_eq!(consumer.rainfall(), 45720);
    assert!(consumer.outstanding().is_empty());

    let err = fulfill(&mut ledger, &mut consumer, id, &encode_uint(99999), ORACLE).unwrap_err();
    assert_eq!(err, CoordinatorError::AlreadyFulfilled(id));
    assert_eq!(consumer.rainfall(), 45720);
}

#[test]
fn stranger_is_rejected_before_oracle_answers() {
    let mut ledger = Ledger::new();
    let mut consumer = funded_api_consumer(&mut ledger);
    let id = consumer.request_rainfall(&mut ledger).unwrap();

    let err = fulfill(&mut ledger, &mut consumer, id, &encode_uint(1), STRANGER).unwrap_err();
    assert_eq!(err, CoordinatorError::UnauthorizedFulfiller { caller: STRANGER });
    assert_eq!(ledger.registry().status(&id), Some(RequestStatus::Pending));
    assert_eq!(consumer.rainfall(), 0);

    fulfill(&mut ledger, &mut consumer, id, &encode_uint(45720), ORACLE).unwrap();
    assert_eq!(consumer.rainfall(), 45720);
}

#[test]
fn unanswered_request_stays_pending() {
    let mut ledger = Ledger::new();
    let mut consumer = funded_api_consumer(&mut ledger);
    let first = consumer.request_rainfall(&mut ledger).unwrap();
    let second = consumer.request_rainfall(&mut ledger).unwrap();

    fulfill(&mut ledger, &mut consumer, second, &encode_uint(12), ORACLE).unwrap();

    assert_eq!(ledger.registry().status(&first), Some(RequestStatus::Pending));
    assert_eq!(ledger.registry().pending().len(), 1);
    assert!(consumer.outstanding().contains(&first));
}

#[test]
fn randomness_round_trip() {
    let mut ledger = Ledger::new();
    ledger.mint(RANDOM_CONSUMER, 10 * TOKEN).unwrap();
    let mut consumer = RandomNumberConsumer::new(RANDOM_CONSUMER, VRF_COORDINATOR);

    let id = consumer.get_random_number(&mut ledger, [7u8; 32]).unwrap();
    assert_eq!(ledger.balance_of(&VRF_COORDINATOR), 2 * TOKEN);

    let created = ledger.events().requests_created().last().unwrap().clone();
    assert_eq!(created.id, id);
    assert!(created.vrf_seed.is_some());

    let randomness = [0x42u8; 32];
    fulfill(&mut ledger, &mut consumer, id, &randomness, VRF_COORDINATOR).unwrap();
    assert_eq!(consumer.random_result(), &randomness);

    let err = fulfill(&mut ledger, &mut consumer, id, &[0u8; 32], ORACLE).unwrap_err();
    assert!(matches!(err, CoordinatorError::UnauthorizedFulfiller { .. }));
    assert_eq!(consumer.random_result(), &randomness);
}

#[test]
fn identical_seeds_from_different_requesters_diverge() {
    let mut ledger = Ledger::new();
    let other = Address([0xa3; 20]);
    ledger.mint(RANDOM_CONSUMER, 10 * TOKEN).unwrap();
    ledger.mint(other, 10 * TOKEN).unwrap();
    let mut a = RandomNumberConsumer::new(RANDOM_CONSUMER, VRF_COORDINATOR);
    let mut b = RandomNumberConsumer::new(other, VRF_COORDINATOR);

    let id_a = a.get_random_number(&mut ledger, [1u8; 32]).unwrap();
    let id_b = b.get_random_number(&mut ledger, [1u8; 32]).unwrap();
    assert_ne!(id_a, id_b);

    let seed_a = ledger.registry().get(&id_a).unwrap().vrf_seed;
    let seed_b = ledger.registry().get(&id_b).unwrap().vrf_seed;
    assert_ne!(seed_a, seed_b);
}

#[test]
fn wrong_consumer_type_cannot_take_delivery() {
    let mut ledger = Ledger::new();
    let mut api = funded_api_consumer(&mut ledger);
    let id = api.request_rainfall(&mut ledger).unwrap();

    let mut random = RandomNumberConsumer::new(RANDOM_CONSUMER, ORACLE);
    let err = fulfill(&mut ledger, &mut random, id, &encode_uint(5), ORACLE).unwrap_err();
    assert!(matches!(err, CoordinatorError::ConsumerMismatch { .. }));
    assert_eq!(ledger.registry().status(&id), Some(RequestStatus::Pending));
}

#[test]
fn another_consumers_oracle_cannot_answer() {
    let mut ledger = Ledger::new();
    let other_consumer = Address([0xb1; 20]);
    let other_oracle = Address([0xb2; 20]);
    let mut a = funded_api_consumer(&mut ledger);
    ledger.mint(other_consumer, 10 * TOKEN).unwrap();
    let mut b = ApiConsumer::new(other_consumer, other_oracle);

    let id_b = b.request_rainfall(&mut ledger).unwrap();

    let err = fulfill(&mut ledger, &mut a, id_b, &encode_uint(1), ORACLE).unwrap_err();
    assert_eq!(err, CoordinatorError::UnauthorizedFulfiller { caller: ORACLE });
    assert_eq!(ledger.registry().status(&id_b), Some(RequestStatus::Pending));
    assert_eq!(a.rainfall(), 0);
    assert_eq!(b.rainfall(), 0);

    fulfill(&mut ledger, &mut b, id_b, &encode_uint(45720), other_oracle).unwrap();
    assert_eq!(b.rainfall(), 45720);
}

#[test]
fn undecodable_result_leaves_no_trace() {
    let mut ledger = Ledger::new();
    let mut consumer = funded_api_consumer(&mut ledger);
    let id = consumer.request_rainfall(&mut ledger).unwrap();
    let events_before = ledger.events().len();

    let mut too_large = [0u8; 32];
    too_large[0] = 1;
    let err = fulfill(&mut ledger, &mut consumer, id, &too_large, ORACLE).unwrap_err();
    assert_eq!(
        err,
        CoordinatorError::CallbackFailed(CallbackError::ValueOutOfRange("u64"))
    );

    let err = fulfill(&mut ledger, &mut consumer, id, &[0x01, 0x02], ORACLE).unwrap_err();
    assert_eq!(
        err,
        CoordinatorError::CallbackFailed(CallbackError::MalformedPayload(2))
    );

    let request = ledger.registry().get(&id).unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.fulfilled_slot, None);
    assert_eq!(request.result, None);
    assert_eq!(consumer.rainfall(), 0);
    assert!(consumer.outstanding().contains(&id));
    assert_eq!(ledger.events().len(), events_before);

    fulfill(&mut ledger, &mut consumer, id, &encode_uint(45720), ORACLE).unwrap();
    assert_eq!(ledger.registry().status(&id), Some(RequestStatus::Fulfilled));
    assert_eq!(consumer.rainfall(), 45720);
}

#[test]
fn randomness_consumer_rejects_short_word() {
    let mut ledger = Ledger::new();
    ledger.mint(RANDOM_CONSUMER, 10 * TOKEN).unwrap();
    let mut consumer = RandomNumberConsumer::new(RANDOM_CONSUMER, VRF_COORDINATOR);
    let id = consumer.get_random_number(&mut ledger, [9u8; 32]).unwrap();

    let err = fulfill(&mut ledger, &mut consumer, id, &[0x42; 31], VRF_COORDINATOR).unwrap_err();
    assert_eq!(
        err,
        CoordinatorError::CallbackFailed(CallbackError::MalformedPayload(31))
    );
    assert_eq!(ledger.registry().status(&id), Some(RequestStatus::Pending));
    assert_eq!(consumer.random_result(), &[0u8; 32]);
}

#[test]
fn request_not_issued_by_consumer_is_refused() {
    let mut ledger = Ledger::new();
    let mut consumer = funded_api_consumer(&mut ledger);
    let id = create_request(
        &mut ledger,
        API_CONSUMER,
        FulfillerAuthority::Oracle(ORACLE),
        RequestParams::Data {
            url: RAINFALL_URL.into(),
            path: RAINFALL_PATH.into(),
        },
        API_FEE,
    )
    .unwrap();

    let err = fulfill(&mut ledger, &mut consumer, id, &encode_uint(7), ORACLE).unwrap_err();
    assert_eq!(
        err,
        CoordinatorError::CallbackFailed(CallbackError::UnexpectedRequest(id))
    );
    assert_eq!(ledger.registry().status(&id), Some(RequestStatus::Pending));
    assert_eq!(consumer.rainfall(), 0);
}
