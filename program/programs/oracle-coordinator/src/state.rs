use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Token amount in the smallest unit (18 decimals, like LINK).
pub type Amount = u128;

/// One whole token expressed in base units.
pub const TOKEN: Amount = 1_000_000_000_000_000_000;

/// 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

/// 32-byte correlation identifier assigned to every request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RequestId(pub [u8; 32]);

impl RequestId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Error returned when parsing a hex address or request id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} hex bytes, got {input:?}")]
pub struct ParseHexError {
    pub expected: usize,
    pub input: String,
}

fn parse_fixed_hex<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
    let err = || ParseHexError {
        expected: N,
        input: s.to_string(),
    };
    let stripped = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|_| err())?;
    bytes.try_into().map_err(|_| err())
}

macro_rules! hex_newtype {
    ($ty:ident, $len:expr) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($ty), self)
            }
        }

        impl FromStr for $ty {
            type Err = ParseHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_fixed_hex::<{ $len }>(s).map($ty)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_newtype!(Address, 20);
hex_newtype!(RequestId, 32);

/// The single identity allowed to resolve a request.
///
/// Bound when the consumer is constructed and copied onto every request the
/// consumer issues. Fulfillment attempts are compared against it by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "snake_case")]
pub enum FulfillerAuthority {
    /// Oracle contract answering external data requests.
    Oracle(Address),
    /// Coordinator answering randomness requests.
    RandomnessProvider(Address),
}

impl FulfillerAuthority {
    pub fn address(&self) -> Address {
        match self {
            FulfillerAuthority::Oracle(a) | FulfillerAuthority::RandomnessProvider(a) => *a,
        }
    }

    pub fn is(&self, caller: &Address) -> bool {
        self.address() == *caller
    }
}

/// Provider-specific request payload, recorded at creation and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestParams {
    /// External data lookup: fetch `url`, walk the dotted JSON `path`.
    Data { url: String, path: String },
    /// Randomness request: provider key hash plus requester-supplied seed.
    Randomness {
        key_hash: [u8; 32],
        user_seed: [u8; 32],
    },
}

impl RequestParams {
    pub fn is_randomness(&self) -> bool {
        matches!(self, RequestParams::Randomness { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Created and paid for, awaiting the authority's fulfillment.
    Pending,
    /// Resolved exactly once; terminal.
    Fulfilled,
}

/// Individual request record, one per correlation id.
///
/// Lifecycle: Pending -> Fulfilled. There is no expiry and no cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OracleRequest {
    pub id: RequestId,
    /// The consumer that issued and paid for the request.
    pub requester: Address,
    pub authority: FulfillerAuthority,
    pub params: RequestParams,
    /// Seed derived from the requester's seed and registry entropy.
    /// Present for randomness requests only.
    pub vrf_seed: Option<[u8; 32]>,
    pub fee_paid: Amount,
    pub status: RequestStatus,
    /// Slot at which the request was created.
    pub request_slot: u64,
    /// Slot at which the authority fulfilled the request.
    pub fulfilled_slot: Option<u64>,
    /// Raw result payload accepted at fulfillment.
    pub result: Option<Vec<u8>>,
}

impl OracleRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Canonical `id -> request` mapping plus the counters used for derivation.
#[derive(Debug, Clone)]
pub struct RequestRegistry {
    pub(crate) requests: HashMap<RequestId, OracleRequest>,
    /// Per-requester nonce, bumped on every request the requester issues.
    pub(crate) nonces: BTreeMap<Address, u64>,
    /// Monotonically increasing count of all requests ever created.
    pub(crate) request_counter: u64,
    /// Hash chain over every minted id; mixed into randomness seeds.
    pub(crate) entropy: [u8; 32],
}

impl RequestRegistry {
    pub fn new(genesis_entropy: [u8; 32]) -> Self {
        Self {
            requests: HashMap::new(),
            nonces: BTreeMap::new(),
            request_counter: 0,
            entropy: genesis_entropy,
        }
    }

    pub fn get(&self, id: &RequestId) -> Option<&OracleRequest> {
        self.requests.get(id)
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.requests.contains_key(id)
    }

    pub fn status(&self, id: &RequestId) -> Option<RequestStatus> {
        self.requests.get(id).map(|r| r.status)
    }

    /// All requests still awaiting fulfillment, oldest first.
    pub fn pending(&self) -> Vec<&OracleRequest> {
        let mut pending: Vec<_> = self.requests.values().filter(|r| r.is_pending()).collect();
        pending.sort_by_key(|r| r.request_slot);
        pending
    }

    pub fn nonce_of(&self, requester: &Address) -> u64 {
        self.nonces.get(requester).copied().unwrap_or(0)
    }

    pub fn request_counter(&self) -> u64 {
        self.request_counter
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
