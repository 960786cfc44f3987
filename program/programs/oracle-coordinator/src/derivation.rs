//! Correlation id and seed derivation.
//!
//! Data requests: `id = SHA256("data-request" || requester || nonce_le)`.
//! Unique because the per-requester nonce never repeats.
//!
//! Randomness requests:
//! ```text
//! vrf_seed = SHA256("vrf-seed" || key_hash || user_seed || requester || nonce_le || entropy)
//! id       = SHA256("vrf-request" || key_hash || vrf_seed)
//! ```
//! `entropy` is the registry's hash chain over every previously minted id,
//! so the requester cannot pre-compute the seed the provider will answer.

use sha2::{Digest, Sha256};

use crate::state::{Address, RequestId};

fn finish(hasher: Sha256) -> [u8; 32] {
    let hash = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}

pub fn data_request_id(requester: &Address, nonce: u64) -> RequestId {
    let mut hasher = Sha256::new();
    hasher.update(b"data-request");
    hasher.update(requester.as_bytes());
    hasher.update(nonce.to_le_bytes());
    RequestId(finish(hasher))
}

pub fn vrf_seed(
    key_hash: &[u8; 32],
    user_seed: &[u8; 32],
    requester: &Address,
    nonce: u64,
    entropy: &[u8; 32],
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"vrf-seed");
    hasher.update(key_hash);
    hasher.update(user_seed);
    hasher.update(requester.as_bytes());
    hasher.update(nonce.to_le_bytes());
    hasher.update(entropy);
    finish(hasher)
}

pub fn randomness_request_id(key_hash: &[u8; 32], vrf_seed: &[u8; 32]) -> RequestId {
    let mut hasher = Sha256::new();
    hasher.update(b"vrf-request");
    hasher.update(key_hash);
    hasher.update(vrf_seed);
    RequestId(finish(hasher))
}

/// Next link of the registry entropy chain.
pub fn next_entropy(entropy: &[u8; 32], id: &RequestId, slot: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(entropy);
    hasher.update(id.as_bytes());
    hasher.update(slot.to_le_bytes());
    finish(hasher)
}
