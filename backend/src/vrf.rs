//! Deterministic randomness computation.
//!
//! Uses HMAC-SHA256 keyed by the node's secret to produce a 32-byte
//! pseudo-random output that is deterministic (same inputs = same output)
//! but unpredictable without the secret key.

use hmac::{Hmac, Mac};
use oracle_coordinator::RequestId;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the 32-byte output for a randomness request.
///
/// ```text
/// output = HMAC-SHA256(secret, vrf_seed || request_slot_le || request_id)
/// ```
///
/// `vrf_seed` already mixes the requester's seed with registry entropy, so
/// neither the requester nor the node alone controls the output.
pub fn compute_randomness(
    hmac_secret: &[u8],
    vrf_seed: &[u8; 32],
    request_slot: u64,
    request_id: &RequestId,
) -> [u8; 32] {
    let mut mac =
        HmacSha256::new_from_slice(hmac_secret).expect("HMAC accepts keys of any size");

    mac.update(vrf_seed);
    mac.update(&request_slot.to_le_bytes());
    mac.update(request_id.as_bytes());

    let result = mac.finalize();
    let bytes = result.into_bytes();

    let mut output = [0u8; 32];
    output.copy_from_slice(&bytes);
    output
}
