//! Consumer-side callback interface and the result payload codec.

use crate::errors::CallbackError;
use crate::state::{Address, FulfillerAuthority, RequestId};

/// Size of one encoded result word.
pub const WORD_LEN: usize = 32;

/// A consumer contract that receives fulfillments.
///
/// `on_fulfilled` is only ever called by the fulfillment gate, at most once
/// per request id, after identity and status checks passed. An implementation
/// must decode and validate the whole payload before writing any state: if it
/// returns `Err`, the gate leaves the request pending and the consumer must be
/// unchanged.
pub trait ConsumerCallback {
    /// Address the consumer issues requests from.
    fn address(&self) -> Address;

    /// Authority bound at construction; the only caller allowed to fulfill.
    fn authority(&self) -> FulfillerAuthority;

    fn on_fulfilled(&mut self, id: RequestId, result: &[u8]) -> Result<(), CallbackError>;
}

/// Encode an unsigned integer as a 32-byte big-endian word.
pub fn encode_uint(value: u128) -> Vec<u8> {
    let mut word = vec![0u8; WORD_LEN];
    word[WORD_LEN - 16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Interpret `payload` as exactly one 32-byte word.
pub fn decode_word(payload: &[u8]) -> Result<[u8; 32], CallbackError> {
    payload
        .try_into()
        .map_err(|_| CallbackError::MalformedPayload(payload.len()))
}

/// Decode a 32-byte big-endian word into a `u64`, rejecting larger values.
pub fn decode_u64(payload: &[u8]) -> Result<u64, CallbackError> {
    let word = decode_word(payload)?;
    if word[..WORD_LEN - 8].iter().any(|b| *b != 0) {
        return Err(CallbackError::ValueOutOfRange("u64"));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD_LEN - 8..]);
    Ok(u64::from_be_bytes(low))
}
