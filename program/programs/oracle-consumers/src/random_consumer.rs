use std::collections::BTreeSet;

use oracle_coordinator::{
    create_request, decode_word, Address, Amount, CallbackError, ConsumerCallback,
    CoordinatorError, FulfillerAuthority, Ledger, RequestId, RequestParams, TOKEN,
};
use tracing::info;

/// Fee charged per randomness request: 2 tokens.
pub const VRF_FEE: Amount = 2 * TOKEN;

/// Key hash identifying the randomness provider's proving key.
pub const VRF_KEY_HASH: [u8; 32] = [
    0xaa, 0x77, 0x72, 0x9d, 0x34, 0x66, 0xca, 0x35, 0xae, 0x8d, 0x28, 0xb3, 0xbb, 0xac, 0x7c,
    0xc3, 0x6a, 0x50, 0x31, 0xef, 0xdc, 0x43, 0x08, 0x21, 0xc0, 0x2b, 0xc3, 0x1a, 0x23, 0x8a,
    0xf4, 0x45,
];

/// Consumer that requests a random 256-bit value from a randomness provider.
#[derive(Debug, Clone)]
pub struct RandomNumberConsumer {
    address: Address,
    coordinator: Address,
    key_hash: [u8; 32],
    fee: Amount,
    random_result: [u8; 32],
    pending: BTreeSet<RequestId>,
}

impl RandomNumberConsumer {
    pub fn new(address: Address, coordinator: Address) -> Self {
        Self {
            address,
            coordinator,
            key_hash: VRF_KEY_HASH,
            fee: VRF_FEE,
            random_result: [0u8; 32],
            pending: BTreeSet::new(),
        }
    }

    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn key_hash(&self) -> &[u8; 32] {
        &self.key_hash
    }

    pub fn coordinator(&self) -> Address {
        self.coordinator
    }

    /// Most recently delivered random value, all zeros before the first one.
    pub fn random_result(&self) -> &[u8; 32] {
        &self.random_result
    }

    pub fn outstanding(&self) -> &BTreeSet<RequestId> {
        &self.pending
    }

    /// Pay the fee and request randomness mixed with `user_seed`.
    pub fn get_random_number(
        &mut self,
        ledger: &mut Ledger,
        user_seed: [u8; 32],
    ) -> Result<RequestId, CoordinatorError> {
        let params = RequestParams::Randomness {
            key_hash: self.key_hash,
            user_seed,
        };
        let id = create_request(
            ledger,
            self.address,
            FulfillerAuthority::RandomnessProvider(self.coordinator),
            params,
            self.fee,
        )?;
        self.pending.insert(id);
        Ok(id)
    }
}

impl ConsumerCallback for RandomNumberConsumer {
    fn address(&self) -> Address {
        self.address
    }

    fn authority(&self) -> FulfillerAuthority {
        FulfillerAuthority::RandomnessProvider(self.coordinator)
    }

    fn on_fulfilled(&mut self, id: RequestId, result: &[u8]) -> Result<(), CallbackError> {
        if !self.pending.contains(&id) {
            return Err(CallbackError::UnexpectedRequest(id));
        }
        let randomness = decode_word(result)?;

        self.pending.remove(&id);
        self.random_result = randomness;
        info!(request_id = %id, "Random result stored");
        Ok(())
    }
}
