use std::collections::BTreeSet;

use oracle_coordinator::{
    create_request, decode_u64, Address, Amount, CallbackError, ConsumerCallback,
    CoordinatorError, FulfillerAuthority, Ledger, RequestId, RequestParams, TOKEN,
};
use tracing::info;

/// Fee charged per rainfall request: 0.1 token.
pub const API_FEE: Amount = TOKEN / 10;
pub const RAINFALL_URL: &str = "http://rainfall-oracle.com";
pub const RAINFALL_PATH: &str = "rainfalls.iowa.september.2021.average";

/// Consumer that asks an oracle for a rainfall measurement.
///
/// `rainfall` is 0 until the first fulfillment and then always holds the most
/// recently delivered measurement.
#[derive(Debug, Clone)]
pub struct ApiConsumer {
    address: Address,
    oracle: Address,
    fee: Amount,
    url: String,
    path: String,
    rainfall: u64,
    pending: BTreeSet<RequestId>,
}

impl ApiConsumer {
    pub fn new(address: Address, oracle: Address) -> Self {
        Self {
            address,
            oracle,
            fee: API_FEE,
            url: RAINFALL_URL.to_string(),
            path: RAINFALL_PATH.to_string(),
            rainfall: 0,
            pending: BTreeSet::new(),
        }
    }

    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_source(mut self, url: impl Into<String>, path: impl Into<String>) -> Self {
        self.url = url.into();
        self.path = path.into();
        self
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn oracle(&self) -> Address {
        self.oracle
    }

    pub fn rainfall(&self) -> u64 {
        self.rainfall
    }

    /// Ids issued by this consumer that have not been fulfilled yet.
    pub fn outstanding(&self) -> &BTreeSet<RequestId> {
        &self.pending
    }

    /// Pay the fee and ask the oracle for the configured rainfall figure.
    pub fn request_rainfall(&mut self, ledger: &mut Ledger) -> Result<RequestId, CoordinatorError> {
        let params = RequestParams::Data {
            url: self.url.clone(),
            path: self.path.clone(),
        };
        let id = create_request(
            ledger,
            self.address,
            FulfillerAuthority::Oracle(self.oracle),
            params,
            self.fee,
        )?;
        self.pending.insert(id);
        Ok(id)
    }
}

impl ConsumerCallback for ApiConsumer {
    fn address(&self) -> Address {
        self.address
    }

    fn authority(&self) -> FulfillerAuthority {
        FulfillerAuthority::Oracle(self.oracle)
    }

    fn on_fulfilled(&mut self, id: RequestId, result: &[u8]) -> Result<(), CallbackError> {
        if !self.pending.contains(&id) {
            return Err(CallbackError::UnexpectedRequest(id));
        }
        let rainfall = decode_u64(result)?;

        self.pending.remove(&id);
        self.rainfall = rainfall;
        info!(request_id = %id, rainfall, "Rainfall updated");
        Ok(())
    }
}
