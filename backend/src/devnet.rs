//! In-process ledger with the demo consumers deployed on it.
//!
//! Every transaction goes through one `tokio::sync::Mutex`, which gives the
//! coordinator the single global ordering it assumes.

use std::sync::Arc;

use anyhow::{Context, Result};
use oracle_consumers::{ApiConsumer, RandomNumberConsumer};
use oracle_coordinator::{
    Address, ConsumerCallback, CoordinatorError, Ledger, RequestId,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::AppConfig;

pub type SharedDevnet = Arc<Mutex<Devnet>>;

#[derive(Debug, Error)]
pub enum DevnetError {
    #[error("no consumer deployed at {0}")]
    UnknownConsumer(Address),
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

pub struct Devnet {
    pub ledger: Ledger,
    pub rainfall: ApiConsumer,
    pub random: RandomNumberConsumer,
}

impl Devnet {
    /// Deploy the demo consumers bound to the configured authorities and fund them.
    pub fn bootstrap(config: &AppConfig) -> Result<Self> {
        let mut ledger = Ledger::new();
        let rainfall = ApiConsumer::new(config.rainfall_consumer_address, config.oracle_address);
        let random = RandomNumberConsumer::new(
            config.random_consumer_address,
            config.vrf_coordinator_address,
        );

        for consumer in [rainfall.address(), random.address()] {
            ledger
                .mint(consumer, config.consumer_funding)
                .with_context(|| format!("failed to fund consumer {consumer}"))?;
        }

        info!(
            rainfall = %rainfall.address(),
            random = %random.address(),
            funding = config.consumer_funding,
            "Deployed demo consumers"
        );

        Ok(Self {
            ledger,
            rainfall,
            random,
        })
    }

    pub fn shared(self) -> SharedDevnet {
        Arc::new(Mutex::new(self))
    }

    pub fn request_rainfall(&mut self) -> Result<RequestId, CoordinatorError> {
        self.rainfall.request_rainfall(&mut self.ledger)
    }

    pub fn request_randomness(&mut self, seed: [u8; 32]) -> Result<RequestId, CoordinatorError> {
        self.random.get_random_number(&mut self.ledger, seed)
    }

    /// Submit a fulfillment from `caller` to the consumer deployed at `consumer`.
    pub fn fulfill(
        &mut self,
        consumer: Address,
        id: RequestId,
        result: &[u8],
        caller: Address,
    ) -> Result<(), DevnetError> {
        let Devnet {
            ledger,
            rainfall,
            random,
        } = self;

        let target: &mut dyn ConsumerCallback = if rainfall.address() == consumer {
            rainfall
        } else if random.address() == consumer {
            random
        } else {
            return Err(DevnetError::UnknownConsumer(consumer));
        };

        oracle_coordinator::fulfill(ledger, target, id, result, caller)?;
        Ok(())
    }
}
