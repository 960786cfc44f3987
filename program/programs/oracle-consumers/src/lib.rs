//! Consumer contracts built on the oracle coordinator.
//!
//! Demonstrates how a consumer integrates with the coordinator:
//!
//! 1. **Request**: the consumer pays the fee through
//!    [`oracle_coordinator::create_request`] and remembers the returned id.
//! 2. **Wait**: the off-chain fulfiller answers whenever it sees the event.
//! 3. **Callback**: the coordinator calls [`ConsumerCallback::on_fulfilled`],
//!    and the consumer writes its result slot.
//!
//! [`ConsumerCallback::on_fulfilled`]: oracle_coordinator::ConsumerCallback::on_fulfilled

pub mod api_consumer;
pub mod price_consumer;
pub mod random_consumer;

pub use api_consumer::{ApiConsumer, API_FEE, RAINFALL_PATH, RAINFALL_URL};
pub use price_consumer::{FixedPriceFeed, PriceConsumer, PriceFeed, RoundData, ETH_USD_FEED};
pub use random_consumer::{RandomNumberConsumer, VRF_FEE, VRF_KEY_HASH};
