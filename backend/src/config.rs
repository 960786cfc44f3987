//! Application configuration loaded from environment variables.
//!
//! Required: `HMAC_SECRET` or `HMAC_SECRET_PATH`
//! Optional: `ORACLE_ADDRESS`, `VRF_COORDINATOR_ADDRESS`,
//!           `RAINFALL_CONSUMER_ADDRESS`, `RANDOM_CONSUMER_ADDRESS`,
//!           `CONSUMER_FUNDING`, `HTTP_PORT`, `MAX_RETRIES`,
//!           `INITIAL_RETRY_DELAY_MS`, `FULFILLMENT_CONCURRENCY`,
//!           `POLL_INTERVAL_MS`, `HTTP_TIMEOUT_MS`, `FIXED_DATA_RESULT`

use anyhow::{Context, Result};
use oracle_coordinator::{Address, Amount, TOKEN};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ORACLE_ADDRESS: &str = "0x3Aa5ebB10DC797CAC828524e59A333d0A371443c";
pub const DEFAULT_VRF_COORDINATOR_ADDRESS: &str = "0xf0d54349aDdcf704F77AE15b96510dEA15cb7952";
pub const DEFAULT_RAINFALL_CONSUMER_ADDRESS: &str = "0x00000000000000000000000000000000000a0001";
pub const DEFAULT_RANDOM_CONSUMER_ADDRESS: &str = "0x00000000000000000000000000000000000a0002";

/// Application configuration for the oracle node.
#[derive(Clone)]
pub struct AppConfig {
    /// Identity answering data requests.
    pub oracle_address: Address,
    /// Identity answering randomness requests.
    pub vrf_coordinator_address: Address,
    /// Address the demo rainfall consumer is deployed at.
    pub rainfall_consumer_address: Address,
    /// Address the demo randomness consumer is deployed at.
    pub random_consumer_address: Address,
    /// Tokens minted to each demo consumer at startup, in base units.
    pub consumer_funding: Amount,
    /// Secret key for HMAC-SHA256 randomness generation.
    pub hmac_secret: Vec<u8>,
    /// HTTP server port.
    pub http_port: u16,
    /// Maximum attempts per fulfillment.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Maximum concurrent fulfillment tasks.
    pub fulfillment_concurrency: usize,
    /// How often the listener polls the event log.
    pub poll_interval: Duration,
    /// Timeout for outbound data-source HTTP calls.
    pub http_timeout: Duration,
    /// Answer every data request with this value instead of fetching the URL.
    pub fixed_data_result: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let parse_or = |key: &str, default: u64| -> u64 {
            lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
        };
        let address = |key: &str, default: &str| -> Result<Address> {
            let value = lookup(key).unwrap_or_else(|| default.to_string());
            Address::from_str(&value).with_context(|| format!("invalid {key}: {value}"))
        };

        let hmac_secret = match (lookup("HMAC_SECRET"), lookup("HMAC_SECRET_PATH")) {
            (Some(secret), _) => secret.into_bytes(),
            (None, Some(path)) => {
                let path = shellexpand::tilde(&path).to_string();
                std::fs::read(&path)
                    .with_context(|| format!("failed to read HMAC secret from {path}"))?
            }
            (None, None) => anyhow::bail!("HMAC_SECRET or HMAC_SECRET_PATH env var must be set"),
        };
        if hmac_secret.is_empty() {
            anyhow::bail!("HMAC secret must not be empty");
        }

        let oracle_address = address("ORACLE_ADDRESS", DEFAULT_ORACLE_ADDRESS)?;
        let vrf_coordinator_address =
            address("VRF_COORDINATOR_ADDRESS", DEFAULT_VRF_COORDINATOR_ADDRESS)?;
        let rainfall_consumer_address =
            address("RAINFALL_CONSUMER_ADDRESS", DEFAULT_RAINFALL_CONSUMER_ADDRESS)?;
        let random_consumer_address =
            address("RANDOM_CONSUMER_ADDRESS", DEFAULT_RANDOM_CONSUMER_ADDRESS)?;

        let consumer_funding = Amount::from(parse_or("CONSUMER_FUNDING", 10))
            .checked_mul(TOKEN)
            .context("CONSUMER_FUNDING is too large")?;

        let fixed_data_result = match lookup("FIXED_DATA_RESULT") {
            Some(v) => Some(
                v.parse()
                    .with_context(|| format!("invalid FIXED_DATA_RESULT: {v}"))?,
            ),
            None => None,
        };

        Ok(Self {
            oracle_address,
            vrf_coordinator_address,
            rainfall_consumer_address,
            random_consumer_address,
            consumer_funding,
            hmac_secret,
            http_port: u16::try_from(parse_or("HTTP_PORT", 8080)).unwrap_or(8080),
            max_retries: u32::try_from(parse_or("MAX_RETRIES", 5)).unwrap_or(5).max(1),
            initial_retry_delay_ms: parse_or("INITIAL_RETRY_DELAY_MS", 500),
            fulfillment_concurrency: usize::try_from(parse_or("FULFILLMENT_CONCURRENCY", 4))
                .unwrap_or(4)
                .max(1),
            poll_interval: Duration::from_millis(parse_or("POLL_INTERVAL_MS", 250)),
            http_timeout: Duration::from_millis(parse_or("HTTP_TIMEOUT_MS", 10_000)),
            fixed_data_result,
        })
    }

    /// Addresses this node fulfills requests for.
    pub fn identities(&self) -> Vec<Address> {
        vec![self.oracle_address, self.vrf_coordinator_address]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(&[("HMAC_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.hmac_secret, b"s3cret");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.consumer_funding, 10 * TOKEN);
        assert_eq!(
            config.oracle_address,
            DEFAULT_ORACLE_ADDRESS.parse::<Address>().unwrap()
        );
        assert_eq!(config.fixed_data_result, None);
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("HMAC_SECRET", "k"),
            ("HTTP_PORT", "9000"),
            ("FIXED_DATA_RESULT", "45720"),
            ("CONSUMER_FUNDING", "3"),
            ("FULFILLMENT_CONCURRENCY", "0"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.fixed_data_result, Some(45720));
        assert_eq!(config.consumer_funding, 3 * TOKEN);
        assert_eq!(config.fulfillment_concurrency, 1);
    }

    #[test]
    fn bad_address_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("HMAC_SECRET", "k"),
            ("ORACLE_ADDRESS", "0x1234"),
        ]));
        assert!(err.is_err());
    }
}
