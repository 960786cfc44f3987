//! Resolves data requests: fetch a JSON document and walk a dotted path to a
//! non-negative number.

use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

pub enum DataSource {
    /// GET the request URL over HTTP.
    Http(reqwest::Client),
    /// Answer every request with the same value.
    Fixed(u64),
}

impl DataSource {
    pub fn http(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::Http(client))
    }

    /// Fetch `url` and extract the value at `path`.
    pub async fn fetch(&self, url: &str, path: &str) -> Result<u64> {
        match self {
            DataSource::Fixed(value) => Ok(*value),
            DataSource::Http(client) => {
                let document: Value = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("request to {url} failed"))?
                    .error_for_status()
                    .with_context(|| format!("{url} returned an error status"))?
                    .json()
                    .await
                    .with_context(|| format!("{url} did not return JSON"))?;
                extract_path(&document, path)
            }
        }
    }
}

/// Walk `path` (dot-separated keys, numeric segments index arrays) and read
/// the value as an unsigned integer. Fractional values are rounded.
pub fn extract_path(document: &Value, path: &str) -> Result<u64> {
    let mut current = document;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .with_context(|| format!("path segment {segment:?} not found in {path:?}"))?;
    }

    if let Some(value) = current.as_u64() {
        return Ok(value);
    }
    match current.as_f64() {
        Some(value) if value.is_finite() && value >= 0.0 && value <= u64::MAX as f64 => {
            Ok(value.round() as u64)
        }
        _ => anyhow::bail!("value at {path:?} is not a non-negative number: {current}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_nested_objects() {
        let doc = json!({"rainfalls": {"iowa": {"september": {"2021": {"average": 45720}}}}});
        assert_eq!(
            extract_path(&doc, "rainfalls.iowa.september.2021.average").unwrap(),
            45720
        );
    }

    #[test]
    fn indexes_arrays_and_rounds_floats() {
        let doc = json!({"readings": [1.2, 2.6]});
        assert_eq!(extract_path(&doc, "readings.1").unwrap(), 3);
    }

    #[test]
    fn missing_segment_is_an_error() {
        let doc = json!({"a": 1});
        assert!(extract_path(&doc, "a.b").is_err());
        assert!(extract_path(&doc, "c").is_err());
    }

    #[test]
    fn negative_values_are_rejected() {
        let doc = json!({"a": -4});
        assert!(extract_path(&doc, "a").is_err());
    }

    #[tokio::test]
    async fn fixed_source_ignores_url() {
        let source = DataSource::Fixed(7);
        assert_eq!(source.fetch("http://unused", "x").await.unwrap(), 7);
    }
}
