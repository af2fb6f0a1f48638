//! ceye.io DNS-log provider.

use crate::error::{ScanError, ScanResult};
use crate::reverse::{ReverseError, ReverseProvider, CHECK_TIMEOUT};
use crate::types::CallbackToken;
use async_trait::async_trait;
use serde::Deserialize;

const RECORDS_API: &str = "http://api.ceye.io/v1/records";

/// Queries the ceye.io records API for planted DNS tokens.
///
/// `domain` is the per-account identifier domain, e.g. `abc123.ceye.io`;
/// the API token comes from the account profile page.
pub struct CeyeProvider {
    domain: String,
    api_token: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct Records {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

impl CeyeProvider {
    pub fn new(domain: String, api_token: String) -> Result<Self, ReverseError> {
        let client = reqwest::Client::builder()
            .timeout(CHECK_TIMEOUT)
            .build()
            .map_err(|e| ReverseError::Client(e.to_string()))?;
        Ok(Self {
            domain,
            api_token,
            client,
        })
    }
}

#[async_trait]
impl ReverseProvider for CeyeProvider {
    fn label(&self) -> &'static str {
        "ceye"
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    async fn query(&self, token: &CallbackToken) -> ScanResult<bool> {
        let records: Records = self
            .client
            .get(RECORDS_API)
            .query(&[
                ("token", self.api_token.as_str()),
                ("type", "dns"),
                ("filter", token.as_str()),
            ])
            .send()
            .await
            .map_err(ScanError::from_reqwest)?
            .json()
            .await
            .map_err(ScanError::from_reqwest)?;

        Ok(!records.data.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_payload_shapes() {
        let hit: Records =
            serde_json::from_str(r#"{"data": [{"name": "ab12cd34ef56.abc123.ceye.io"}]}"#)
                .unwrap();
        assert!(!hit.data.is_empty());

        let miss: Records = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(miss.data.is_empty());

        // The API omits `data` entirely on some error paths.
        let absent: Records = serde_json::from_str(r#"{"meta": {"code": 200}}"#).unwrap();
        assert!(absent.data.is_empty());
    }
}
