//! godnslog DNS-log provider.

use crate::error::{ScanError, ScanResult};
use crate::reverse::{ReverseError, ReverseProvider, CHECK_TIMEOUT};
use crate::types::CallbackToken;
use async_trait::async_trait;
use serde::Deserialize;

/// Queries a self-hosted or hosted godnslog instance.
///
/// `domain` is the account domain, e.g. `probe.godnslog.com`; the query API
/// is served from the same domain and authenticated with the account secret.
pub struct GodnslogProvider {
    domain: String,
    secret: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Vec<serde_json::Value>,
}

impl GodnslogProvider {
    pub fn new(domain: String, secret: String) -> Result<Self, ReverseError> {
        let client = reqwest::Client::builder()
            .timeout(CHECK_TIMEOUT)
            .build()
            .map_err(|e| ReverseError::Client(e.to_string()))?;
        Ok(Self {
            domain,
            secret,
            client,
        })
    }
}

#[async_trait]
impl ReverseProvider for GodnslogProvider {
    fn label(&self) -> &'static str {
        "godnslog"
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    async fn query(&self, token: &CallbackToken) -> ScanResult<bool> {
        let response: QueryResponse = self
            .client
            .get(format!("http://{}/data/", self.domain))
            .query(&[
                ("q", token.as_str()),
                ("t", "dns"),
                ("secret", self.secret.as_str()),
            ])
            .send()
            .await
            .map_err(ScanError::from_reqwest)?
            .json()
            .await
            .map_err(ScanError::from_reqwest)?;

        Ok(!response.result.is_empty())
    }
}
