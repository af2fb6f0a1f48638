//! Out-of-band callback correlation.
//!
//! Blind checks cannot observe success in the HTTP response; instead they
//! plant a unique token inside a payload and watch an external DNS-log
//! service for the target phoning home. The [`Correlator`] mints per-probe
//! [`CallbackEcho`]es and later asks the configured provider whether the
//! token was seen. With no provider configured the correlator runs
//! degraded: it mints nothing and every confirmation answers no.

mod ceye;
mod godnslog;

pub use ceye::CeyeProvider;
pub use godnslog::GodnslogProvider;

use crate::error::ScanResult;
use crate::types::{CallbackEcho, CallbackToken};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

/// Deadline for one provider API round trip.
pub(crate) const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause between polls while waiting out a confirmation window.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Errors configuring the callback correlator.
#[derive(Error, Debug)]
pub enum ReverseError {
    #[error("invalid callback URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("unknown callback service '{0}', expected 'ceye' or 'godnslog'")]
    UnknownScheme(String),

    #[error("callback URI for '{scheme}' is missing the '{param}' parameter")]
    MissingParam { scheme: String, param: String },

    #[error("failed to build callback HTTP client: {0}")]
    Client(String),
}

/// A DNS-log service that records lookups of planted tokens.
#[async_trait]
pub trait ReverseProvider: Send + Sync {
    /// Short provider name for logs.
    fn label(&self) -> &'static str;

    /// Base domain tokens are planted under.
    fn domain(&self) -> &str;

    /// Ask the service whether any record mentions the token.
    async fn query(&self, token: &CallbackToken) -> ScanResult<bool>;
}

/// Mints callback addresses and confirms whether they were contacted.
#[derive(Clone)]
pub struct Correlator {
    provider: Option<Arc<dyn ReverseProvider>>,
    poll_interval: Duration,
    check_timeout: Duration,
}

impl Correlator {
    /// Parse a callback URI of the form `service://domain?credential=...`.
    ///
    /// Supported services: `ceye://your-id.ceye.io?api=KEY` and
    /// `godnslog://your-domain.godnslog.com?secret=SECRET`.
    pub fn configure(uri: &str) -> Result<Self, ReverseError> {
        let parsed = Url::parse(uri).map_err(|e| ReverseError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        let domain = parsed
            .host_str()
            .ok_or_else(|| ReverseError::InvalidUri {
                uri: uri.to_string(),
                reason: "missing callback domain".to_string(),
            })?
            .to_string();
        let param = |name: &str| -> Result<String, ReverseError> {
            parsed
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .ok_or_else(|| ReverseError::MissingParam {
                    scheme: parsed.scheme().to_string(),
                    param: name.to_string(),
                })
        };

        let provider: Arc<dyn ReverseProvider> = match parsed.scheme() {
            "ceye" => Arc::new(CeyeProvider::new(domain, param("api")?)?),
            "godnslog" => Arc::new(GodnslogProvider::new(domain, param("secret")?)?),
            other => return Err(ReverseError::UnknownScheme(other.to_string())),
        };
        info!(
            service = provider.label(),
            domain = provider.domain(),
            "callback correlator enabled"
        );
        Ok(Self::with_provider(provider))
    }

    /// Wrap an already-built provider.
    pub fn with_provider(provider: Arc<dyn ReverseProvider>) -> Self {
        Self {
            provider: Some(provider),
            poll_interval: POLL_INTERVAL,
            check_timeout: CHECK_TIMEOUT,
        }
    }

    /// A correlator with no provider: mints nothing, confirms nothing.
    pub fn disabled() -> Self {
        Self {
            provider: None,
            poll_interval: POLL_INTERVAL,
            check_timeout: CHECK_TIMEOUT,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Mint a fresh callback address for one evaluation.
    ///
    /// Returns `None` when running degraded.
    pub fn mint(&self) -> Option<CallbackEcho> {
        let provider = self.provider.as_ref()?;
        let token = CallbackToken::mint();
        let address = format!("{}.{}", token, provider.domain());
        Some(CallbackEcho::new(address, token))
    }

    /// Poll the provider until the token shows up or the window closes.
    ///
    /// Provider errors and per-check timeouts fail closed: an unreachable
    /// DNS-log service never produces a match. Always performs at least
    /// one check, so a zero window still catches already-recorded hits.
    pub async fn was_triggered(&self, token: &CallbackToken, within: Duration) -> bool {
        let Some(provider) = &self.provider else {
            return false;
        };
        let deadline = Instant::now() + within;
        loop {
            match tokio::time::timeout(self.check_timeout, provider.query(token)).await {
                Ok(Ok(true)) => return true,
                Ok(Ok(false)) => {}
                Ok(Err(e)) => {
                    debug!(service = provider.label(), error = %e, "callback check failed");
                }
                Err(_) => {
                    debug!(service = provider.label(), "callback check timed out");
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory provider for engine tests.

    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) struct MockProvider {
        domain: String,
        seen: Mutex<HashSet<String>>,
        always: AtomicBool,
        queries: AtomicUsize,
    }

    impl MockProvider {
        pub fn new(domain: &str) -> Self {
            Self {
                domain: domain.to_string(),
                seen: Mutex::new(HashSet::new()),
                always: AtomicBool::new(false),
                queries: AtomicUsize::new(0),
            }
        }

        /// Simulate the target having phoned home with this token.
        pub fn trigger(&self, token: &CallbackToken) {
            self.seen.lock().unwrap().insert(token.as_str().to_string());
        }

        /// Answer yes to every lookup, standing in for a target that
        /// resolves any planted address immediately.
        pub fn hit_everything(&self) {
            self.always.store(true, Ordering::SeqCst);
        }

        pub fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReverseProvider for MockProvider {
        fn label(&self) -> &'static str {
            "mock"
        }

        fn domain(&self) -> &str {
            &self.domain
        }

        async fn query(&self, token: &CallbackToken) -> ScanResult<bool> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.always.load(Ordering::SeqCst)
                || self.seen.lock().unwrap().contains(token.as_str()))
        }
    }
}
