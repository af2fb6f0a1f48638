//! Dispatch pacing for batch scans.
//!
//! A token bucket with a burst of one smooths probe dispatch to the target
//! rate instead of releasing it in clumps, which keeps the scan from
//! flooding networks and tripping volumetric alarms.

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Gate each task dispatch passes before its probes go out.
///
/// A rate of zero disables pacing entirely; `wait` then returns at once.
pub struct RateGate {
    limiter: Option<Arc<DirectLimiter>>,
}

impl RateGate {
    /// Gate dispatch to at most `rate` tasks per second.
    pub fn per_second(rate: u32) -> Self {
        let limiter = NonZeroU32::new(rate).map(|rate| {
            let quota = Quota::per_second(rate).allow_burst(nonzero!(1u32));
            Arc::new(RateLimiter::direct(quota))
        });
        Self { limiter }
    }

    /// A gate that never delays.
    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    pub fn is_disabled(&self) -> bool {
        self.limiter.is_none()
    }

    /// Wait until the next dispatch slot is available.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

impl Clone for RateGate {
    fn clone(&self) -> Self {
        Self {
            limiter: self.limiter.as_ref().map(Arc::clone),
        }
    }
}
