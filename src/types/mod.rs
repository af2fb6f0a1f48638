//! Core type definitions using newtype patterns for type safety.
//!
//! These types prevent common logic errors by making invalid states unrepresentable
//! at compile time.

mod scan_id;
mod target;
mod token;
mod verdict;

pub use scan_id::ScanId;
pub use target::{Target, TargetError};
pub use token::{CallbackEcho, CallbackToken};
pub use verdict::{Evidence, Outcome, Verdict};
