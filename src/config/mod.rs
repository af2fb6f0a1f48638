//! Configuration management.
//!
//! XDG-compliant application settings: persisted defaults for the scan
//! knobs, loaded at startup and overridden by CLI flags.

mod settings;

pub use settings::{AppSettings, Paths};
