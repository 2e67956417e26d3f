//! Trial configuration
//!
//! Loads and validates YAML trial configuration files and resolves them
//! into [`TrialParams`](crate::trial::TrialParams).

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning};
pub use schema::{OverlayConfig, Profile, TimingConfig, TrialConfig};
pub use validation::{ValidationResult, Validator};
