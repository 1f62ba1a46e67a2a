//! Expiration-tracked content lifecycle: deadline bookkeeping, the option
//! grammar, and the periodic sweep.

pub mod option;
pub mod scheduler;
pub mod tracker;

pub use option::{ExpiryOption, DEFAULT_PRESETS};
pub use scheduler::{SweepHandle, SweepScheduler, DEFAULT_INTERVAL};
pub use tracker::ExpirationTracker;
