//! dropspot - self-hosted ephemeral content store
//!
//! Users drop text snippets, files, links or notepad pages; entries may
//! carry a time-to-live and are purged automatically once it passes;
//! connected clients are notified live whenever content changes.
//!
//! # Architecture
//!
//! - Content lives on the filesystem, one category directory per kind
//!   (links share one list file)
//! - Expiration deadlines live in one JSON document, rewritten in full on
//!   every change and swept periodically plus on every listing
//! - Live updates are best-effort markers: subscribers re-fetch state
//!   rather than receiving diffs
//!
//! # Modules
//!
//! - `store`: categories, entry identity, naming, filesystem operations
//! - `expiry`: expiry option grammar, deadline tracker, sweep scheduler
//! - `hub`: live-update broadcast hub
//! - `service`: composition root used by front ends
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Drop a snippet that disappears in two hours
//! echo "meeting notes" | dropspot add notes.md --expire 2h
//!
//! # List everything still alive
//! dropspot list
//!
//! # Run the sweep daemon
//! dropspot serve
//! ```

pub mod cli;
pub mod config;
pub mod expiry;
pub mod hub;
pub mod service;
pub mod store;

// Re-export main types at crate root for convenience
pub use expiry::{ExpirationTracker, ExpiryOption, SweepHandle, SweepScheduler};
pub use hub::{BroadcastHub, Subscription, UpdateMessage};
pub use service::Service;
pub use store::{Category, ContentStore, EntryId, EntryInfo, StoreError};
