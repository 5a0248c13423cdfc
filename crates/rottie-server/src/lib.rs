//! Central coordinator for rottie documents.
//!
//! The [`Coordinator`] holds the authoritative tree and change log of every
//! document it has seen. Actors talk to it through
//! [`Coordinator::push_pull`]: one call pushes the actor's pending changes
//! and pulls whatever the actor has not seen yet.
//!
//! Transport and persistence are left to the embedding service.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod stats;

pub use config::{ConfigError, CoordinatorConfig};
pub use coordinator::Coordinator;
pub use error::SyncError;
pub use stats::{CoordinatorStats, StatsSnapshot};
