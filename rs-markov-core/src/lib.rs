//! Store-backed Markov chain library.
//!
//! This crate provides order-N Markov chains over token sequences, persisted
//! in a shared key-value store so that many named chains can live side by side:
//! - Sequence indexing into weighted (window -> completion) counters
//! - Fitness scoring of arbitrary sequences against a chain
//! - Weighted random generation with seeding, length bounds and termination
//! - In-memory and HTTP store backends
//!
//! The store is always injected by the caller; the engine keeps no state
//! of its own between calls.

/// Error type shared by every fallible operation.
pub mod error;

/// Engine, scoring and store configuration (TOML backed).
pub mod config;

/// Chain engine: key codec, indexer, scorer and generator.
///
/// Exposes `MarkovEngine` and the prefix-bound `Chain` handle.
pub mod model;

/// Store contract and its implementations.
pub mod store;

/// Text helpers (file loading, tokenization).
pub mod io;

pub use config::{ChainConfig, MarkovConfig, ScoreAggregation};
pub use error::{ChainError, Result};
pub use model::engine::{Chain, MarkovEngine};
pub use store::Store;
