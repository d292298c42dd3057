//! Chain engine for store-backed Markov chains.
//!
//! This module provides:
//! - Key encoding for (prefix, window) pairs (`codec`)
//! - Completion distributions read back from the store (`distribution`)
//! - The engine and its prefix-bound handle (`engine`)
//! - Sequence indexing, scoring and generation (`indexer`, `scorer`, `generator`)
//! - Generation settings (`generate_options`)

/// Key and field encoding, including separator escaping and reserved markers.
pub mod codec;

/// A single window's completion frequencies.
///
/// Supports likelihood lookups and weighted random sampling.
pub mod distribution;

/// `MarkovEngine` (store + configuration) and the `Chain` convenience handle.
pub mod engine;

/// Generation settings: start seed, length bound, quality floor, relevant terms.
pub mod generate_options;

/// Weighted random walk over a chain.
pub mod generator;

/// Write path: sliding-window decomposition into store increments.
mod indexer;

/// Read path: per-window likelihoods aggregated into a fitness score.
mod scorer;

/// Token abstraction.
pub mod token;
