//! Key-value store contract used by the chain engine.
//!
//! A store holds rows (one per encoded window key) of integer counters
//! (one per completion field). The engine only ever mutates rows through
//! `increment`, which must be atomic per counter.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;

/// In-process store with optional disk snapshots.
pub mod memory;

/// Request and response bodies of the store HTTP routes.
pub mod protocol;

/// Blocking client for a store served by `rs-markov-server`.
#[cfg(feature = "http")]
pub mod http;

pub use memory::MemoryStore;

/// Operations a chain store must provide.
///
/// Implementations report transport failures as `ChainError::StoreUnavailable`.
pub trait Store {
	/// Atomically adds `by` to the `field` counter of row `key`, creating
	/// both at 0 if absent. Returns the new value.
	fn increment(&self, key: &str, field: &str, by: u64) -> Result<u64>;

	/// Returns every counter of row `key`, or an empty map if the row is absent.
	///
	/// The returned row never reflects half of a concurrent increment.
	fn get_all(&self, key: &str) -> Result<BTreeMap<String, u64>>;

	fn exists(&self, key: &str) -> Result<bool>;

	/// Lists the keys starting with `prefix`, sorted.
	fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

impl<S: Store + ?Sized> Store for &S {
	fn increment(&self, key: &str, field: &str, by: u64) -> Result<u64> {
		(**self).increment(key, field, by)
	}

	fn get_all(&self, key: &str) -> Result<BTreeMap<String, u64>> {
		(**self).get_all(key)
	}

	fn exists(&self, key: &str) -> Result<bool> {
		(**self).exists(key)
	}

	fn keys(&self, prefix: &str) -> Result<Vec<String>> {
		(**self).keys(prefix)
	}
}

impl<S: Store + ?Sized> Store for Arc<S> {
	fn increment(&self, key: &str, field: &str, by: u64) -> Result<u64> {
		(**self).increment(key, field, by)
	}

	fn get_all(&self, key: &str) -> Result<BTreeMap<String, u64>> {
		(**self).get_all(key)
	}

	fn exists(&self, key: &str) -> Result<bool> {
		(**self).exists(key)
	}

	fn keys(&self, prefix: &str) -> Result<Vec<String>> {
		(**self).keys(prefix)
	}
}
