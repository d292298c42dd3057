use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use super::Store;
use crate::error::{ChainError, Result};
use crate::io::ensure_parent_dir;

type Rows = HashMap<String, BTreeMap<String, u64>>;

/// Serialized form of a `MemoryStore`, written with `postcard`.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct Snapshot {
	rows: BTreeMap<String, BTreeMap<String, u64>>,
}

/// Thread-safe in-process store.
///
/// # Responsibilities
/// - Keep every row behind a single `RwLock`, so each increment is atomic
///   and each `get_all` sees a whole row
/// - Save and load its content as a compact binary snapshot
#[derive(Debug, Default)]
pub struct MemoryStore {
	rows: RwLock<Rows>,
}

impl MemoryStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads a store from a snapshot if the file exists, otherwise returns an empty store.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		if path.as_ref().exists() {
			Self::load(path)
		} else {
			Ok(Self::new())
		}
	}

	/// Loads a store from a snapshot file.
	///
	/// # Errors
	/// - `Io` if the file cannot be read
	/// - `Snapshot` if its content is not a valid snapshot
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = fs::read(&path)?;
		let snapshot: Snapshot = postcard::from_bytes(&bytes)?;
		tracing::info!(path = %path.as_ref().display(), rows = snapshot.rows.len(), "snapshot loaded");
		Ok(Self { rows: RwLock::new(snapshot.rows.into_iter().collect()) })
	}

	/// Writes every row to a snapshot file, creating parent folders if needed.
	///
	/// Rows are written in key order, so identical content gives identical bytes.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let snapshot = Snapshot {
			rows: self.read()?.iter().map(|(key, row)| (key.clone(), row.clone())).collect(),
		};
		let bytes = postcard::to_stdvec(&snapshot)?;
		ensure_parent_dir(&path)?;
		fs::write(&path, bytes)?;
		tracing::info!(path = %path.as_ref().display(), rows = snapshot.rows.len(), "snapshot saved");
		Ok(())
	}

	/// Number of rows.
	pub fn len(&self) -> Result<usize> {
		Ok(self.read()?.len())
	}

	pub fn is_empty(&self) -> Result<bool> {
		Ok(self.read()?.is_empty())
	}

	fn read(&self) -> Result<RwLockReadGuard<'_, Rows>> {
		self.rows
			.read()
			.map_err(|_| ChainError::StoreUnavailable("store lock poisoned".to_owned()))
	}

	fn write(&self) -> Result<RwLockWriteGuard<'_, Rows>> {
		self.rows
			.write()
			.map_err(|_| ChainError::StoreUnavailable("store lock poisoned".to_owned()))
	}
}

impl Store for MemoryStore {
	fn increment(&self, key: &str, field: &str, by: u64) -> Result<u64> {
		let mut rows = self.write()?;
		let counter = rows
			.entry(key.to_owned())
			.or_default()
			.entry(field.to_owned())
			.or_insert(0);
		*counter = counter.saturating_add(by);
		Ok(*counter)
	}

	fn get_all(&self, key: &str) -> Result<BTreeMap<String, u64>> {
		Ok(self.read()?.get(key).cloned().unwrap_or_default())
	}

	fn exists(&self, key: &str) -> Result<bool> {
		Ok(self.read()?.contains_key(key))
	}

	fn keys(&self, prefix: &str) -> Result<Vec<String>> {
		let mut keys: Vec<String> = self.read()?.keys().filter(|key| key.starts_with(prefix)).cloned().collect();
		keys.sort();
		Ok(keys)
	}
}
