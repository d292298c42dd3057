use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};

/// Default number of tokens a generation may add beyond its seed.
pub const DEFAULT_MAX_WORDS: usize = 1000;

/// Rule used to combine per-window likelihoods into one score.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAggregation {
	/// Nth root of the product of all likelihoods.
	#[default]
	GeometricMean,
	ArithmeticMean,
	/// Weakest window wins.
	Minimum,
}

/// Per-engine chain settings.
///
/// # Invariants
/// - `order >= 1`
/// - `epsilon_floor` is finite and within `[0.0, 1.0]`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChainConfig {
	/// Number of tokens in a window (N).
	pub order: usize,

	pub aggregation: ScoreAggregation,

	/// Lower bound applied to every local likelihood before aggregation.
	/// `0.0` keeps unseen transitions as hard zeros.
	pub epsilon_floor: f64,

	/// Default generation budget, see `GenerateOptions`.
	pub max_words: usize,
}

impl Default for ChainConfig {
	fn default() -> Self {
		Self {
			order: 2,
			aggregation: ScoreAggregation::GeometricMean,
			epsilon_floor: 0.0,
			max_words: DEFAULT_MAX_WORDS,
		}
	}
}

impl ChainConfig {
	/// Creates a default configuration with a custom order.
	pub fn with_order(order: usize) -> Self {
		Self { order, ..Self::default() }
	}

	/// Checks the invariants.
	///
	/// # Errors
	/// Returns `InvalidConfig` if the order is 0 or the floor is out of range.
	pub fn validate(&self) -> Result<()> {
		if self.order == 0 {
			return Err(ChainError::InvalidConfig("order must be >= 1".to_owned()));
		}
		if !self.epsilon_floor.is_finite() || !(0.0..=1.0).contains(&self.epsilon_floor) {
			return Err(ChainError::InvalidConfig(format!(
				"epsilon_floor must be between 0.0 and 1.0, got {}",
				self.epsilon_floor
			)));
		}
		Ok(())
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self { host: "127.0.0.1".to_owned(), port: 5000 }
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
	/// Where `MemoryStore` snapshots are read from and written to.
	pub snapshot_path: PathBuf,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self { snapshot_path: PathBuf::from("./data/markov.bin") }
	}
}

/// Top-level configuration file layout.
///
/// ```toml
/// [chain]
/// order = 2
/// aggregation = "geometric_mean"
///
/// [server]
/// port = 5000
///
/// [store]
/// snapshot_path = "./data/markov.bin"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct MarkovConfig {
	pub chain: ChainConfig,
	pub server: ServerConfig,
	pub store: StoreConfig,
}

impl MarkovConfig {
	/// Loads the configuration from a TOML file.
	///
	/// A missing file is not an error: defaults are used instead.
	///
	/// # Errors
	/// - `Io` if the file exists but cannot be read
	/// - `InvalidConfig` if it cannot be parsed or fails validation
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		if !path.exists() {
			tracing::info!("No config file found at {}. Using defaults.", path.display());
			return Ok(Self::default());
		}
		let text = fs::read_to_string(path)?;
		Self::from_toml(&text)
	}

	/// Parses a configuration from TOML text.
	pub fn from_toml(text: &str) -> Result<Self> {
		let config: Self = toml::from_str(text)?;
		config.chain.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_file_keeps_defaults() {
		let config = MarkovConfig::from_toml("[chain]\norder = 3\naggregation = \"minimum\"\n").unwrap();
		assert_eq!(config.chain.order, 3);
		assert_eq!(config.chain.aggregation, ScoreAggregation::Minimum);
		assert_eq!(config.chain.max_words, DEFAULT_MAX_WORDS);
		assert_eq!(config.server, ServerConfig::default());
	}

	#[test]
	fn zero_order_is_rejected() {
		let err = MarkovConfig::from_toml("[chain]\norder = 0\n").unwrap_err();
		assert!(matches!(err, ChainError::InvalidConfig(_)));
	}

	#[test]
	fn floor_out_of_range_is_rejected() {
		let config = ChainConfig { epsilon_floor: 1.5, ..ChainConfig::default() };
		assert!(config.validate().is_err());
	}

	#[test]
	fn missing_file_falls_back_to_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let config = MarkovConfig::load(dir.path().join("absent.toml")).unwrap();
		assert_eq!(config, MarkovConfig::default());
	}

	#[test]
	fn file_on_disk_is_parsed_and_validated() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("markov.toml");

		fs::write(&path, "[chain]\norder = 4\n[server]\nport = 8080\n").unwrap();
		let config = MarkovConfig::load(&path).unwrap();
		assert_eq!(config.chain.order, 4);
		assert_eq!(config.server.port, 8080);

		fs::write(&path, "[chain]\nepsilon_floor = 2.0\n").unwrap();
		assert!(matches!(MarkovConfig::load(&path), Err(ChainError::InvalidConfig(_))));
	}
}
