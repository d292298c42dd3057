use std::path::Path;

use super::generate_options::GenerateOptions;
use super::generator::Generation;
use super::token::{Completion, Token};
use crate::config::ChainConfig;
use crate::error::Result;
use crate::store::Store;

/// High-level entry point tying a store to a chain configuration.
///
/// # Responsibilities
/// - Index token sequences into the store (`add_sequence`, `index_lines`, ...)
/// - Score sequences against a chain (`score`, `completion_score`, ...)
/// - Generate sequences by weighted random walk (`generate`, `generate_with`, ...)
///
/// Every operation takes the chain `prefix` explicitly; use `chain` to get a
/// handle with the prefix bound. No chain data is cached between calls.
#[derive(Debug)]
pub struct MarkovEngine<S> {
	pub(crate) store: S,
	pub(crate) config: ChainConfig,
}

impl<S: Store> MarkovEngine<S> {
	/// Creates an engine over an injected store.
	///
	/// # Errors
	/// Returns `InvalidConfig` if the configuration is invalid.
	pub fn new(store: S, config: ChainConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { store, config })
	}

	/// Creates an engine with the default configuration (order 2).
	pub fn with_defaults(store: S) -> Self {
		Self { store, config: ChainConfig::default() }
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	pub fn config(&self) -> &ChainConfig {
		&self.config
	}

	/// Window width (N).
	pub fn order(&self) -> usize {
		self.config.order
	}

	/// Creates generation options using the configured `max_words`.
	pub fn generate_options<T>(&self) -> GenerateOptions<T> {
		GenerateOptions::new(self.config.max_words)
	}

	/// Returns a handle bound to one chain.
	pub fn chain(&self, prefix: impl Into<String>) -> Chain<'_, S> {
		Chain { engine: self, prefix: prefix.into() }
	}
}

/// Convenience handle that curries the `prefix` argument of `MarkovEngine`.
#[derive(Debug)]
pub struct Chain<'a, S> {
	engine: &'a MarkovEngine<S>,
	prefix: String,
}

impl<S: Store> Chain<'_, S> {
	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn add_sequence<T: Token>(&self, tokens: &[T]) -> Result<()> {
		self.engine.add_sequence(tokens, &self.prefix)
	}

	pub fn score<T: Token>(&self, tokens: &[T]) -> Result<f64> {
		self.engine.score(tokens, &self.prefix)
	}

	pub fn generate<T: Token>(&self, seed: Option<&[T]>, max_words: usize) -> Result<Generation<T>> {
		self.engine.generate(&self.prefix, seed, max_words)
	}

	pub fn generate_with<T: Token>(&self, options: &GenerateOptions<T>) -> Result<Generation<T>> {
		self.engine.generate_with(&self.prefix, options)
	}

	pub fn completion_score<T: Token>(&self, window: &[T], completion: &Completion<T>) -> Result<f64> {
		self.engine.completion_score(window, completion, &self.prefix)
	}

	pub fn max_frequency<T: Token>(&self, window: &[T]) -> Result<u64> {
		self.engine.max_frequency(window, &self.prefix)
	}

	pub fn min_frequency<T: Token>(&self, window: &[T]) -> Result<u64> {
		self.engine.min_frequency(window, &self.prefix)
	}

	pub fn contains_window<T: Token>(&self, window: &[T]) -> Result<bool> {
		self.engine.contains_window(window, &self.prefix)
	}
}

impl<S: Store + Sync> Chain<'_, S> {
	pub fn index_lines<L: AsRef<str> + Sync>(&self, lines: &[L]) -> Result<usize> {
		self.engine.index_lines(lines, &self.prefix)
	}

	pub fn index_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
		self.engine.index_file(path, &self.prefix)
	}
}
