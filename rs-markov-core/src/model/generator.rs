use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

use super::codec::{self, START_MARK};
use super::distribution::Distribution;
use super::engine::MarkovEngine;
use super::generate_options::{GenerateOptions, StartSeed};
use super::token::{Completion, Token};
use crate::error::{ChainError, Result};
use crate::store::Store;

/// Why a generation stopped.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
	/// A Terminal completion was drawn.
	Done,
	/// `max_words` tokens were generated.
	Truncated,
	/// The current window has no usable completion.
	Stuck,
}

/// Output of a generation: the seed followed by the generated tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation<T> {
	pub tokens: Vec<T>,
	pub stop: StopReason,
	seed_len: usize,
}

impl<T> Generation<T> {
	/// Tokens added after the seed.
	pub fn generated(&self) -> &[T] {
		self.tokens.get(self.seed_len..).unwrap_or(&[])
	}

	pub fn into_tokens(self) -> Vec<T> {
		self.tokens
	}
}

impl<S: Store> MarkovEngine<S> {
	/// Generates a sequence from a chain.
	///
	/// # Parameters
	/// - `seed`: tokens to continue from; `None` starts a fresh sequence.
	/// - `max_words`: maximum number of tokens added beyond the seed.
	///
	/// # Returns
	/// The seed followed by the generated tokens, and the reason the walk
	/// stopped. See `generate_with_rng` for the walk itself.
	pub fn generate<T: Token>(&self, prefix: &str, seed: Option<&[T]>, max_words: usize) -> Result<Generation<T>> {
		let start_seed = seed.map_or(StartSeed::Start, |tokens| StartSeed::Custom(tokens.to_vec()));
		let options = GenerateOptions::new(max_words).with_seed(start_seed);
		self.generate_with(prefix, &options)
	}

	/// Generates a sequence using full `GenerateOptions` and the thread RNG.
	pub fn generate_with<T: Token>(&self, prefix: &str, options: &GenerateOptions<T>) -> Result<Generation<T>> {
		self.generate_with_rng(prefix, options, &mut rand::rng())
	}

	/// Generates a sequence with a caller-provided RNG.
	///
	/// # Behavior
	/// - The window starts as the last `order` seed tokens, padded with the
	///   start marker when the seed is shorter.
	/// - Each step reads the window's completions from the store and draws
	///   one, weighted by frequency (after `quality_floor` and
	///   `relevant_terms` filtering).
	/// - A Terminal draw stops the walk (`Done`); a token is appended and the
	///   window slides by one.
	/// - The walk stops with `Truncated` once `max_words` tokens were added,
	///   and with `Stuck` when the window has nothing to draw from.
	///
	/// # Errors
	/// - `InvalidToken` if a seed or relevant token cannot be encoded
	/// - `Decode` if a stored completion does not parse as `T`
	/// - `StoreUnavailable` from the store
	pub fn generate_with_rng<T, R>(&self, prefix: &str, options: &GenerateOptions<T>, rng: &mut R) -> Result<Generation<T>>
	where
		T: Token,
		R: Rng + ?Sized,
	{
		let relevant = options.relevant_terms.iter().map(codec::token_text).collect::<Result<Vec<_>>>()?;
		let mut tokens = match &options.start_seed {
			StartSeed::Start => Vec::new(),
			StartSeed::Custom(seed) => seed.clone(),
			StartSeed::Random => self.pick_seed(prefix, &relevant, rng)?.unwrap_or_default(),
		};
		let seed_len = tokens.len();

		let seed_texts = tokens.iter().map(codec::token_text).collect::<Result<Vec<_>>>()?;
		let mut window = codec::tail_window(&seed_texts, self.config.order);

		let stop = loop {
			if tokens.len() - seed_len >= options.max_words {
				break StopReason::Truncated;
			}

			let key = codec::encode(prefix, &window);
			let distribution = Distribution::from(self.store.get_all(&key)?);
			let Some(field) = distribution.sample(options.quality_floor(), &relevant, rng) else {
				break StopReason::Stuck;
			};
			tracing::trace!(prefix, field, "completion drawn");

			match Completion::<T>::parse(field)? {
				Completion::Terminal => break StopReason::Done,
				Completion::Token(token) => {
					window.remove(0);
					window.push(field.to_owned());
					tokens.push(token);
				}
			}
		};

		tracing::debug!(prefix, seed_len, generated = tokens.len() - seed_len, ?stop, "generation finished");
		Ok(Generation { tokens, stop, seed_len })
	}

	/// Picks a random recorded window of the chain and returns its tokens.
	///
	/// When `relevant` is not empty, windows holding at least one of those
	/// tokens are preferred; any window is used if none does. Start markers
	/// are stripped, so a window recorded at the beginning of a sequence
	/// yields fewer than `order` tokens. Returns `None` for an empty chain.
	///
	/// # Errors
	/// - `InvalidToken` if a relevant token cannot be encoded
	/// - `Decode` if a stored key or window slot is malformed
	pub fn random_seed<T, R>(&self, prefix: &str, relevant: &[T], rng: &mut R) -> Result<Option<Vec<T>>>
	where
		T: Token,
		R: Rng + ?Sized,
	{
		let relevant = relevant.iter().map(codec::token_text).collect::<Result<Vec<_>>>()?;
		self.pick_seed(prefix, &relevant, rng)
	}

	fn pick_seed<T, R>(&self, prefix: &str, relevant: &[String], rng: &mut R) -> Result<Option<Vec<T>>>
	where
		T: Token,
		R: Rng + ?Sized,
	{
		let windows = self
			.store
			.keys(&codec::namespace(prefix))?
			.iter()
			.map(|key| {
				codec::decode(key)
					.map(|(_, parts)| parts)
					.ok_or_else(|| ChainError::Decode(format!("malformed key {:?}", key)))
			})
			.collect::<Result<Vec<_>>>()?;

		let matching: Vec<&Vec<String>> = windows
			.iter()
			.filter(|parts| parts.iter().any(|part| relevant.contains(part)))
			.collect();
		let window = match matching.choose(rng) {
			Some(parts) => Some(*parts),
			None => windows.choose(rng),
		};
		let Some(parts) = window else {
			return Ok(None);
		};

		let seed = parts
			.iter()
			.filter(|part| part.as_str() != START_MARK)
			.map(|part| {
				part.parse::<T>()
					.map_err(|_| ChainError::Decode(format!("window slot {:?} is not a valid token", part)))
			})
			.collect::<Result<Vec<_>>>()?;
		tracing::trace!(prefix, candidates = matching.len(), "random seed picked");
		Ok(Some(seed))
	}
}
