use super::codec;
use super::distribution::Distribution;
use super::engine::MarkovEngine;
use super::token::{Completion, Token};
use crate::config::ScoreAggregation;
use crate::error::Result;
use crate::store::Store;

impl<S: Store> MarkovEngine<S> {
	/// Scores a sequence for fit against a chain, in `[0, 100]`.
	///
	/// Windows are formed exactly as `add_sequence` forms them. Each window
	/// contributes the observed ratio of its completion among all completions
	/// of that window (0 for an unknown window or an unseen completion). The
	/// ratios are floored at `epsilon_floor`, combined with the configured
	/// `ScoreAggregation` and scaled to 100.
	///
	/// # Notes
	/// - An empty sequence scores 0 without reading the store.
	/// - With the default geometric mean and a zero floor, a single unseen
	///   transition scores the whole sequence 0.
	pub fn score<T: Token>(&self, tokens: &[T], prefix: &str) -> Result<f64> {
		if tokens.is_empty() {
			return Ok(0.0);
		}

		let transitions = codec::transitions(prefix, tokens, self.config.order)?;
		let mut likelihoods = Vec::with_capacity(transitions.len());
		for (key, field) in &transitions {
			let distribution = Distribution::from(self.store.get_all(key)?);
			likelihoods.push(distribution.likelihood(field).max(self.config.epsilon_floor));
		}

		let score = (aggregate(self.config.aggregation, &likelihoods) * 100.0).clamp(0.0, 100.0);
		tracing::debug!(prefix, windows = likelihoods.len(), score, "sequence scored");
		Ok(score)
	}

	/// Scores one completion relative to the most frequent completion of `window`.
	///
	/// Returns a value in `[0, 100]`; 100 for the most frequent completion,
	/// 0 if the window or the completion was never observed.
	pub fn completion_score<T: Token>(&self, window: &[T], completion: &Completion<T>, prefix: &str) -> Result<f64> {
		let field = completion.field()?;
		Ok(self.distribution(window, prefix)?.relative_score(&field))
	}

	/// Frequency of the most common completion of `window`, 0 if unknown.
	pub fn max_frequency<T: Token>(&self, window: &[T], prefix: &str) -> Result<u64> {
		Ok(self.distribution(window, prefix)?.max())
	}

	/// Frequency of the least common completion of `window`, 0 if unknown.
	pub fn min_frequency<T: Token>(&self, window: &[T], prefix: &str) -> Result<u64> {
		Ok(self.distribution(window, prefix)?.min())
	}

	/// `true` if `window` was ever recorded in the chain.
	pub fn contains_window<T: Token>(&self, window: &[T], prefix: &str) -> Result<bool> {
		let key = codec::window_key(prefix, window, self.config.order)?;
		self.store.exists(&key)
	}

	fn distribution<T: Token>(&self, window: &[T], prefix: &str) -> Result<Distribution> {
		let key = codec::window_key(prefix, window, self.config.order)?;
		Ok(self.store.get_all(&key)?.into())
	}
}

/// Combines local likelihoods into one value in `[0, 1]`.
fn aggregate(method: ScoreAggregation, likelihoods: &[f64]) -> f64 {
	if likelihoods.is_empty() {
		return 0.0;
	}
	let count = likelihoods.len() as f64;
	match method {
		ScoreAggregation::GeometricMean => {
			if likelihoods.iter().any(|p| *p <= 0.0) {
				return 0.0;
			}
			(likelihoods.iter().map(|p| p.ln()).sum::<f64>() / count).exp()
		}
		ScoreAggregation::ArithmeticMean => likelihoods.iter().sum::<f64>() / count,
		ScoreAggregation::Minimum => likelihoods.iter().copied().fold(f64::INFINITY, f64::min),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ChainConfig;
	use crate::error::ChainError;
	use crate::store::memory::MemoryStore;

	fn words(s: &str) -> Vec<String> {
		s.split_whitespace().map(str::to_owned).collect()
	}

	fn trained(config: ChainConfig) -> MarkovEngine<MemoryStore> {
		let engine = MarkovEngine::new(MemoryStore::new(), config).unwrap();
		for line in ["i ate a peach", "i ate one peach", "i ate a sandwich"] {
			engine.add_sequence(&words(line), "test").unwrap();
		}
		engine
	}

	#[test]
	fn aggregation_rules() {
		let values = [1.0, 0.25];
		assert!((aggregate(ScoreAggregation::GeometricMean, &values) - 0.5).abs() < 1e-12);
		assert_eq!(aggregate(ScoreAggregation::ArithmeticMean, &values), 0.625);
		assert_eq!(aggregate(ScoreAggregation::Minimum, &values), 0.25);
		assert_eq!(aggregate(ScoreAggregation::GeometricMean, &[0.9, 0.0]), 0.0);
		assert_eq!(aggregate(ScoreAggregation::Minimum, &[]), 0.0);
	}

	#[test]
	fn scores_lines_according_to_the_model() {
		let engine = trained(ChainConfig::default());
		// (S,S)->i 1, (S,i)->ate 1, (i,ate)->a 2/3, (ate,a)->peach 1/2, (a,peach)->END 1
		let expected = (1.0_f64 / 3.0).powf(1.0 / 5.0) * 100.0;
		let score = engine.score(&words("i ate a peach"), "test").unwrap();
		assert!((score - expected).abs() < 1e-9, "{score} != {expected}");

		assert_eq!(engine.score(&words("i ate a pizza"), "test").unwrap(), 0.0);
		assert_eq!(engine.score::<String>(&[], "test").unwrap(), 0.0);
		assert_eq!(engine.score(&words("i ate a peach"), "other").unwrap(), 0.0);
	}

	#[test]
	fn arithmetic_mean_keeps_partial_matches() {
		let config = ChainConfig { aggregation: ScoreAggregation::ArithmeticMean, ..ChainConfig::default() };
		let engine = trained(config);
		// 1 + 1 + 2/3 + 0 + 0 over 5 windows
		let expected = (2.0 + 2.0 / 3.0) / 5.0 * 100.0;
		let score = engine.score(&words("i ate a pizza"), "test").unwrap();
		assert!((score - expected).abs() < 1e-9);
	}

	#[test]
	fn epsilon_floor_avoids_total_collapse() {
		let config = ChainConfig { epsilon_floor: 0.01, ..ChainConfig::default() };
		let engine = trained(config);
		let score = engine.score(&words("i ate a pizza"), "test").unwrap();
		assert!(score > 0.0 && score < 100.0);
	}

	#[test]
	fn scores_completions_against_the_most_frequent() {
		let engine = trained(ChainConfig::default());
		let window = words("i ate");
		let a = Completion::Token("a".to_owned());
		let one = Completion::Token("one".to_owned());
		assert_eq!(engine.completion_score(&window, &a, "test").unwrap(), 100.0);
		assert_eq!(engine.completion_score(&window, &one, "test").unwrap(), 50.0);
		assert_eq!(engine.completion_score(&words("no such"), &a, "test").unwrap(), 0.0);
	}

	#[test]
	fn max_and_min_frequency() {
		let engine = trained(ChainConfig::default());
		assert_eq!(engine.max_frequency(&words("i ate"), "test").unwrap(), 2);
		assert_eq!(engine.min_frequency(&words("i ate"), "test").unwrap(), 1);
		assert_eq!(engine.max_frequency(&words("stupid key"), "test").unwrap(), 0);
		assert_eq!(engine.min_frequency(&words("stupid key"), "test").unwrap(), 0);
	}

	#[test]
	fn window_checks() {
		let engine = trained(ChainConfig::default());
		assert!(engine.contains_window(&words("ate one"), "test").unwrap());
		assert!(!engine.contains_window(&words("one ate"), "test").unwrap());
		let err = engine.contains_window(&words("i"), "test").unwrap_err();
		assert_eq!(err, ChainError::InvalidWindow { expected: 2, actual: 1 });
	}
}
