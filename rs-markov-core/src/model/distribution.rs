use std::collections::BTreeMap;

use rand::Rng;

/// The completions observed after one window, as read from the store.
///
/// Conceptually this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations. Fields are kept in key
/// order, which makes sampling reproducible under a seeded RNG.
///
/// ## Responsibilities:
/// - Report frequencies, totals and likelihoods of completions
/// - Pick the next completion using weighted random sampling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
	/// Completion field → observed frequency.
	/// Example: { "a" => 2, "one" => 1 }
	completions: BTreeMap<String, u64>,
}

impl From<BTreeMap<String, u64>> for Distribution {
	fn from(completions: BTreeMap<String, u64>) -> Self {
		Self { completions }
	}
}

impl Distribution {
	/// `true` if the window was never observed.
	pub fn is_empty(&self) -> bool {
		self.total() == 0
	}

	/// Sum of all completion frequencies.
	pub fn total(&self) -> u64 {
		self.completions.values().sum()
	}

	pub fn frequency(&self, field: &str) -> u64 {
		self.completions.get(field).copied().unwrap_or(0)
	}

	/// Highest completion frequency, 0 when empty.
	pub fn max(&self) -> u64 {
		self.completions.values().copied().max().unwrap_or(0)
	}

	/// Lowest completion frequency, 0 when empty.
	pub fn min(&self) -> u64 {
		self.completions.values().copied().min().unwrap_or(0)
	}

	/// Observed ratio of `field` among all completions, in `[0, 1]`.
	pub fn likelihood(&self, field: &str) -> f64 {
		let total = self.total();
		if total == 0 {
			return 0.0;
		}
		self.frequency(field) as f64 / total as f64
	}

	/// Frequency of `field` relative to the most frequent completion, in `[0, 100]`.
	pub fn relative_score(&self, field: &str) -> f64 {
		let max = self.max();
		if max == 0 {
			return 0.0;
		}
		self.frequency(field) as f64 / max as f64 * 100.0
	}

	/// Picks a completion using weighted random sampling.
	///
	/// - Completions scoring below `quality_floor` (see `relative_score`) are excluded.
	/// - If any remaining completion is listed in `relevant`, only those are kept.
	///
	/// A single uniform draw over the cumulative-frequency line selects the
	/// bucket. Returns `None` if nothing is left to sample from.
	pub fn sample<R: Rng + ?Sized>(&self, quality_floor: f64, relevant: &[String], rng: &mut R) -> Option<&str> {
		let mut candidates: Vec<(&str, u64)> = self
			.completions
			.iter()
			.filter(|(field, occurrence)| **occurrence > 0 && self.relative_score(field) >= quality_floor)
			.map(|(field, occurrence)| (field.as_str(), *occurrence))
			.collect();

		if candidates.iter().any(|(field, _)| relevant.iter().any(|term| term.as_str() == *field)) {
			candidates.retain(|(field, _)| relevant.iter().any(|term| term.as_str() == *field));
		}

		let total: u64 = candidates.iter().map(|(_, occurrence)| occurrence).sum();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);
		for (field, occurrence) in candidates {
			if r < occurrence {
				return Some(field);
			}
			r -= occurrence;
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn distribution(rows: &[(&str, u64)]) -> Distribution {
		rows.iter().map(|(field, occurrence)| (field.to_string(), *occurrence)).collect::<BTreeMap<_, _>>().into()
	}

	#[test]
	fn empty_distribution() {
		let empty = Distribution::default();
		assert!(empty.is_empty());
		assert_eq!(empty.likelihood("a"), 0.0);
		assert_eq!(empty.relative_score("a"), 0.0);
		assert_eq!((empty.max(), empty.min()), (0, 0));
		assert!(empty.sample(0.0, &[], &mut StdRng::seed_from_u64(1)).is_none());
	}

	#[test]
	fn likelihood_and_relative_score() {
		let d = distribution(&[("a", 2), ("one", 1), ("two", 1)]);
		assert_eq!(d.total(), 4);
		assert_eq!(d.likelihood("a"), 0.5);
		assert_eq!(d.likelihood("missing"), 0.0);
		assert_eq!(d.relative_score("a"), 100.0);
		assert_eq!(d.relative_score("one"), 50.0);
		assert_eq!((d.max(), d.min()), (2, 1));
	}

	#[test]
	fn sampling_follows_frequencies() {
		let d = distribution(&[("common", 9), ("rare", 1)]);
		let mut rng = StdRng::seed_from_u64(7);
		let common = (0..2000).filter(|_| d.sample(0.0, &[], &mut rng) == Some("common")).count();
		assert!((1650..=1950).contains(&common), "common drawn {common} times");
	}

	#[test]
	fn quality_floor_excludes_weak_completions() {
		let d = distribution(&[("strong", 10), ("weak", 1)]);
		let mut rng = StdRng::seed_from_u64(3);
		for _ in 0..100 {
			assert_eq!(d.sample(50.0, &[], &mut rng), Some("strong"));
		}
		assert!(d.sample(101.0, &[], &mut rng).is_none());
	}

	#[test]
	fn relevant_terms_take_precedence_when_present() {
		let d = distribution(&[("pizza", 10), ("salad", 1)]);
		let mut rng = StdRng::seed_from_u64(11);
		let relevant = vec!["salad".to_owned()];
		for _ in 0..50 {
			assert_eq!(d.sample(0.0, &relevant, &mut rng), Some("salad"));
		}
		let unrelated = vec!["soup".to_owned()];
		assert!(d.sample(0.0, &unrelated, &mut rng).is_some());
	}
}
