use crate::error::{ChainError, Result};

/// Strategy used to select the starting window when generating a sequence.
///
/// # Variants
/// - `Start`: no seed; the walk begins at the start-of-sequence window.
/// - `Custom(Vec<T>)`: use the provided tokens as the seed; the walk
///   continues from their last N tokens.
/// - `Random`: pick a random window already recorded in the chain.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StartSeed<T> {
	#[default]
	Start,
	Custom(Vec<T>),
	Random,
}

/// Input parameters for a generation.
///
/// # Invariants
/// - `quality_floor` is within `[0.0, 100.0]`
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions<T> {
	/// Maximum number of tokens generated beyond the seed.
	pub max_words: usize,

	pub start_seed: StartSeed<T>,

	/// Completions are preferred among these whenever one of them is available.
	pub relevant_terms: Vec<T>,

	/// Minimum relative score (0 = anything goes, 100 = most frequent only).
	quality_floor: f64,
}

impl<T> GenerateOptions<T> {
	/// Creates options with the given length bound and no seed.
	pub fn new(max_words: usize) -> Self {
		Self {
			max_words,
			start_seed: StartSeed::Start,
			relevant_terms: Vec::new(),
			quality_floor: 0.0,
		}
	}

	/// Sets the seed, builder style.
	pub fn with_seed(mut self, start_seed: StartSeed<T>) -> Self {
		self.start_seed = start_seed;
		self
	}

	/// Returns the current quality floor.
	pub fn quality_floor(&self) -> f64 {
		self.quality_floor
	}

	/// Sets the quality floor (0.0..=100.0).
	///
	/// # Errors
	/// Returns an error if the value is outside the valid range.
	pub fn set_quality_floor(&mut self, quality_floor: f64) -> Result<()> {
		if !(0.0..=100.0).contains(&quality_floor) {
			return Err(ChainError::InvalidConfig(format!(
				"quality_floor must be between 0.0 and 100.0, got {}",
				quality_floor
			)));
		}
		self.quality_floor = quality_floor;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quality_floor_is_validated() {
		let mut options: GenerateOptions<String> = GenerateOptions::new(10);
		assert!(options.set_quality_floor(120.0).is_err());
		assert!(options.set_quality_floor(-1.0).is_err());
		assert!(options.set_quality_floor(f64::NAN).is_err());
		options.set_quality_floor(40.0).unwrap();
		assert_eq!(options.quality_floor(), 40.0);
	}
}
