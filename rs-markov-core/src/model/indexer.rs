use std::path::Path;
use std::sync::mpsc;
use std::thread;

use super::codec;
use super::engine::MarkovEngine;
use super::token::Token;
use crate::error::Result;
use crate::io::{read_file, tokenize};
use crate::store::Store;

impl<S: Store> MarkovEngine<S> {
	/// Adds a token sequence to a chain.
	///
	/// Breaks the sequence into windows of `order` tokens (padded at the
	/// start) and increments the counter of the completion that follows each
	/// window, ending with a Terminal completion.
	///
	/// # Notes
	/// - An empty sequence is a no-op.
	/// - Not idempotent: indexing the same sequence twice doubles its counts.
	/// - Every token is validated before the first write.
	///
	/// # Errors
	/// - `InvalidToken` if a token cannot be encoded (nothing is written)
	/// - `StoreUnavailable` if the store fails; earlier increments of this
	///   call are kept
	pub fn add_sequence<T: Token>(&self, tokens: &[T], prefix: &str) -> Result<()> {
		if tokens.is_empty() {
			return Ok(());
		}

		let transitions = codec::transitions(prefix, tokens, self.config.order)?;
		for (key, field) in &transitions {
			self.store.increment(key, field, 1)?;
		}

		tracing::trace!(prefix, windows = transitions.len(), "sequence indexed");
		Ok(())
	}

	/// Adds every sequence of an iterator, in order.
	///
	/// Returns the number of non-empty sequences indexed. Stops at the first error.
	pub fn add_sequences<T, I>(&self, sequences: I, prefix: &str) -> Result<usize>
	where
		T: Token,
		I: IntoIterator,
		I::Item: AsRef<[T]>,
	{
		let mut count = 0;
		for sequence in sequences {
			let tokens = sequence.as_ref();
			if tokens.is_empty() {
				continue;
			}
			self.add_sequence(tokens, prefix)?;
			count += 1;
		}
		Ok(count)
	}
}

impl<S: Store + Sync> MarkovEngine<S> {
	/// Tokenizes text lines on whitespace and indexes them in parallel.
	///
	/// # Behavior
	/// - Splits the lines into chunks (based on CPU cores * factor).
	/// - Each worker thread indexes its chunk straight into the store.
	/// - Blank lines are skipped.
	///
	/// # Notes
	/// - Relies on the store's atomic increment; no merging step is needed.
	/// - All workers are joined before returning, even on error.
	///
	/// # Returns
	/// The number of sequences indexed, or the first error reported by a worker.
	pub fn index_lines<L: AsRef<str> + Sync>(&self, lines: &[L], prefix: &str) -> Result<usize> {
		if lines.is_empty() {
			return Ok(0);
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = lines.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for chunk in lines.chunks(chunk_size) {
				let tx = tx.clone();
				scope.spawn(move || {
					let sequences = chunk.iter().map(|line| tokenize(line.as_ref()));
					// The receiver outlives the scope
					let _ = tx.send(self.add_sequences::<String, _>(sequences, prefix));
				});
			}
		});
		drop(tx);

		let mut indexed = 0;
		for partial in rx.iter() {
			indexed += partial?;
		}

		tracing::debug!(prefix, indexed, "lines indexed");
		Ok(indexed)
	}

	/// Reads a text file and indexes each line as one sequence.
	///
	/// # Errors
	/// Returns `Io` if the file cannot be read, or any indexing error.
	pub fn index_file<P: AsRef<Path>>(&self, path: P, prefix: &str) -> Result<usize> {
		let lines = read_file(&path)?;
		tracing::info!(prefix, path = %path.as_ref().display(), lines = lines.len(), "indexing file");
		self.index_lines(&lines, prefix)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ChainConfig;
	use crate::error::ChainError;
	use crate::model::codec::{START_MARK, TERMINAL_MARK, encode};
	use crate::store::memory::MemoryStore;

	fn words(s: &str) -> Vec<String> {
		s.split_whitespace().map(str::to_owned).collect()
	}

	fn count(engine: &MarkovEngine<MemoryStore>, window: &[&str], field: &str) -> u64 {
		let row = engine.store().get_all(&encode("test", window)).unwrap();
		row.get(field).copied().unwrap_or(0)
	}

	#[test]
	fn adding_lines_behaves_as_expected() {
		let engine = MarkovEngine::with_defaults(MemoryStore::new());

		engine.add_sequence(&words("i ate a peach"), "test").unwrap();
		assert_eq!(count(&engine, &["i", "ate"], "a"), 1);
		assert_eq!(count(&engine, &["ate", "a"], "peach"), 1);
		assert_eq!(count(&engine, &["a", "peach"], TERMINAL_MARK), 1);
		assert_eq!(count(&engine, &[START_MARK, START_MARK], "i"), 1);

		engine.add_sequence(&words("i ate one peach"), "test").unwrap();
		assert_eq!(count(&engine, &["i", "ate"], "a"), 1);
		assert_eq!(count(&engine, &["ate", "one"], "peach"), 1);
		assert_eq!(count(&engine, &["i", "ate"], "one"), 1);

		engine.add_sequence(&words("i ate a sandwich"), "test").unwrap();
		assert_eq!(count(&engine, &["i", "ate"], "a"), 2);
		assert_eq!(count(&engine, &["ate", "a"], "sandwich"), 1);
	}

	#[test]
	fn empty_sequence_writes_nothing() {
		let engine = MarkovEngine::with_defaults(MemoryStore::new());
		engine.add_sequence::<String>(&[], "test").unwrap();
		assert!(engine.store().keys("").unwrap().is_empty());
	}

	#[test]
	fn invalid_token_leaves_store_untouched() {
		let engine = MarkovEngine::with_defaults(MemoryStore::new());
		let err = engine.add_sequence(&words("fine fine bad\u{2}"), "test").unwrap_err();
		assert!(matches!(err, ChainError::InvalidToken(_)));
		assert!(engine.store().keys("").unwrap().is_empty());
	}

	#[test]
	fn order_three_windows() {
		let engine = MarkovEngine::new(MemoryStore::new(), ChainConfig::with_order(3)).unwrap();
		engine.add_sequence(&words("i ate a peach"), "test").unwrap();
		assert_eq!(count(&engine, &["i", "ate", "a"], "peach"), 1);
		assert_eq!(count(&engine, &["ate", "a", "peach"], TERMINAL_MARK), 1);
	}

	#[test]
	fn add_sequences_skips_empty_entries() {
		let engine = MarkovEngine::with_defaults(MemoryStore::new());
		let sequences = vec![words("a b"), vec![], words("a c")];
		assert_eq!(engine.add_sequences::<String, _>(&sequences, "test").unwrap(), 2);
		assert_eq!(count(&engine, &[START_MARK, START_MARK], "a"), 2);
	}

	#[test]
	fn parallel_indexing_counts_every_line() {
		let engine = MarkovEngine::with_defaults(MemoryStore::new());
		let lines: Vec<String> = (0..500).map(|i| format!("i ate {}", i % 5)).chain(["   ".to_owned()]).collect();
		assert_eq!(engine.index_lines(&lines, "test").unwrap(), 500);
		assert_eq!(count(&engine, &["i", "ate"], "3"), 100);
		assert_eq!(count(&engine, &[START_MARK, START_MARK], "i"), 500);
	}
}
