use std::iter;

use super::token::{Completion, Token};
use crate::error::{ChainError, Result};

/// Separator between the prefix and each window slot in a key.
pub const SEPARATOR: char = ':';

/// Escapes `SEPARATOR` and itself inside key parts.
pub const ESCAPE: char = '\\';

/// Padding slot used before the first token of a sequence.
pub const START_MARK: &str = "\u{1}";

/// Field name of the Terminal completion.
pub const TERMINAL_MARK: &str = "\u{2}";

/// Returns the text of a token, validated for use in keys and fields.
///
/// # Errors
/// Returns `InvalidToken` if the text contains a reserved marker character.
pub fn token_text<T: Token>(token: &T) -> Result<String> {
	let text = token.to_string();
	if text.contains(START_MARK) || text.contains(TERMINAL_MARK) {
		return Err(ChainError::InvalidToken(format!(
			"{:?} contains a reserved marker character",
			text
		)));
	}
	Ok(text)
}

fn push_escaped(out: &mut String, part: &str) {
	for c in part.chars() {
		if c == SEPARATOR || c == ESCAPE {
			out.push(ESCAPE);
		}
		out.push(c);
	}
}

/// Encodes a prefix and a window into a store key.
///
/// Every part is escaped before joining, so the mapping is injective:
/// `("a", ["b:c", "d"])` → `a:b\:c:d`.
pub fn encode<P: AsRef<str>>(prefix: &str, window: &[P]) -> String {
	let mut key = String::with_capacity(prefix.len() + window.len() * 8);
	push_escaped(&mut key, prefix);
	for part in window {
		key.push(SEPARATOR);
		push_escaped(&mut key, part.as_ref());
	}
	key
}

/// Key prefix shared by every row of a chain, for `Store::keys`.
pub fn namespace(prefix: &str) -> String {
	let mut key = String::with_capacity(prefix.len() + 1);
	push_escaped(&mut key, prefix);
	key.push(SEPARATOR);
	key
}

/// Splits a key back into its prefix and window slots.
///
/// Returns `None` on a dangling escape or a key without any window slot.
pub(crate) fn decode(key: &str) -> Option<(String, Vec<String>)> {
	let mut parts = Vec::new();
	let mut current = String::new();
	let mut chars = key.chars();

	while let Some(c) = chars.next() {
		match c {
			ESCAPE => current.push(chars.next()?),
			SEPARATOR => parts.push(std::mem::take(&mut current)),
			_ => current.push(c),
		}
	}
	parts.push(current);

	if parts.len() < 2 {
		return None;
	}
	let prefix = parts.remove(0);
	Some((prefix, parts))
}

impl<T: Token> Completion<T> {
	/// Field name under which this completion is counted.
	pub fn field(&self) -> Result<String> {
		match self {
			Completion::Token(token) => token_text(token),
			Completion::Terminal => Ok(TERMINAL_MARK.to_owned()),
		}
	}

	/// Parses a stored field back into a completion.
	///
	/// # Errors
	/// Returns `Decode` if the field is not a valid `T`.
	pub fn parse(field: &str) -> Result<Self> {
		if field == TERMINAL_MARK {
			return Ok(Completion::Terminal);
		}
		field
			.parse::<T>()
			.map(Completion::Token)
			.map_err(|_| ChainError::Decode(format!("field {:?} is not a valid token", field)))
	}
}

/// Encodes a caller-supplied window of exactly `order` tokens.
///
/// # Errors
/// - `InvalidWindow` if the length does not match `order`
/// - `InvalidToken` if a token cannot be encoded
pub(crate) fn window_key<T: Token>(prefix: &str, window: &[T], order: usize) -> Result<String> {
	if window.len() != order {
		return Err(ChainError::InvalidWindow { expected: order, actual: window.len() });
	}
	let texts = window.iter().map(token_text).collect::<Result<Vec<_>>>()?;
	Ok(encode(prefix, &texts))
}

/// Builds the `order`-slot window that precedes the next token after `tokens`.
///
/// The last `order` token texts are kept and the front is padded with
/// `START_MARK` when fewer are available.
pub(crate) fn tail_window(texts: &[String], order: usize) -> Vec<String> {
	let tail = &texts[texts.len().saturating_sub(order)..];
	iter::repeat_n(START_MARK.to_owned(), order - tail.len())
		.chain(tail.iter().cloned())
		.collect()
}

/// Decomposes a sequence into `(key, field)` pairs, one per window.
///
/// The sequence is viewed as `[START; order] ++ tokens`; for every position
/// `i` in `0..=len` the window is the `order` slots before `i` and the
/// field is the token at `i`, or `TERMINAL_MARK` past the end. Every token
/// is validated before anything is returned.
pub(crate) fn transitions<T: Token>(prefix: &str, tokens: &[T], order: usize) -> Result<Vec<(String, String)>> {
	let texts = tokens.iter().map(token_text).collect::<Result<Vec<_>>>()?;

	let padded: Vec<&str> = iter::repeat_n(START_MARK, order)
		.chain(texts.iter().map(String::as_str))
		.collect();

	let mut pairs = Vec::with_capacity(texts.len() + 1);
	for i in 0..=texts.len() {
		let key = encode(prefix, &padded[i..i + order]);
		let field = texts.get(i).map_or(TERMINAL_MARK, String::as_str);
		pairs.push((key, field.to_owned()));
	}
	Ok(pairs)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(s: &str) -> Vec<String> {
		s.split_whitespace().map(str::to_owned).collect()
	}

	#[test]
	fn encode_joins_prefix_and_window() {
		assert_eq!(encode("test", &["foo", "bar"]), "test:foo:bar");
	}

	#[test]
	fn separator_inside_tokens_is_escaped() {
		let a = encode("p", &["a:b", "c"]);
		let b = encode("p", &["a", "b:c"]);
		assert_ne!(a, b);
		assert_eq!(a, "p:a\\:b:c");
		assert_eq!(encode("p", &["a\\", "b"]), "p:a\\\\:b");
	}

	#[test]
	fn decode_inverts_encode() {
		let window = ["x:y", "back\\slash", ""];
		let key = encode("name:space", &window);
		let (prefix, parts) = decode(&key).unwrap();
		assert_eq!(prefix, "name:space");
		assert_eq!(parts, window);
	}

	#[test]
	fn decode_rejects_dangling_escape() {
		assert!(decode("p:abc\\").is_none());
		assert!(decode("nowindow").is_none());
	}

	#[test]
	fn namespace_does_not_match_longer_prefixes() {
		let key = encode("food", &["i", "ate"]);
		assert!(key.starts_with(&namespace("food")));
		assert!(!key.starts_with(&namespace("foo")));
	}

	#[test]
	fn reserved_markers_are_rejected() {
		let err = token_text(&"bad\u{2}token".to_owned()).unwrap_err();
		assert!(matches!(err, ChainError::InvalidToken(_)));
		assert!(token_text(&"\u{1}".to_owned()).is_err());
	}

	#[test]
	fn transitions_pad_the_start_and_end_with_terminal() {
		let pairs = transitions("food", &words("i ate a pizza"), 2).unwrap();
		let s = START_MARK;
		assert_eq!(
			pairs,
			vec![
				(encode("food", &[s, s]), "i".to_owned()),
				(encode("food", &[s, "i"]), "ate".to_owned()),
				(encode("food", &["i", "ate"]), "a".to_owned()),
				(encode("food", &["ate", "a"]), "pizza".to_owned()),
				(encode("food", &["a", "pizza"]), TERMINAL_MARK.to_owned()),
			]
		);
	}

	#[test]
	fn short_sequence_still_forms_windows() {
		let pairs = transitions("p", &words("hello"), 3).unwrap();
		assert_eq!(pairs.len(), 2);
		assert_eq!(pairs[1].0, encode("p", &[START_MARK, START_MARK, "hello"]));
		assert_eq!(pairs[1].1, TERMINAL_MARK);
	}

	#[test]
	fn tail_window_pads_short_seeds() {
		assert_eq!(tail_window(&words("a"), 2), vec![START_MARK.to_owned(), "a".to_owned()]);
		assert_eq!(tail_window(&words("a b c"), 2), words("b c"));
		assert_eq!(tail_window(&[], 1), vec![START_MARK.to_owned()]);
	}

	#[test]
	fn completion_round_trips_through_its_field() {
		let terminal: Completion<String> = Completion::Terminal;
		assert_eq!(Completion::<String>::parse(&terminal.field().unwrap()).unwrap(), terminal);
		assert_eq!(Completion::<u32>::parse("42").unwrap(), Completion::Token(42));
		assert!(matches!(Completion::<u32>::parse("abc"), Err(ChainError::Decode(_))));
	}
}
