use std::fmt::Display;
use std::str::FromStr;

/// Any value a chain can be built from.
///
/// `Display` produces the text stored in keys and fields; `FromStr` parses
/// completions back during generation. The two must round-trip.
pub trait Token: Display + FromStr + Clone {}

impl<T: Display + FromStr + Clone> Token for T {}

/// What follows a window: a concrete token or the end of the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T> {
	Token(T),
	Terminal,
}
