use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Splits raw text into normalized words.
///
/// Trims, lowercases and splits on any run of whitespace, so the
/// result never contains empty words.
pub(crate) fn normalize(text: &str) -> Vec<String> {
	text.trim()
		.to_lowercase()
		.split_whitespace()
		.map(str::to_owned)
		.collect()
}

/// A state of the transition graph: `n` consecutive lowercase words.
///
/// Equality and hashing are structural over the word list, so two states
/// built from differently spaced text compare equal once normalized.
/// A `State` borrows as `[String]`, which lets the graph be queried with a
/// window of an existing word buffer without allocating a new key.
///
/// Serialized as the words joined by single spaces.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(into = "String", from = "String")]
pub struct State(Vec<String>);

impl State {
	/// Builds a state from words that are already lowercase and trimmed.
	pub(crate) fn from_normalized(words: &[String]) -> Self {
		Self(words.to_vec())
	}

	/// Builds a state from arbitrary words, normalizing each one.
	///
	/// Words containing inner whitespace are split, so
	/// `["The dog"]` and `["the", "dog"]` give the same state.
	pub fn from_words<I, S>(words: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self(words.into_iter().flat_map(|w| normalize(w.as_ref())).collect())
	}

	/// Parses a state from text, applying the ingestion normalization.
	pub fn parse(text: &str) -> Self {
		Self(normalize(text))
	}

	/// The words of this state, in order.
	pub fn words(&self) -> &[String] {
		&self.0
	}

	/// Number of words in the state.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl Borrow<[String]> for State {
	fn borrow(&self) -> &[String] {
		&self.0
	}
}

impl fmt::Display for State {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.join(" "))
	}
}

impl From<&str> for State {
	fn from(text: &str) -> Self {
		Self::parse(text)
	}
}

impl From<String> for State {
	fn from(text: String) -> Self {
		Self::parse(&text)
	}
}

impl From<State> for String {
	fn from(state: State) -> Self {
		state.to_string()
	}
}

/// A successor recorded for a state.
///
/// `Stop` marks that the sentence ended right after the state. Being a
/// distinct variant, it can never be confused with a word of the corpus.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Token {
	Word(String),
	Stop,
}

impl Token {
	/// Returns the word carried by the token, `None` for `Stop`.
	pub fn as_word(&self) -> Option<&str> {
		match self {
			Token::Word(word) => Some(word),
			Token::Stop => None,
		}
	}

	pub fn is_stop(&self) -> bool {
		matches!(self, Token::Stop)
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::Word(word) => f.write_str(word),
			Token::Stop => f.write_str("<EOL>"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn parse_collapses_whitespace_and_case() {
		let state = State::parse("  The \t DOG  ");
		assert_eq!(state.words(), ["the", "dog"]);
		assert_eq!(state.to_string(), "the dog");
		assert_eq!(state, State::from_words(["the", "dog"]));
	}

	#[test]
	fn from_words_splits_inner_whitespace() {
		assert_eq!(State::from_words(["Runs Fast"]), State::parse("runs fast"));
		assert_eq!(State::from_words(["Runs Fast"]).len(), 2);
	}

	#[test]
	fn lookup_by_word_slice() {
		let mut map = HashMap::new();
		map.insert(State::parse("dog runs"), 1);

		let words = normalize("the dog runs fast");
		assert_eq!(map.get(&words[1..3]), Some(&1));
		assert_eq!(map.get(&words[0..2]), None);
	}

	#[test]
	fn stop_is_not_a_word() {
		assert!(Token::Stop.is_stop());
		assert_eq!(Token::Stop.as_word(), None);
		assert_ne!(Token::Word("<EOL>".to_owned()), Token::Stop);
		assert_eq!(Token::Word("runs".to_owned()).as_word(), Some("runs"));
	}
}
