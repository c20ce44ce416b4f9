use std::collections::{HashMap, HashSet};

use log::trace;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::generation_input::GenerationInput;
use super::state::{State, Token, normalize};
use crate::error::BabbleError;

/// Word-level n-gram transition graph with its own random source.
///
/// Each state (n consecutive words) maps to the list of tokens that
/// followed it in the training text. The list keeps duplicates, so a
/// uniform draw from it reproduces the observed transition frequencies.
///
/// # Responsibilities
/// - Absorb sentences, one call per line of the corpus
/// - Track starter states (first state of each sentence) and stopper
///   states (states followed by the end of a sentence)
/// - Walk the graph from a random starter until the stop symbol is drawn
///
/// # Invariants
/// - `n` is always >= 1 and never changes
/// - Every starter and stopper is a key of `transitions`
/// - A state's successor list length equals its number of observations
/// - Only ingestion mutates the graph; it never removes anything
#[derive(Clone, Debug)]
pub struct NgramGraph {
	/// Number of words per state.
	n: usize,

	/// State -> observed successors, in observation order.
	transitions: HashMap<State, Vec<Token>>,

	/// First state of every sentence long enough to form one.
	starters: Vec<State>,

	/// States observed right before the end of a sentence.
	stoppers: Vec<State>,

	/// Normalized training sentences, used by the novelty retry.
	sentences: HashSet<String>,

	rng: StdRng,
}

impl NgramGraph {
	/// Creates an empty graph of order `n` seeded from the OS.
	///
	/// # Errors
	/// Returns an error if `n == 0`.
	pub fn new(n: usize) -> Result<Self, BabbleError> {
		Self::with_seed(n, None)
	}

	/// Creates an empty graph of order `n`.
	///
	/// With `Some(seed)` the random source is deterministic: the same
	/// training followed by the same calls yields the same text.
	///
	/// # Errors
	/// Returns an error if `n == 0`.
	pub fn with_seed(n: usize, seed: Option<u64>) -> Result<Self, BabbleError> {
		if n == 0 {
			return Err(BabbleError::InvalidOrder(n));
		}
		let rng = match seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		Ok(Self {
			n,
			transitions: HashMap::new(),
			starters: Vec::new(),
			stoppers: Vec::new(),
			sentences: HashSet::new(),
			rng,
		})
	}

	/// Number of words per state.
	pub fn order(&self) -> usize {
		self.n
	}

	/// Number of distinct states.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Adds one sentence to the graph.
	///
	/// The sentence is trimmed, lowercased and split on whitespace. A window
	/// of `n` words slides over it; each window records the word after it,
	/// or the stop symbol for the last window.
	///
	/// # Notes
	/// - Sentences shorter than `n` words are ignored.
	/// - Calls accumulate; nothing is ever removed.
	pub fn ingest_sentence(&mut self, sentence: &str) {
		let words = normalize(sentence);
		if words.len() < self.n {
			// Too short to form a single state
			return;
		}

		for i in 0..=words.len() - self.n {
			let window = &words[i..i + self.n];
			let successor = match words.get(i + self.n) {
				Some(word) => Token::Word(word.clone()),
				None => Token::Stop,
			};

			if i == 0 {
				self.starters.push(State::from_normalized(window));
			}
			if successor.is_stop() {
				self.stoppers.push(State::from_normalized(window));
			}

			match self.transitions.get_mut(window) {
				Some(successors) => successors.push(successor),
				None => {
					self.transitions.insert(State::from_normalized(window), vec![successor]);
				}
			}
		}

		trace!("ingested {} windows from {:?}", words.len() - self.n + 1, sentence);
		self.sentences.insert(words.join(" "));
	}

	/// Adds every line as a sentence and returns the number of lines seen.
	pub fn ingest_lines<I, S>(&mut self, lines: I) -> usize
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut count = 0;
		for line in lines {
			self.ingest_sentence(line.as_ref());
			count += 1;
		}
		count
	}

	/// First state of every ingested sentence, duplicates included.
	pub fn get_starters(&self) -> &[State] {
		&self.starters
	}

	/// States that ended a sentence, one entry per occurrence.
	pub fn get_stoppers(&self) -> &[State] {
		&self.stoppers
	}

	/// Observed successors of `state`; empty if the state is unknown.
	pub fn get_successors(&self, state: &State) -> &[Token] {
		self.successors_of(state.words())
	}

	fn successors_of(&self, window: &[String]) -> &[Token] {
		self.transitions.get(window).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Every known state, in no particular order.
	pub fn get_all_states(&self) -> Vec<&State> {
		self.transitions.keys().collect()
	}

	/// Iterates over `(state, successors)` pairs, in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = (&State, &[Token])> {
		self.transitions.iter().map(|(state, successors)| (state, successors.as_slice()))
	}

	/// True if `state` is known and has at least one successor.
	pub fn has_successor(&self, state: &State) -> bool {
		self.transitions
			.get(state)
			.is_some_and(|successors| !successors.is_empty())
	}

	/// Draws a successor of `state` using the graph's random source.
	///
	/// Each entry of the successor list is equally likely, so a token seen
	/// k times is k times more likely than one seen once.
	/// Returns `None` if the state has no successors.
	pub fn get_random_successor(&mut self, state: &State) -> Option<Token> {
		let successors = self.transitions.get(state)?;
		successors.choose(&mut self.rng).cloned()
	}

	/// Same draw as [`get_random_successor`](Self::get_random_successor)
	/// with a caller-provided random source. Does not touch the graph.
	pub fn random_successor_with<R: Rng + ?Sized>(&self, state: &State, rng: &mut R) -> Option<&Token> {
		self.get_successors(state).choose(rng)
	}

	/// True if `text`, once normalized, is one of the training sentences.
	pub fn is_training_sentence(&self, text: &str) -> bool {
		self.sentences.contains(&normalize(text).join(" "))
	}

	/// Generates one sentence by walking the graph.
	///
	/// Starts from a random starter and appends random successors until the
	/// stop symbol is drawn. Returns an empty string if nothing has been
	/// learned yet.
	///
	/// # Notes
	/// The walk is unbounded. A graph where a starter cannot reach a stopper
	/// would never return; use [`generate_from`](Self::generate_from) with a
	/// `max_words` limit when that matters.
	pub fn generate(&mut self) -> String {
		self.generate_from(&GenerationInput::default())
	}

	/// Generates one sentence with the graph's random source.
	pub fn generate_from(&mut self, input: &GenerationInput) -> String {
		// The walk only reads the graph, the random source is swapped back after.
		let mut rng = self.rng.clone();
		let text = self.generate_from_with(input, &mut rng);
		self.rng = rng;
		text
	}

	/// Generates one sentence with a caller-provided random source.
	///
	/// Takes `&self`, so any number of callers can generate from a graph
	/// that is no longer being trained, each with its own random source.
	pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
		self.generate_from_with(&GenerationInput::default(), rng)
	}

	/// Generates one sentence honoring `input`, with a caller-provided random source.
	///
	/// # Behavior
	/// - Walks the graph once, stopping early if `max_words` is reached.
	/// - While the result is a training sentence, walks again, at most
	///   `nb_try` more times. The last walk is returned either way.
	pub fn generate_from_with<R: Rng + ?Sized>(&self, input: &GenerationInput, rng: &mut R) -> String {
		let mut text = self.walk(input, rng);
		let mut nb_try = input.nb_try;

		while nb_try > 0 && self.sentences.contains(&text) {
			text = self.walk(input, rng);
			nb_try -= 1;
		}

		text
	}

	fn walk<R: Rng + ?Sized>(&self, input: &GenerationInput, rng: &mut R) -> String {
		let Some(starter) = self.starters.choose(rng) else {
			return String::new();
		};

		let mut words = starter.words().to_vec();
		while !input.is_full(words.len()) {
			// The current state is always the last n words
			let window = &words[words.len() - self.n..];
			match self.successors_of(window).choose(rng) {
				Some(Token::Word(word)) => words.push(word.clone()),
				Some(Token::Stop) | None => break,
			}
		}

		words.join(" ")
	}
}
