use crate::error::BabbleError;

/// Parameters controlling a random walk.
///
/// The default value reproduces the plain walk: no length limit and no
/// novelty check.
///
/// # Fields
/// - `max_words`: optional safeguard against walks that never draw the stop
///   symbol. The walk ends once the output holds at least this many words;
///   the starter state is always emitted in full.
/// - `nb_try`: number of extra walks attempted while the result equals a
///   training sentence. The last attempt is returned when all of them
///   reproduce the corpus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationInput {
	max_words: Option<usize>,
	pub nb_try: usize,
}

impl GenerationInput {
	/// Creates an input with no length limit and no retries.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the configured length limit, if any.
	pub fn max_words(&self) -> Option<usize> {
		self.max_words
	}

	/// Sets the length limit.
	///
	/// # Errors
	/// Returns an error if `max_words` is 0.
	pub fn set_max_words(&mut self, max_words: Option<usize>) -> Result<(), BabbleError> {
		if max_words == Some(0) {
			return Err(BabbleError::InvalidParameter {
				param: "max_words",
				reason: "must be >= 1 when set".to_owned(),
			});
		}
		self.max_words = max_words;
		Ok(())
	}

	/// Builder form of [`set_max_words`](Self::set_max_words).
	pub fn with_max_words(mut self, max_words: usize) -> Result<Self, BabbleError> {
		self.set_max_words(Some(max_words))?;
		Ok(self)
	}

	pub fn with_nb_try(mut self, nb_try: usize) -> Self {
		self.nb_try = nb_try;
		self
	}

	/// True once `len` words reach the limit.
	pub(crate) fn is_full(&self, len: usize) -> bool {
		self.max_words.is_some_and(|max| len >= max)
	}
}
