use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the fallible edges of the crate.
///
/// The graph itself never fails on data conditions (short sentences,
/// unknown states, empty models). Only construction parameters,
/// generation parameters and corpus reading can go wrong.
#[derive(Debug, Error)]
pub enum BabbleError {
	/// The model order must be at least 1.
	#[error("n must be >= 1, got {0}")]
	InvalidOrder(usize),

	/// A generation parameter was rejected.
	#[error("invalid parameter `{param}`: {reason}")]
	InvalidParameter {
		param: &'static str,
		reason: String,
	},

	/// A corpus file could not be read.
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}
