//! Top-level module for the word n-gram model.
//!
//! This module provides:
//! - The transition graph and random-walk generator (`NgramGraph`)
//! - The state and successor token types (`State`, `Token`)
//! - Generation parameters (`GenerationInput`)

/// Word n-gram transition graph.
///
/// Handles sentence ingestion, starter/stopper tracking,
/// successor queries and random-walk generation.
pub mod ngram_graph;

/// States (n consecutive words) and successor tokens.
pub mod state;

/// Parameters for a random walk (length limit, novelty retries).
pub mod generation_input;

pub use generation_input::GenerationInput;
pub use ngram_graph::NgramGraph;
pub use state::{State, Token};
