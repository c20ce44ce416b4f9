//! Word n-gram text babbling library.
//!
//! This crate provides:
//! - A word-level n-gram transition graph learned from sentences
//! - Random-walk generation of new sentences from that graph
//! - Helpers to feed corpus files into a graph
//!
//! The graph never touches the filesystem; reading corpora is left to
//! the `io` module and to callers.

/// Core n-gram model and generation logic.
pub mod model;

/// Error type shared by the fallible entry points.
pub mod error;

/// Corpus reading and data directory helpers.
pub mod io;

pub use error::BabbleError;
pub use model::{GenerationInput, NgramGraph, State, Token};
