//! Error type for the matcher pipeline.
//!
//! Every error here is fatal: the pipeline runs to completion or aborts,
//! with no retry or partial-result semantics.

use std::io;
use thiserror::Error;

/// Errors produced by the k-mer matcher pipeline.
#[derive(Debug, Error)]
pub enum KclustError {
    /// The main k-mer buffer could not be allocated.
    #[error("could not allocate k-mer buffer of {bytes} bytes")]
    Allocation {
        /// Requested allocation size in bytes.
        bytes: usize,
    },

    /// Invalid configuration rejected before the run starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Spill file or output I/O failure (open, map, write, merge).
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, KclustError>;
