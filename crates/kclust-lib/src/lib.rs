#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod alphabet;
pub mod constants;
pub mod coverage;
pub mod error;
pub mod hasher;
pub mod matcher;
pub mod rolling;
pub mod store;
pub mod writer;

pub use alphabet::Alphabet;
pub use coverage::CoverageMode;
pub use error::{KclustError, Result};
pub use matcher::{run_matcher, MatchStatistics, MatcherConfiguration};
pub use store::{Masker, MemorySequenceStore, SequenceStore};
pub use writer::{FlatFileWriter, MemoryResultWriter, ResultWriter};
