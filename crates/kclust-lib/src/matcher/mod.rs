//! The k-mer matcher pipeline.
//!
//! Stages, in order: configuration ([`config`]), per-sequence window
//! selection ([`extract`]), partitioned record fill ([`fill`] into
//! [`buffer`]), sorting and representative assignment ([`assign`]),
//! spill and k-way merge for multi-partition runs ([`spill`], [`merge`]),
//! and result emission ([`emit`]). [`runner`] wires them together.

pub mod assign;
pub mod buffer;
pub mod config;
pub mod emit;
pub mod extract;
pub mod fill;
pub mod merge;
pub mod records;
pub mod runner;
pub mod spill;

pub use config::MatcherConfiguration;
pub use emit::EmitCounts;
pub use records::{CandidatePair, KmerRecord};
pub use runner::{run_matcher, MatchStatistics};
