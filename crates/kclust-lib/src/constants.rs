//! Constants shared across the matcher pipeline.

/// Sentinel k-mer value marking an unused buffer slot.
pub const INVALID_KMER: u64 = u64::MAX;

/// Sentinel sequence id terminating a representative run in a spill file.
pub const RUN_TERMINATOR: u32 = u32::MAX;

/// Default seed for the whole-sequence hash.
pub const DEFAULT_SEED: u64 = 1;

/// Fixed 16-bit per-residue constants for the circular rolling hash.
/// One entry per residue code; the largest supported alphabet has 21 symbols.
pub const RESIDUE_HASH: [u16; 21] = [
    0x4567, 0x23c6, 0x9869, 0x4873, 0xdc51, 0x5cff, 0x944a, 0x58ec, 0x1f29, 0x7ccd, 0x58ba,
    0xd7ab, 0x41f2, 0x1efb, 0xa9e3, 0xe146, 0x007c, 0x62c2, 0x0854, 0x27f8, 0x231b,
];

/// Maximum alphabet size (bounded by the residue hash table).
pub const MAX_ALPHABET_SIZE: usize = RESIDUE_HASH.len();

/// Number of sequences processed between corpus remap barriers.
pub const FLUSH_BLOCK: usize = 100_000_000;

/// Sequences handed to a fill worker per dynamic scheduling step.
pub const FILL_CHUNK: usize = 100;

/// Records buffered locally by each fill worker before one atomic
/// reservation in the shared k-mer buffer.
pub const LOCAL_BATCH: usize = 1024;

/// Capacity safety margin per partition when splitting, to absorb
/// hash-distribution skew (20%).
pub const SPLIT_SAFETY_FACTOR: f64 = 1.2;

/// Fraction of total system memory used when no explicit budget is given.
pub const DEFAULT_MEMORY_FRACTION: f64 = 0.9;

/// Fallback memory budget (8 GiB) when system memory cannot be determined.
pub const FALLBACK_MEMORY_LIMIT: usize = 8 * 1024 * 1024 * 1024;

/// Version number
pub const VERSION: (u8, u8, u8) = (0, 1, 0);
