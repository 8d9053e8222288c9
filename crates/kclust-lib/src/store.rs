//! Sequence store and masking seams.
//!
//! The matcher core never owns the corpus; it consults a random-access
//! [`SequenceStore`] for integer-coded residues, lengths and external keys.
//! Real deployments back this with an on-disk key-value sequence database;
//! [`MemorySequenceStore`] is the in-memory implementation used by the CLI
//! and by tests.

use crate::alphabet::Alphabet;

/// Random-access source of integer-coded sequences.
pub trait SequenceStore: Sync {
    /// Number of sequences in the corpus.
    fn len(&self) -> usize;

    /// True if the corpus is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integer-coded residues of a sequence.
    fn residues(&self, id: u32) -> &[u8];

    /// Length of a sequence in residues.
    fn sequence_length(&self, id: u32) -> usize {
        self.residues(id).len()
    }

    /// External identifier of a sequence, used as the output key.
    fn external_key(&self, id: u32) -> u32;

    /// Streaming reload hook, invoked between corpus blocks while no worker
    /// is reading. Stores that map data lazily refresh their mapping here.
    fn remap(&mut self) {}
}

/// Low-complexity masking seam, applied to a residue buffer before window
/// extraction when enabled. Implementations replace masked residues with
/// the alphabet's unknown code; the matcher core supplies no algorithm.
pub trait Masker: Sync {
    /// Mask low-complexity regions of `residues` in place.
    fn mask_residues(&self, residues: &mut [u8]);
}

/// In-memory sequence store.
#[derive(Debug, Default)]
pub struct MemorySequenceStore {
    sequences: Vec<Vec<u8>>,
    keys: Vec<u32>,
}

impl MemorySequenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-coded sequence under an external key.
    pub fn push(&mut self, key: u32, residues: Vec<u8>) {
        self.keys.push(key);
        self.sequences.push(residues);
    }

    /// Encode an ASCII sequence with `alphabet` and append it.
    pub fn push_ascii(&mut self, key: u32, alphabet: &Alphabet, seq: &[u8]) {
        self.push(key, alphabet.encode(seq));
    }
}

impl SequenceStore for MemorySequenceStore {
    fn len(&self) -> usize {
        self.sequences.len()
    }

    fn residues(&self, id: u32) -> &[u8] {
        &self.sequences[id as usize]
    }

    fn external_key(&self, id: u32) -> u32 {
        self.keys[id as usize]
    }
}
