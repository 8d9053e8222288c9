//! Residue coding for integer-coded sequences.
//!
//! Sequences are processed as small integer codes in `0..alphabet_size`.
//! The unknown/any symbol (`X` for amino acids, `N` for nucleotides) is
//! always the last code, `alphabet_size - 1`; k-mer windows containing it
//! are skipped during extraction.

use crate::constants::MAX_ALPHABET_SIZE;

/// Maps ASCII residues to integer codes and back.
#[derive(Debug, Clone)]
pub struct Alphabet {
    size: usize,
    to_code: [u8; 256],
    to_char: Vec<u8>,
}

impl Alphabet {
    /// Build an alphabet from an ordered residue list.
    ///
    /// The last residue is the unknown/any symbol; every ASCII byte not in
    /// the list maps to it. Both cases of each residue are accepted.
    ///
    /// # Panics
    /// Panics if the list is empty or larger than the residue hash table.
    pub fn new(residues: &[u8]) -> Self {
        assert!(
            !residues.is_empty() && residues.len() <= MAX_ALPHABET_SIZE,
            "alphabet must have 1..={} residues",
            MAX_ALPHABET_SIZE
        );
        let unknown = (residues.len() - 1) as u8;
        let mut to_code = [unknown; 256];
        for (code, &c) in residues.iter().enumerate() {
            to_code[c.to_ascii_uppercase() as usize] = code as u8;
            to_code[c.to_ascii_lowercase() as usize] = code as u8;
        }
        Self {
            size: residues.len(),
            to_code,
            to_char: residues.to_vec(),
        }
    }

    /// The 21-letter amino acid alphabet, `X` as unknown.
    pub fn amino_acid() -> Self {
        Self::new(b"ARNDCQEGHILKMFPSTWYVX")
    }

    /// The 5-letter nucleotide alphabet, `N` as unknown.
    pub fn nucleotide() -> Self {
        Self::new(b"ACGTN")
    }

    /// Number of residue codes, including the unknown symbol.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Code of the unknown/any symbol (always the last code).
    pub fn unknown_code(&self) -> u8 {
        (self.size - 1) as u8
    }

    /// Code for a single ASCII residue.
    #[inline]
    pub fn code_of(&self, c: u8) -> u8 {
        self.to_code[c as usize]
    }

    /// ASCII residue for a code.
    pub fn char_of(&self, code: u8) -> u8 {
        self.to_char[code as usize]
    }

    /// Encode an ASCII sequence into residue codes.
    pub fn encode(&self, seq: &[u8]) -> Vec<u8> {
        seq.iter().map(|&c| self.code_of(c)).collect()
    }
}
