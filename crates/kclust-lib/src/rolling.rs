//! Position-independent circular rolling hash over residue codes.
//!
//! Each residue contributes a fixed 16-bit pseudo-random constant, XORed
//! into an accumulator that is circularly rotated by a tunable shift
//! between residues. The hash of window `i+1` can be derived from the hash
//! of window `i` by undoing the oldest residue's contribution, rotating
//! once, and XORing in the new residue ([`circ_hash_next`]) — no rescan.
//!
//! The hash value is used only to rank k-mer windows for top-N selection;
//! the grouping key of a window is its lexicographic index, not this hash.

use crate::constants::RESIDUE_HASH;

/// Hash a full window of residue codes from scratch.
///
/// `shift` is the per-residue rotation, in bits (1..=15).
#[inline]
pub fn circ_hash(window: &[u8], shift: u32) -> u16 {
    debug_assert!(!window.is_empty());
    let mut h = RESIDUE_HASH[window[0] as usize];
    for &x in &window[1..] {
        h = h.rotate_left(shift) ^ RESIDUE_HASH[x as usize];
    }
    h
}

/// Derive the hash of `window` from the previous window's hash.
///
/// `first_of_prev` is the residue that slid out of the window (the previous
/// window's first residue) and `prev` its hash. Equivalent to
/// `circ_hash(window, shift)` for overlapping windows of equal length.
#[inline]
pub fn circ_hash_next(window: &[u8], first_of_prev: u8, prev: u16, shift: u32) -> u16 {
    let k = window.len() as u32;
    // Undo the contribution of the residue that slid out.
    let mut h = prev ^ RESIDUE_HASH[first_of_prev as usize].rotate_left(shift * (k - 1));
    // Rotate the surviving residues one step and add the new last residue.
    h = h.rotate_left(shift);
    h ^ RESIDUE_HASH[window[window.len() - 1] as usize]
}
