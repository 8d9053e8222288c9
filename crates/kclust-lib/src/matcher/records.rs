//! Record types flowing through the partition pipeline.
//!
//! A partition is processed in phases, each with its own typed buffer:
//! raw [`KmerRecord`]s from the fill phase, then compacted
//! [`CandidatePair`]s after representative assignment. Keeping the phases
//! in separate buffers trades a little memory for clear ownership instead
//! of reinterpreting one array in place.

use crate::constants::INVALID_KMER;
use std::cmp::Ordering;

/// One selected k-mer occurrence: grouping key, owning sequence, window
/// position and sequence length. Transient; lives only until its partition
/// is sorted and compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerRecord {
    /// Lexicographic k-mer index, or the whole-sequence self hash.
    pub kmer: u64,
    /// Internal sequence id.
    pub seq_id: u32,
    /// Window position within the sequence.
    pub pos: u32,
    /// Sequence length in residues.
    pub seq_len: u32,
}

impl KmerRecord {
    /// Unused-slot placeholder.
    pub const EMPTY: Self = Self {
        kmer: INVALID_KMER,
        seq_id: 0,
        pos: 0,
        seq_len: 0,
    };

    /// First-sort comparator: k-mer ascending, then sequence length
    /// descending, then id ascending, then position. Within an equal-k-mer
    /// run the longest (earliest-id on ties) sequence comes first and is
    /// chosen as representative.
    pub fn by_kmer_len_id(a: &Self, b: &Self) -> Ordering {
        a.kmer
            .cmp(&b.kmer)
            .then_with(|| b.seq_len.cmp(&a.seq_len))
            .then_with(|| a.seq_id.cmp(&b.seq_id))
            .then_with(|| a.pos.cmp(&b.pos))
    }
}

/// One candidate pair after representative assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePair {
    /// Sequence id of the group representative.
    pub rep_id: u32,
    /// Sequence id of the member.
    pub member_id: u32,
    /// Diagonal offset `rep_pos - member_pos`, stored 16-bit like the
    /// spill format; positions beyond i16 range wrap.
    pub diagonal: i16,
    /// Member sequence length, kept for the coverage gate.
    pub member_len: u32,
}

impl CandidatePair {
    /// Second-sort comparator: representative, then member, then diagonal.
    /// Groups all pairs of a representative contiguously and makes duplicate
    /// members adjacent for suppression at emission.
    pub fn by_rep_member_diag(a: &Self, b: &Self) -> Ordering {
        a.rep_id
            .cmp(&b.rep_id)
            .then_with(|| a.member_id.cmp(&b.member_id))
            .then_with(|| a.diagonal.cmp(&b.diagonal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(kmer: u64, seq_id: u32, pos: u32, seq_len: u32) -> KmerRecord {
        KmerRecord {
            kmer,
            seq_id,
            pos,
            seq_len,
        }
    }

    #[test]
    fn test_longest_sequence_sorts_first_within_run() {
        let mut records = vec![rec(5, 1, 0, 40), rec(5, 2, 3, 90), rec(3, 7, 1, 10)];
        records.sort_unstable_by(KmerRecord::by_kmer_len_id);
        assert_eq!(records[0].kmer, 3);
        // Within kmer 5, the longer sequence (id 2) comes first.
        assert_eq!(records[1].seq_id, 2);
        assert_eq!(records[2].seq_id, 1);
    }

    #[test]
    fn test_length_tie_broken_by_id() {
        let mut records = vec![rec(5, 9, 0, 50), rec(5, 2, 0, 50)];
        records.sort_unstable_by(KmerRecord::by_kmer_len_id);
        assert_eq!(records[0].seq_id, 2);
    }

    #[test]
    fn test_pair_sort_groups_by_representative() {
        let mut pairs = vec![
            CandidatePair { rep_id: 2, member_id: 5, diagonal: 1, member_len: 10 },
            CandidatePair { rep_id: 1, member_id: 9, diagonal: 0, member_len: 10 },
            CandidatePair { rep_id: 2, member_id: 3, diagonal: -4, member_len: 10 },
        ];
        pairs.sort_unstable_by(CandidatePair::by_rep_member_diag);
        assert_eq!(pairs[0].rep_id, 1);
        assert_eq!(pairs[1].member_id, 3);
        assert_eq!(pairs[2].member_id, 5);
    }
}
