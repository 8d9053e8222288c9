//! Partition sorting and representative assignment.
//!
//! After the fill phase a partition is a flat record array. Sorting it by
//! grouping key makes each shared k-mer a contiguous run; the run's first
//! record (longest sequence, smallest id on ties) becomes the group
//! representative and every other record becomes a candidate pair against
//! it. Runs of size one carry no pairing signal and are dropped here; the
//! completeness pass restores those sequences as singletons at emission.

use crate::matcher::config::MatcherConfiguration;
use crate::matcher::records::{CandidatePair, KmerRecord};
use rayon::prelude::*;

/// First sort pass: group records by k-mer, longest sequence first.
/// The comparator is a total order, so the unstable sort is deterministic.
pub fn sort_records(records: &mut [KmerRecord]) {
    records.par_sort_unstable_by(KmerRecord::by_kmer_len_id);
}

/// Walk sorted records and compact equal-k-mer runs into candidate pairs.
///
/// The representative contributes no pair for itself; a sequence hitting
/// the same k-mer group at several positions pairs once per position and
/// is deduplicated downstream. With `include_only_extendable` set, a member
/// survives only if its diagonal lets it extend past the representative's
/// bounds.
pub fn assign_representatives(
    records: &[KmerRecord],
    config: &MatcherConfiguration,
) -> Vec<CandidatePair> {
    let mut pairs = Vec::new();
    let mut run_start = 0;
    while run_start < records.len() {
        let kmer = records[run_start].kmer;
        let mut run_end = run_start + 1;
        while run_end < records.len() && records[run_end].kmer == kmer {
            run_end += 1;
        }
        if run_end - run_start >= 2 {
            let rep = &records[run_start];
            for member in &records[run_start + 1..run_end] {
                if member.seq_id == rep.seq_id {
                    continue;
                }
                let diagonal = i64::from(rep.pos) - i64::from(member.pos);
                if config.include_only_extendable {
                    let overhang = i64::from(rep.seq_len) - i64::from(member.seq_len);
                    if !(diagonal < 0 || diagonal > overhang) {
                        continue;
                    }
                }
                pairs.push(CandidatePair {
                    rep_id: rep.seq_id,
                    member_id: member.seq_id,
                    diagonal: diagonal as i16,
                    member_len: member.seq_len,
                });
            }
        }
        run_start = run_end;
    }
    pairs
}

/// Second sort pass: group pairs by representative, duplicate members
/// adjacent.
pub fn sort_pairs(pairs: &mut [CandidatePair]) {
    pairs.par_sort_unstable_by(CandidatePair::by_rep_member_diag);
}
