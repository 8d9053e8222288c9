//! Result emission.
//!
//! Every merged group becomes one output entry keyed by the
//! representative's external key: a self-reference line followed by one
//! line per member that survives the coverage gate. A membership flag per
//! sequence records which ids have been written as representatives; the
//! final completeness pass gives every unflagged sequence a singleton
//! entry, so each input id appears in exactly one output entry.

use crate::coverage::can_be_covered;
use crate::matcher::config::MatcherConfiguration;
use crate::matcher::records::CandidatePair;
use crate::store::SequenceStore;
use crate::writer::{hit_line, ResultWriter};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Counts of what one matcher run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitCounts {
    /// Representative groups with at least one member.
    pub groups: usize,
    /// Member lines written across all groups.
    pub pairs: usize,
    /// Singleton entries from the completeness pass.
    pub singletons: usize,
}

/// Turns groups into writer entries and tracks representative membership.
pub struct ResultEmitter<'a, W: ResultWriter> {
    writer: &'a mut W,
    store: &'a dyn SequenceStore,
    cov_threshold: f32,
    cov_mode: crate::coverage::CoverageMode,
    is_representative: Vec<AtomicBool>,
    entry: String,
    counts: EmitCounts,
}

impl<'a, W: ResultWriter> ResultEmitter<'a, W> {
    /// Create an emitter over the whole corpus.
    pub fn new(
        writer: &'a mut W,
        store: &'a dyn SequenceStore,
        config: &MatcherConfiguration,
    ) -> Self {
        let mut is_representative = Vec::with_capacity(store.len());
        is_representative.resize_with(store.len(), AtomicBool::default);
        Self {
            writer,
            store,
            cov_threshold: config.cov_threshold,
            cov_mode: config.cov_mode,
            is_representative,
            entry: String::new(),
            counts: EmitCounts::default(),
        }
    }

    /// Write one group entry. Members failing the coverage gate are
    /// dropped silently; the group is written even if all of them fail.
    pub fn emit_group(&mut self, rep_id: u32, members: &[(u32, i16)]) -> io::Result<()> {
        let rep_key = self.store.external_key(rep_id);
        let rep_len = self.store.sequence_length(rep_id) as u32;

        self.entry.clear();
        hit_line(&mut self.entry, rep_key, 0, 0);
        for &(member_id, diagonal) in members {
            let member_len = self.store.sequence_length(member_id) as u32;
            if !can_be_covered(self.cov_threshold, self.cov_mode, rep_len, member_len) {
                continue;
            }
            hit_line(&mut self.entry, self.store.external_key(member_id), 0, diagonal);
            self.counts.pairs += 1;
        }
        self.writer.write_entry(rep_key, &self.entry)?;
        self.counts.groups += 1;

        let claimed = self.is_representative[rep_id as usize]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        debug_assert!(claimed, "sequence {} emitted twice as representative", rep_id);
        Ok(())
    }

    /// Emit groups straight from sorted in-memory pairs (single-partition
    /// path). Adjacent duplicate members collapse to their first diagonal.
    pub fn emit_pairs(&mut self, pairs: &[CandidatePair]) -> io::Result<()> {
        let mut members: Vec<(u32, i16)> = Vec::new();
        let mut i = 0;
        while i < pairs.len() {
            let rep_id = pairs[i].rep_id;
            members.clear();
            while i < pairs.len() && pairs[i].rep_id == rep_id {
                let pair = pairs[i];
                i += 1;
                if members.last().map(|&(id, _)| id) != Some(pair.member_id) {
                    members.push((pair.member_id, pair.diagonal));
                }
            }
            self.emit_group(rep_id, &members)?;
        }
        Ok(())
    }

    /// Completeness pass: a singleton entry for every sequence not yet
    /// written as a representative. Returns the final counts.
    pub fn finish(mut self) -> io::Result<EmitCounts> {
        for id in 0..self.store.len() as u32 {
            if self.is_representative[id as usize].load(Ordering::Acquire) {
                continue;
            }
            let key = self.store.external_key(id);
            self.entry.clear();
            hit_line(&mut self.entry, key, 0, 0);
            self.writer.write_entry(key, &self.entry)?;
            self.counts.singletons += 1;
        }
        Ok(self.counts)
    }
}
