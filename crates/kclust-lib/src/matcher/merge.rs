//! K-way merge of partition spill files.
//!
//! Each file holds runs in ascending representative order. A binary heap
//! carries at most one queued entry per file; entries are ordered by
//! representative id, with member entries sorting before end-of-run
//! markers of the same representative. That ordering guarantees that by
//! the time a marker pops, every file's members for that representative
//! have drained, so the first marker completes the merged group and any
//! later marker for the same representative is a no-op.

use crate::error::Result;
use crate::matcher::spill::SplitReader;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io;
use std::path::PathBuf;

/// One queued element of a run. Derived ordering puts members before the
/// end-of-run marker, members by id then diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RunItem {
    Member { id: u32, diagonal: i16 },
    EndOfRun,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct QueuedEntry {
    rep_id: u32,
    item: RunItem,
    source: usize,
}

struct SourceState {
    reader: SplitReader,
    current_rep: u32,
}

/// Streaming merger over a set of spill files.
pub struct SplitMerger {
    sources: Vec<SourceState>,
    heap: BinaryHeap<Reverse<QueuedEntry>>,
}

impl SplitMerger {
    /// Open every partition file and queue the head of its first run.
    pub fn open(paths: &[PathBuf]) -> Result<Self> {
        let mut merger = Self {
            sources: Vec::with_capacity(paths.len()),
            heap: BinaryHeap::with_capacity(paths.len()),
        };
        for path in paths {
            let reader = SplitReader::open(path)?;
            merger.sources.push(SourceState {
                reader,
                current_rep: 0,
            });
            let source = merger.sources.len() - 1;
            merger.start_next_run(source);
        }
        Ok(merger)
    }

    /// Read a run header from `source` and queue the run's first element.
    /// Does nothing at end of file.
    fn start_next_run(&mut self, source: usize) {
        let state = &mut self.sources[source];
        if let Some(header) = state.reader.next_entry() {
            debug_assert!(!header.is_terminator());
            state.current_rep = header.seq_id;
            self.queue_next(source);
        }
    }

    /// Queue the next element of the current run of `source`.
    fn queue_next(&mut self, source: usize) {
        let state = &mut self.sources[source];
        if let Some(entry) = state.reader.next_entry() {
            let item = if entry.is_terminator() {
                RunItem::EndOfRun
            } else {
                RunItem::Member {
                    id: entry.seq_id,
                    diagonal: entry.diagonal,
                }
            };
            self.heap.push(Reverse(QueuedEntry {
                rep_id: state.current_rep,
                item,
                source,
            }));
        }
    }

    /// Drain all files, invoking `consume` once per merged group with the
    /// representative id and its deduplicated members in ascending id order.
    pub fn merge_groups<F>(mut self, mut consume: F) -> Result<()>
    where
        F: FnMut(u32, &[(u32, i16)]) -> io::Result<()>,
    {
        let mut open_rep: Option<u32> = None;
        let mut members: Vec<(u32, i16)> = Vec::new();

        while let Some(Reverse(entry)) = self.heap.pop() {
            match entry.item {
                RunItem::Member { id, diagonal } => {
                    if open_rep != Some(entry.rep_id) {
                        debug_assert!(open_rep.is_none());
                        open_rep = Some(entry.rep_id);
                        members.clear();
                    }
                    // Heap order makes cross-file duplicates adjacent.
                    if members.last().map(|&(last, _)| last) != Some(id) {
                        members.push((id, diagonal));
                    }
                    self.queue_next(entry.source);
                }
                RunItem::EndOfRun => {
                    if open_rep == Some(entry.rep_id) {
                        consume(entry.rep_id, &members)?;
                        open_rep = None;
                        members.clear();
                    }
                    self.start_next_run(entry.source);
                }
            }
        }
        debug_assert!(open_rep.is_none());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::records::CandidatePair;
    use crate::matcher::spill::{split_file_path, write_split_file};
    use tempfile::TempDir;

    fn pair(rep_id: u32, member_id: u32, diagonal: i16) -> CandidatePair {
        CandidatePair {
            rep_id,
            member_id,
            diagonal,
            member_len: 10,
        }
    }

    fn collect_groups(paths: &[PathBuf]) -> Vec<(u32, Vec<(u32, i16)>)> {
        let merger = SplitMerger::open(paths).unwrap();
        let mut groups = Vec::new();
        merger
            .merge_groups(|rep, members| {
                groups.push((rep, members.to_vec()));
                Ok(())
            })
            .unwrap();
        groups
    }

    #[test]
    fn test_single_file_passes_through() {
        let dir = TempDir::new().unwrap();
        let path = split_file_path(dir.path(), 0, 0);
        write_split_file(&path, &[pair(1, 3, 2), pair(1, 7, -1), pair(4, 2, 0)]).unwrap();

        let groups = collect_groups(&[path]);
        assert_eq!(
            groups,
            vec![(1, vec![(3, 2), (7, -1)]), (4, vec![(2, 0)])]
        );
    }

    #[test]
    fn test_groups_merge_across_files() {
        let dir = TempDir::new().unwrap();
        let a = split_file_path(dir.path(), 0, 0);
        let b = split_file_path(dir.path(), 0, 1);
        write_split_file(&a, &[pair(1, 3, 2), pair(8, 9, 0)]).unwrap();
        write_split_file(&b, &[pair(1, 2, 5), pair(5, 6, 1)]).unwrap();

        let groups = collect_groups(&[a, b]);
        assert_eq!(
            groups,
            vec![
                (1, vec![(2, 5), (3, 2)]),
                (5, vec![(6, 1)]),
                (8, vec![(9, 0)]),
            ]
        );
    }

    #[test]
    fn test_cross_file_duplicate_members_are_removed() {
        let dir = TempDir::new().unwrap();
        let a = split_file_path(dir.path(), 0, 0);
        let b = split_file_path(dir.path(), 0, 1);
        // Member 3 appears for representative 1 in both files; the entry
        // popping first wins.
        write_split_file(&a, &[pair(1, 3, 2)]).unwrap();
        write_split_file(&b, &[pair(1, 3, 6), pair(1, 4, 0)]).unwrap();

        let groups = collect_groups(&[a, b]);
        assert_eq!(groups.len(), 1);
        let (rep, members) = &groups[0];
        assert_eq!(*rep, 1);
        assert_eq!(members.iter().map(|&(id, _)| id).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn test_empty_files_are_tolerated() {
        let dir = TempDir::new().unwrap();
        let a = split_file_path(dir.path(), 0, 0);
        let b = split_file_path(dir.path(), 0, 1);
        write_split_file(&a, &[]).unwrap();
        write_split_file(&b, &[pair(2, 5, 0)]).unwrap();

        let groups = collect_groups(&[a, b]);
        assert_eq!(groups, vec![(2, vec![(5, 0)])]);
    }
}
