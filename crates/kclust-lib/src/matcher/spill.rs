//! Partition spill files.
//!
//! When the corpus is processed in more than one partition, each
//! partition's sorted candidate pairs are written to a temporary file and
//! merged afterwards. The on-disk unit is a run per representative group:
//! a header entry carrying the representative id, one entry per member,
//! and a terminator entry with the reserved id. Runs appear in ascending
//! representative order because the pairs are written pre-sorted.

use crate::constants::RUN_TERMINATOR;
use crate::error::Result;
use crate::matcher::records::CandidatePair;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// On-disk spill entry. Packed to 6 bytes; spill files are a plain array
/// of these.
#[repr(C, packed(2))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpillEntry {
    /// Sequence id, or [`RUN_TERMINATOR`] to close a run.
    pub seq_id: u32,
    /// Diagonal offset; zero for headers and terminators.
    pub diagonal: i16,
}

/// Size of one entry on disk.
pub const SPILL_ENTRY_BYTES: usize = std::mem::size_of::<SpillEntry>();

impl SpillEntry {
    /// The run-closing entry.
    pub const TERMINATOR: Self = Self {
        seq_id: RUN_TERMINATOR,
        diagonal: 0,
    };

    /// True for the run-closing entry.
    pub fn is_terminator(self) -> bool {
        let id = self.seq_id;
        id == RUN_TERMINATOR
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), SPILL_ENTRY_BYTES);
        // SAFETY: the slice holds SPILL_ENTRY_BYTES bytes and the type is
        // repr(C, packed(2)), so an unaligned read reconstructs the entry.
        unsafe { (bytes.as_ptr() as *const SpillEntry).read_unaligned() }
    }

    fn to_bytes(self) -> [u8; SPILL_ENTRY_BYTES] {
        let mut out = [0u8; SPILL_ENTRY_BYTES];
        // SAFETY: out is exactly SPILL_ENTRY_BYTES bytes.
        unsafe { (out.as_mut_ptr() as *mut SpillEntry).write_unaligned(self) };
        out
    }
}

/// Spill file path for one partition of one run.
pub fn split_file_path(tmp_dir: &Path, run_id: u64, split: usize) -> PathBuf {
    tmp_dir.join(format!("kclust.tmp.run_{}.split_{}.bin", run_id, split))
}

/// Write one partition's sorted pairs as runs.
///
/// Adjacent duplicate members within a group are suppressed here, so the
/// merge only has to deduplicate across files. The file is written once
/// and never mutated.
pub fn write_split_file(path: &Path, pairs: &[CandidatePair]) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::with_capacity(1024 * 1024, file);

    let mut i = 0;
    while i < pairs.len() {
        let rep_id = pairs[i].rep_id;
        out.write_all(
            &SpillEntry {
                seq_id: rep_id,
                diagonal: 0,
            }
            .to_bytes(),
        )?;
        let mut last_member = None;
        while i < pairs.len() && pairs[i].rep_id == rep_id {
            let pair = pairs[i];
            i += 1;
            if last_member == Some(pair.member_id) {
                continue;
            }
            last_member = Some(pair.member_id);
            out.write_all(
                &SpillEntry {
                    seq_id: pair.member_id,
                    diagonal: pair.diagonal,
                }
                .to_bytes(),
            )?;
        }
        out.write_all(&SpillEntry::TERMINATOR.to_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// Sequential reader over a memory-mapped spill file.
pub struct SplitReader {
    // None for zero-length files, which cannot be mapped.
    mmap: Option<Mmap>,
    offset: usize,
}

impl SplitReader {
    /// Open and map a spill file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self {
                mmap: None,
                offset: 0,
            });
        }
        // SAFETY: the file is written once by this process and never
        // mutated afterwards.
        let mmap = unsafe { Mmap::map(&file)? };
        if mmap.len() % SPILL_ENTRY_BYTES != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("truncated spill file: {}", path.display()),
            )
            .into());
        }
        Ok(Self {
            mmap: Some(mmap),
            offset: 0,
        })
    }

    /// Next entry, or `None` at end of file.
    pub fn next_entry(&mut self) -> Option<SpillEntry> {
        let mmap = self.mmap.as_ref()?;
        if self.offset >= mmap.len() {
            return None;
        }
        let entry = SpillEntry::from_bytes(&mmap[self.offset..self.offset + SPILL_ENTRY_BYTES]);
        self.offset += SPILL_ENTRY_BYTES;
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pair(rep_id: u32, member_id: u32, diagonal: i16) -> CandidatePair {
        CandidatePair {
            rep_id,
            member_id,
            diagonal,
            member_len: 10,
        }
    }

    #[test]
    fn test_entry_is_six_bytes() {
        assert_eq!(SPILL_ENTRY_BYTES, 6);
    }

    #[test]
    fn test_run_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = split_file_path(dir.path(), 1, 0);
        let pairs = vec![pair(1, 4, -3), pair(1, 9, 2), pair(5, 2, 0)];
        write_split_file(&path, &pairs)?;

        let mut reader = SplitReader::open(&path)?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry() {
            entries.push((entry.seq_id, entry.diagonal, entry.is_terminator()));
        }
        assert_eq!(
            entries,
            vec![
                (1, 0, false),
                (4, -3, false),
                (9, 2, false),
                (RUN_TERMINATOR, 0, true),
                (5, 0, false),
                (2, 0, false),
                (RUN_TERMINATOR, 0, true),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_adjacent_duplicate_members_are_suppressed() -> Result<()> {
        let dir = TempDir::new()?;
        let path = split_file_path(dir.path(), 1, 0);
        // Same member at two diagonals: only the first entry survives.
        let pairs = vec![pair(1, 4, 2), pair(1, 4, 7), pair(1, 9, 0)];
        write_split_file(&path, &pairs)?;

        let mut reader = SplitReader::open(&path)?;
        let mut member_ids = Vec::new();
        while let Some(entry) = reader.next_entry() {
            if !entry.is_terminator() {
                member_ids.push(entry.seq_id);
            }
        }
        assert_eq!(member_ids, vec![1, 4, 9]);
        Ok(())
    }

    #[test]
    fn test_empty_pair_list_writes_empty_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = split_file_path(dir.path(), 2, 3);
        write_split_file(&path, &[])?;
        let mut reader = SplitReader::open(&path)?;
        assert!(reader.next_entry().is_none());
        Ok(())
    }
}
