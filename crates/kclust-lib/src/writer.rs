//! Result output seam.
//!
//! The matcher emits exactly one entry per representative group and one
//! singleton entry per unclustered sequence, through a [`ResultWriter`].
//! Real deployments back this with a key-value result database writer;
//! [`FlatFileWriter`] is a plain-file implementation for the CLI and
//! [`MemoryResultWriter`] collects entries for tests.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Sink for per-sequence result entries, keyed by external sequence id.
pub trait ResultWriter {
    /// Write one complete entry. `data` holds one line per hit in the
    /// `key score diagonal` format produced by [`hit_line`].
    fn write_entry(&mut self, key: u32, data: &str) -> io::Result<()>;
}

/// Append one hit line to an entry body.
///
/// Fields are tab-separated: external key, score placeholder (always 0 at
/// the candidate stage), diagonal.
#[inline]
pub fn hit_line(buf: &mut String, key: u32, score: i32, diagonal: i16) {
    // Writing into a String cannot fail.
    let _ = writeln!(buf, "{}\t{}\t{}", key, score, diagonal);
}

/// Writes entries sequentially to a single flat file, each preceded by a
/// `#key` header line.
pub struct FlatFileWriter {
    out: BufWriter<File>,
    entries: usize,
}

impl FlatFileWriter {
    /// Create the output file, truncating any existing one.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::with_capacity(1024 * 1024, file),
            entries: 0,
        })
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Flush buffered output.
    pub fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl ResultWriter for FlatFileWriter {
    fn write_entry(&mut self, key: u32, data: &str) -> io::Result<()> {
        writeln!(self.out, "#{}", key)?;
        self.out.write_all(data.as_bytes())?;
        self.entries += 1;
        Ok(())
    }
}

/// Collects entries in memory; used by tests.
#[derive(Debug, Default)]
pub struct MemoryResultWriter {
    /// All written entries in write order.
    pub entries: Vec<(u32, String)>,
}

impl MemoryResultWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultWriter for MemoryResultWriter {
    fn write_entry(&mut self, key: u32, data: &str) -> io::Result<()> {
        self.entries.push((key, data.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hit_line_format() {
        let mut buf = String::new();
        hit_line(&mut buf, 42, 0, -7);
        assert_eq!(buf, "42\t0\t-7\n");
    }

    #[test]
    fn test_flat_file_writer() -> io::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("result");
        let mut writer = FlatFileWriter::create(&path)?;
        let mut body = String::new();
        hit_line(&mut body, 3, 0, 0);
        writer.write_entry(3, &body)?;
        writer.finish()?;
        assert_eq!(writer.entries(), 1);

        let content = std::fs::read_to_string(&path)?;
        assert_eq!(content, "#3\n3\t0\t0\n");
        Ok(())
    }

    #[test]
    fn test_memory_writer_collects() {
        let mut writer = MemoryResultWriter::new();
        writer.write_entry(1, "1\t0\t0\n").unwrap();
        writer.write_entry(2, "2\t0\t0\n").unwrap();
        assert_eq!(writer.entries.len(), 2);
        assert_eq!(writer.entries[0].0, 1);
    }
}
