//! Shared k-mer record arena.
//!
//! One pre-sized contiguous buffer per partition, filled concurrently by
//! the worker pool. Workers batch records locally and reserve a range with
//! a single atomic bump per batch; ranges from distinct reservations are
//! disjoint, so no lock is needed. The whole buffer is owned by the
//! orchestrating function for the duration of one partition's processing.

use crate::error::{KclustError, Result};
use crate::matcher::records::KmerRecord;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity record buffer with an atomic bump cursor.
pub struct KmerBuffer {
    slots: UnsafeCell<Box<[KmerRecord]>>,
    capacity: usize,
    cursor: AtomicUsize,
}

// SAFETY: concurrent `push_batch` calls write disjoint ranges reserved
// through the atomic cursor; the buffer contents are only read after all
// producers have finished (via `&mut self` or `into_records`).
unsafe impl Sync for KmerBuffer {}

impl KmerBuffer {
    /// Allocate a buffer for `capacity` records.
    ///
    /// Allocation failure is reported as [`KclustError::Allocation`] with
    /// the requested byte size; the run aborts.
    pub fn new(capacity: usize) -> Result<Self> {
        let bytes = capacity * std::mem::size_of::<KmerRecord>();
        let mut slots: Vec<KmerRecord> = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| KclustError::Allocation { bytes })?;
        slots.resize(capacity, KmerRecord::EMPTY);
        Ok(Self {
            slots: UnsafeCell::new(slots.into_boxed_slice()),
            capacity,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.cursor.load(Ordering::Acquire).min(self.capacity)
    }

    /// True if no record has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve a range and copy `batch` into it.
    ///
    /// # Panics
    /// Panics if the reservation exceeds capacity: the counting pre-pass
    /// plus the split safety margin size the buffer, so an overflow means
    /// the partition estimate was violated.
    pub fn push_batch(&self, batch: &[KmerRecord]) {
        if batch.is_empty() {
            return;
        }
        let offset = self.cursor.fetch_add(batch.len(), Ordering::AcqRel);
        assert!(
            offset + batch.len() <= self.capacity,
            "k-mer buffer overflow: {} records into capacity {}",
            offset + batch.len(),
            self.capacity
        );
        // SAFETY: the range [offset, offset + batch.len()) was reserved by
        // the fetch_add above and does not overlap any other reservation.
        unsafe {
            let base = (*self.slots.get()).as_mut_ptr();
            std::ptr::copy_nonoverlapping(batch.as_ptr(), base.add(offset), batch.len());
        }
    }

    /// Consume the buffer, returning the filled prefix.
    pub fn into_records(self) -> Vec<KmerRecord> {
        let len = self.len();
        let mut records = self.slots.into_inner().into_vec();
        records.truncate(len);
        records
    }
}
