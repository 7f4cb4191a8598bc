//! Double-buffered cell storage shared with worker threads.
//!
//! Workers are long-lived threads, so everything a phase touches has to be
//! `'static`. A [`SharedPlane`] is a reference-counted byte plane that
//! workers can hold for the duration of a phase. Bytes are stored as
//! `AtomicU8` and accessed with `Relaxed` ordering: each byte of a write
//! plane is owned by exactly one row task, and the phase barrier in the
//! dispatcher publishes all writes before anyone reads them.
//!
//! [`CellBuffer`] pairs two planes. A step reads `current` and writes
//! `next`, then the two are swapped.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use afterglow_common::GridSize;
use tracing::debug;

/// A fixed-length byte plane shareable across threads.
#[derive(Debug, Clone)]
pub struct SharedPlane {
    bytes: Arc<[AtomicU8]>,
}

impl SharedPlane {
    /// Creates a zero-filled plane.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: (0..len).map(|_| AtomicU8::new(0)).collect(),
        }
    }

    /// Creates a plane holding a copy of `data`.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            bytes: data.iter().map(|&b| AtomicU8::new(b)).collect(),
        }
    }

    /// Number of bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the plane has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reads one byte.
    #[must_use]
    #[inline]
    pub fn get(&self, index: usize) -> u8 {
        self.bytes[index].load(Ordering::Relaxed)
    }

    /// Writes one byte.
    #[inline]
    pub fn set(&self, index: usize, value: u8) {
        self.bytes[index].store(value, Ordering::Relaxed);
    }

    /// Sets every byte to `value`.
    pub fn fill(&self, value: u8) {
        for byte in self.bytes.iter() {
            byte.store(value, Ordering::Relaxed);
        }
    }

    /// Copies the plane into an owned vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes
            .iter()
            .map(|byte| byte.load(Ordering::Relaxed))
            .collect()
    }

    /// Whether two handles refer to the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

/// Current/next pair of cell-state planes.
///
/// `current` is read-only while a step runs and `next` is write-only;
/// `next` is never read until [`CellBuffer::swap`] has made it current.
#[derive(Debug)]
pub struct CellBuffer {
    size: GridSize,
    current: SharedPlane,
    next: SharedPlane,
}

impl CellBuffer {
    /// Creates a zeroed buffer pair for `size`.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        debug!(
            "Creating double-buffered cell storage ({}x{} = {} cells)",
            size.width,
            size.height,
            size.cell_count()
        );
        Self {
            size,
            current: SharedPlane::zeroed(size.cell_count()),
            next: SharedPlane::zeroed(size.cell_count()),
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Plane holding the finalized generation.
    #[must_use]
    pub const fn current(&self) -> &SharedPlane {
        &self.current
    }

    /// Plane the next generation is written into.
    #[must_use]
    pub const fn next(&self) -> &SharedPlane {
        &self.next
    }

    /// Makes `next` the current plane.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_get_set() {
        let plane = SharedPlane::zeroed(4);
        plane.set(2, 7);
        assert_eq!(plane.get(2), 7);
        assert_eq!(plane.to_vec(), vec![0, 0, 7, 0]);
    }

    #[test]
    fn test_plane_clone_shares_storage() {
        let plane = SharedPlane::from_bytes(&[1, 2, 3]);
        let handle = plane.clone();
        handle.set(0, 9);
        assert_eq!(plane.get(0), 9);
        assert!(plane.ptr_eq(&handle));
    }

    #[test]
    fn test_swap_exchanges_planes() {
        let mut buffer = CellBuffer::new(GridSize::new(2, 2));
        buffer.next().set(3, 5);
        let old_next = buffer.next().clone();
        buffer.swap();
        assert!(buffer.current().ptr_eq(&old_next));
        assert_eq!(buffer.current().get(3), 5);
        assert_eq!(buffer.next().get(3), 0);
    }
}
