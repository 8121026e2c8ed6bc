//! Lock-free hand-off cells between a control thread and the audio thread.
//!
//! Both cells are single-producer/single-consumer in spirit: the control
//! side writes, the audio side consumes once per block. Only the latest
//! write matters, so there is no queue.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

/// A pending request encoded as a small integer code.
///
/// [`request`](Self::request) overwrites any earlier unconsumed request;
/// [`take`](Self::take) consumes and clears it atomically.
///
/// # Example
///
/// ```rust
/// use trivox_core::PendingCell;
///
/// let cell = PendingCell::new();
/// cell.request(2);
/// cell.request(0); // latest wins
/// assert_eq!(cell.take(), Some(0));
/// assert_eq!(cell.take(), None);
/// ```
#[derive(Debug)]
pub struct PendingCell {
    code: AtomicU8,
}

impl PendingCell {
    /// Marker meaning "nothing pending". Not a valid request code.
    pub const EMPTY: u8 = u8::MAX;

    /// Create an empty cell.
    pub const fn new() -> Self {
        Self {
            code: AtomicU8::new(Self::EMPTY),
        }
    }

    /// Post a request. Codes equal to [`EMPTY`](Self::EMPTY) are ignored.
    pub fn request(&self, code: u8) {
        if code != Self::EMPTY {
            self.code.store(code, Ordering::Release);
        }
    }

    /// Consume the pending request, if any.
    #[inline]
    pub fn take(&self) -> Option<u8> {
        match self.code.swap(Self::EMPTY, Ordering::AcqRel) {
            Self::EMPTY => None,
            code => Some(code),
        }
    }

    /// Peek at the pending request without consuming it.
    pub fn peek(&self) -> Option<u8> {
        match self.code.load(Ordering::Acquire) {
            Self::EMPTY => None,
            code => Some(code),
        }
    }

    /// Drop any pending request.
    pub fn clear(&self) {
        self.code.store(Self::EMPTY, Ordering::Release);
    }
}

impl Default for PendingCell {
    fn default() -> Self {
        Self::new()
    }
}

/// An `f32` stored as bits, with a dirty flag raised on every write.
///
/// The audio thread polls [`take`](Self::take) at block start and applies
/// the value only when it changed since the last poll.
#[derive(Debug)]
pub struct AtomicParam {
    bits: AtomicU32,
    dirty: AtomicBool,
}

impl AtomicParam {
    /// Create a clean cell holding `value`.
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Store a new value and mark the cell dirty.
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
        self.dirty.store(true, Ordering::Release);
    }

    /// Latest stored value, regardless of the dirty flag.
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Return the value if it was written since the last `take`.
    #[inline]
    pub fn take(&self) -> Option<f32> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            Some(self.load())
        } else {
            None
        }
    }

    /// Overwrite the value without raising the dirty flag.
    pub fn sync(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    /// Whether a write is waiting to be consumed.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_cell_starts_empty() {
        let cell = PendingCell::default();
        assert_eq!(cell.peek(), None);
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn pending_cell_take_clears() {
        let cell = PendingCell::new();
        cell.request(1);
        assert_eq!(cell.peek(), Some(1));
        assert_eq!(cell.take(), Some(1));
        assert_eq!(cell.peek(), None);
    }

    #[test]
    fn pending_cell_ignores_empty_marker() {
        let cell = PendingCell::new();
        cell.request(3);
        cell.request(PendingCell::EMPTY);
        assert_eq!(cell.take(), Some(3));
    }

    #[test]
    fn pending_cell_clear() {
        let cell = PendingCell::new();
        cell.request(0);
        cell.clear();
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn atomic_param_dirty_tracking() {
        let param = AtomicParam::new(0.8);
        assert_eq!(param.load(), 0.8);
        assert!(!param.is_dirty());
        assert_eq!(param.take(), None);

        param.store(0.25);
        assert!(param.is_dirty());
        assert_eq!(param.take(), Some(0.25));
        assert_eq!(param.take(), None);
    }

    #[test]
    fn atomic_param_sync_is_clean() {
        let param = AtomicParam::new(0.0);
        param.sync(0.5);
        assert_eq!(param.load(), 0.5);
        assert_eq!(param.take(), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn atomic_param_across_threads() {
        use std::sync::Arc;

        let param = Arc::new(AtomicParam::new(0.0));
        let writer = Arc::clone(&param);
        std::thread::spawn(move || writer.store(0.75))
            .join()
            .expect("writer thread panicked");
        assert_eq!(param.take(), Some(0.75));
    }
}
