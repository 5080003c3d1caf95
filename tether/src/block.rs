use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::reclaim::ReclaimHead;

pub(crate) const MAX_REFCOUNT: usize = isize::MAX as usize;

/// The allocated unit behind every handle: the value, the count of live
/// representations, and the erased route back to the allocator that made it.
///
/// `value` leads a `repr(C)` layout. A detached block address therefore
/// doubles as an address of `T` for an external mechanism that reinterprets
/// it, provided `T` itself has a predictable layout.
#[repr(C)]
pub struct Block<T> {
    value: T,
    count: AtomicUsize,
    reclaim: NonNull<ReclaimHead>,
}

unsafe impl<T: Send> Send for Block<T> {}
unsafe impl<T: Sync> Sync for Block<T> {}

impl<T> Block<T> {
    #[inline]
    pub(crate) fn new(value: T, reclaim: NonNull<ReclaimHead>) -> Self {
        Self {
            value,
            count: AtomicUsize::new(1),
            reclaim,
        }
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Count of live representations, handles and detached addresses alike.
    #[inline]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Adds one representation out of band.
    ///
    /// The caller takes over accounting for it: some handle or detached
    /// address must eventually return it, or the block leaks.
    #[inline]
    pub fn retain(&self) {
        let old = self.count.fetch_add(1, Ordering::Relaxed);
        if old > MAX_REFCOUNT {
            panic!("block count exceeds `isize::MAX`");
        }
    }

    #[inline]
    pub(crate) fn count_ref(&self) -> &AtomicUsize {
        &self.count
    }

    /// Destroys the value and frees both the block and its capability.
    ///
    /// ## Safety
    /// - `block` must come from this crate's factory and its count must have
    ///   been observed transitioning to zero by the caller.
    /// - No live representation of the block may remain.
    pub(crate) unsafe fn release(block: NonNull<Block<T>>) {
        let head = unsafe { block.as_ref() }.reclaim;
        let release = unsafe { head.as_ref() }.release_fn();
        unsafe { release(head, block.cast()) }
    }
}

#[cfg(test)]
mod tests {
    use core::mem::offset_of;

    use super::Block;

    #[repr(C)]
    struct Overlapped {
        internal: usize,
        offset: u64,
    }

    #[repr(C)]
    struct ReadOp {
        ovr: Overlapped,
        len: u32,
    }

    #[test]
    fn value_leads_the_block() {
        assert_eq!(offset_of!(Block<u64>, value), 0);
        assert_eq!(offset_of!(Block<ReadOp>, value), 0);
        assert_eq!(offset_of!(Block<[u8; 3]>, value), 0);
    }
}
