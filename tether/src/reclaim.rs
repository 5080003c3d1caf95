use core::alloc::Layout;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::block::Block;
use crate::mem::{AllocError, BlockAlloc};

pub(crate) type ReleaseFn = unsafe fn(NonNull<ReclaimHead>, NonNull<u8>);

/// Dispatch table for one `(value, allocator)` instantiation. A single
/// immutable instance exists per instantiation, promoted to `'static`.
pub(crate) struct ReclaimTable {
    release: ReleaseFn,
}

/// Erased front of a [`Reclaimer`]; what a [`Block`] points back to.
#[repr(C)]
pub(crate) struct ReclaimHead {
    table: &'static ReclaimTable,
}

impl ReclaimHead {
    #[inline]
    pub(crate) fn release_fn(&self) -> ReleaseFn {
        self.table.release
    }
}

/// Captures the allocator a block was made with, so the block can be torn
/// down later without static knowledge of the allocator type.
#[repr(C)]
pub(crate) struct Reclaimer<T, A: BlockAlloc> {
    head: ReclaimHead,
    alloc: A,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T, A: BlockAlloc> Reclaimer<T, A> {
    const TABLE: ReclaimTable = ReclaimTable {
        release: Self::release,
    };

    /// Allocates the record through `alloc` and captures a clone of it.
    pub(crate) fn new_in(alloc: &A) -> Result<NonNull<ReclaimHead>, AllocError> {
        let storage = alloc.allocate(Layout::new::<Self>())?.cast::<Self>();
        let record = Self {
            head: ReclaimHead {
                table: &Self::TABLE,
            },
            alloc: alloc.clone(),
            _marker: PhantomData,
        };
        unsafe { storage.as_ptr().write(record) };
        Ok(storage.cast())
    }

    /// Tears down a capability that never got its block: destroys the
    /// captured allocator and frees the record's storage.
    ///
    /// ## Safety
    /// - `head` must come from [`Self::new_in`] and must not be reachable
    ///   from any block.
    pub(crate) unsafe fn discard(head: NonNull<ReclaimHead>) {
        let this = head.cast::<Self>();
        unsafe {
            let alloc = ptr::read(&raw const (*this.as_ptr()).alloc);
            alloc.deallocate(this.cast(), Layout::new::<Self>());
        }
    }

    /// The one erased operation: destroys the captured allocator copy, frees
    /// this record, destroys the block value, frees the block storage. Each
    /// object is destroyed before its storage goes.
    ///
    /// ## Safety
    /// - `head` must come from [`Self::new_in`].
    /// - `block` must address the `Block<T>` linked to `head`, with count
    ///   zero and no live representation left.
    unsafe fn release(head: NonNull<ReclaimHead>, block: NonNull<u8>) {
        let this = head.cast::<Self>();
        let block = block.cast::<Block<T>>();

        #[cfg(feature = "tracing")]
        tracing::trace!(block = ?block.as_ptr(), "release block");

        unsafe {
            let alloc = ptr::read(&raw const (*this.as_ptr()).alloc);
            alloc.deallocate(this.cast(), Layout::new::<Self>());
            ptr::drop_in_place(block.as_ptr());
            alloc.deallocate(block.cast(), Layout::new::<Block<T>>());
        }
    }
}
