use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ops::Deref;
use core::ptr::{self, NonNull};
use core::sync::atomic::{Ordering, fence};

use crossbeam_utils::Backoff;

use crate::block::{Block, MAX_REFCOUNT};
use crate::mem::{AllocError, BlockAlloc, Global, handle_alloc_error};
use crate::reclaim::Reclaimer;

/// An owning, atomically counted reference to a [`Block`].
///
/// A handle is either empty or owns exactly one increment of its block's
/// count. Handles clone and drop freely across threads; the block goes down
/// with the drop that takes the count from one to zero, through the
/// allocator captured at construction.
///
/// [`Tether::detach`] turns the handle into a bare block address for a
/// domain that cannot run destructors; see the [`raw`](crate::raw) module
/// for the boundary contract.
pub struct Tether<T> {
    block: Option<NonNull<Block<T>>>,
    _marker: PhantomData<Block<T>>,
}

unsafe impl<T: Send + Sync> Send for Tether<T> {}
unsafe impl<T: Send + Sync> Sync for Tether<T> {}

impl<T> Unpin for Tether<T> {}

impl<T> Tether<T> {
    /// A handle referring to no block.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            block: None,
            _marker: PhantomData,
        }
    }

    /// Allocates a block holding `value` through `alloc`, with count one.
    ///
    /// Two allocations are made: the capability record capturing `alloc`,
    /// then the block itself. If the second fails the capability is
    /// destroyed and freed before the error propagates.
    pub fn try_new_in<A: BlockAlloc>(value: T, alloc: A) -> Result<Self, AllocError> {
        let head = Reclaimer::<T, A>::new_in(&alloc)?;

        let block = match alloc.allocate(Layout::new::<Block<T>>()) {
            Ok(storage) => storage.cast::<Block<T>>(),
            Err(e) => {
                unsafe { Reclaimer::<T, A>::discard(head) };
                return Err(e);
            }
        };
        unsafe { block.as_ptr().write(Block::new(value, head)) };

        #[cfg(feature = "tracing")]
        tracing::trace!(block = ?block.as_ptr(), "allocate block");

        Ok(Self::from_block(block))
    }

    pub fn new_in<A: BlockAlloc>(value: T, alloc: A) -> Self {
        match Self::try_new_in(value, alloc) {
            Ok(t) => t,
            Err(_) => handle_alloc_error(Layout::new::<Block<T>>()),
        }
    }

    pub fn new(value: T) -> Self {
        Self::new_in(value, Global)
    }

    #[inline]
    pub fn is_empty(this: &Self) -> bool {
        this.block.is_none()
    }

    #[inline]
    pub fn get(this: &Self) -> Option<&T> {
        this.block.map(|b| unsafe { b.as_ref() }.value())
    }

    /// ## Safety
    /// - the handle must be owning.
    #[inline]
    pub unsafe fn get_unchecked(this: &Self) -> &T {
        debug_assert!(!Self::is_empty(this), "dereferenced an empty `Tether`");
        let block = unsafe { this.block.unwrap_unchecked() };
        unsafe { block.as_ref() }.value()
    }

    /// Address of the value, null when empty.
    #[inline]
    pub fn as_ptr(this: &Self) -> *const T {
        match this.block {
            Some(b) => unsafe { b.as_ref() }.value(),
            None => ptr::null(),
        }
    }

    /// The referred block, for count observation.
    #[inline]
    pub fn block(this: &Self) -> Option<&Block<T>> {
        this.block.map(|b| unsafe { b.as_ref() })
    }

    #[inline]
    pub(crate) const fn from_block(block: NonNull<Block<T>>) -> Self {
        Self {
            block: Some(block),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn into_block(this: Self) -> Option<NonNull<Block<T>>> {
        ManuallyDrop::new(this).block
    }
}

impl<T> Clone for Tether<T> {
    /// Produces another owning handle over the same block, or an empty
    /// handle if the block is already transitioning to destruction.
    ///
    /// The increment only lands when the count is observed nonzero, so a
    /// racing final drop is never revived.
    fn clone(&self) -> Self {
        let Some(block) = self.block else {
            return Self::empty();
        };

        let count = unsafe { block.as_ref() }.count_ref();
        let backoff = Backoff::new();
        let mut cur = count.load(Ordering::Relaxed);
        loop {
            if cur == 0 {
                return Self::empty();
            }
            if cur > MAX_REFCOUNT {
                panic!("block count exceeds `isize::MAX`");
            }
            match count.compare_exchange_weak(cur, cur + 1, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return Self::from_block(block),
                Err(changed) => {
                    cur = changed;
                    backoff.spin();
                }
            }
        }
    }
}

impl<T> Drop for Tether<T> {
    fn drop(&mut self) {
        let Some(block) = self.block.take() else {
            return;
        };

        if unsafe { block.as_ref() }.count_ref().fetch_sub(1, Ordering::Release) != 1 {
            return;
        }

        fence(Ordering::Acquire);
        unsafe { Block::release(block) }
    }
}

impl<T> Deref for Tether<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match Self::get(self) {
            Some(v) => v,
            None => panic!("dereferenced an empty `Tether`"),
        }
    }
}

impl<T> Default for Tether<T> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> PartialEq for Tether<T> {
    /// Handles compare equal iff they refer to the same block, or both are
    /// empty.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.block.map(NonNull::as_ptr) == other.block.map(NonNull::as_ptr)
    }
}

impl<T> Eq for Tether<T> {}

impl<T: core::fmt::Debug> core::fmt::Debug for Tether<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match Self::get(self) {
            Some(v) => core::fmt::Debug::fmt(v, f),
            None => f.write_str("(empty)"),
        }
    }
}
