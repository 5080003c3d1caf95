//! The detach boundary.
//!
//! [`Tether::detach`] and [`Tether::reattach`] move one counted
//! representation between handle form and bare-address form without touching
//! the count. The caller carries the protocol the type cannot enforce: each
//! representation has exactly one live owner at a time, and a given
//! representation must not be detached or reattached from two places
//! concurrently. Misuse is undefined behavior, not a reported error.

use core::ptr::{self, NonNull};

use crate::Tether;
use crate::block::Block;

impl<T> Tether<T> {
    /// Converts the handle into a bare block address, leaving the count
    /// untouched. Returns null for an empty handle.
    ///
    /// The representation this handle owned now rides on the returned
    /// address. An external mechanism may carry it opaquely; hand it back
    /// through [`reattach`](Self::reattach) to resume counted management, or
    /// the block leaks.
    #[inline]
    #[must_use = "the detached address still owns one count"]
    pub fn detach(this: Self) -> *mut Block<T> {
        match Self::into_block(this) {
            Some(block) => block.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    /// Reconstructs an owning handle from a bare block address, leaving the
    /// count untouched. Null yields an empty handle.
    ///
    /// ## Safety
    /// - `block` must be null, or an address produced by
    ///   [`detach`](Self::detach) (or by the factory via a live block) whose
    ///   count already accounts for the handle being constructed.
    /// - The representation transferred here must not be reattached again or
    ///   otherwise given back by any other path.
    #[inline]
    pub unsafe fn reattach(block: *mut Block<T>) -> Self {
        match NonNull::new(block) {
            Some(block) => Self::from_block(block),
            None => Self::empty(),
        }
    }
}
