pub use alloc::alloc::handle_alloc_error;
pub use allocator_api2::alloc::{AllocError, Allocator, Global};

/// Allocators a block family can be built over.
///
/// The concrete type is erased once a block exists, so the captured clone
/// must be free to travel to whichever thread performs the final release.
pub trait BlockAlloc: Allocator + Clone + Send + Sync + 'static {}

impl<A: Allocator + Clone + Send + Sync + 'static> BlockAlloc for A {}
