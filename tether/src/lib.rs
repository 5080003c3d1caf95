#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

#[cfg(feature = "tracing")]
extern crate tracing;

pub mod block;
pub mod mem;
pub mod raw;
mod reclaim;
mod shared;
mod tests;

pub use shared::Tether;

pub mod prelude {
    pub use crate::Tether;
    pub use crate::block::Block;
    pub use crate::mem::{AllocError, Allocator, BlockAlloc, Global};
}
