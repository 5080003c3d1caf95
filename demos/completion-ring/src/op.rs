use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_queue::ArrayQueue;

/// What one submission carries. `repr(C)` end to end: the device sees this
/// struct at the bare block address it is handed, because the value leads
/// the block layout.
#[repr(C)]
pub struct ReadOp {
    pub want: u64,
    pub got: AtomicU64,
}

impl ReadOp {
    pub fn new(want: u64) -> Self {
        Self {
            want,
            got: AtomicU64::new(0),
        }
    }
}

pub fn checksum(want: u64) -> u64 {
    want.rotate_left(17) ^ 0x9E37_79B9_7F4A_7C15
}

/// The device loop: pure address plumbing, no ownership knowledge. Each
/// submitted word is read as a [`ReadOp`], answered in place, and posted
/// back on the completion ring unchanged.
pub fn serve(sq: &ArrayQueue<usize>, cq: &ArrayQueue<usize>, ops: usize) {
    let mut served = 0;
    while served < ops {
        let Some(word) = sq.pop() else {
            thread::yield_now();
            continue;
        };

        let op = unsafe { &*(word as *const ReadOp) };
        op.got.store(checksum(op.want), Ordering::Release);

        while cq.push(word).is_err() {
            thread::yield_now();
        }
        served += 1;
    }
}
