use std::sync::atomic::Ordering;
use std::thread;

use crossbeam_queue::ArrayQueue;
use tether::Tether;
use tether::block::Block;

mod op;

use op::{ReadOp, checksum, serve};

const OPS: usize = 256;
const RING_CAP: usize = 1 << 5;

fn main() {
    let sq = ArrayQueue::<usize>::new(RING_CAP);
    let cq = ArrayQueue::<usize>::new(RING_CAP);

    thread::scope(|s| {
        s.spawn(|| serve(&sq, &cq, OPS));

        let mut submitted = 0;
        let mut reaped = 0;
        while reaped < OPS {
            // one representation per op rides the ring as a bare word
            if submitted < OPS && !sq.is_full() {
                let op = Tether::new(ReadOp::new(fastrand::u64(..)));
                sq.push(Tether::detach(op) as usize).unwrap();
                submitted += 1;
            }

            while let Some(word) = cq.pop() {
                let op = unsafe { Tether::reattach(word as *mut Block<ReadOp>) };
                assert_eq!(Tether::block(&op).unwrap().count(), 1);
                assert_eq!(op.got.load(Ordering::Acquire), checksum(op.want));
                reaped += 1;
            }
        }
    });

    println!("{OPS} ops round-tripped the ring");
}
