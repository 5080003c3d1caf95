use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam_queue::ArrayQueue;

use crate::Tether;
use crate::block::Block;
use crate::tests::Probe;

#[test]
fn concurrent_clone_and_drop() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 1 << 10;

    let (probe, drops) = Probe::new();
    let p = Tether::new(probe);

    thread::scope(|s| {
        for _ in 0..THREADS {
            let p = p.clone();
            s.spawn(move || {
                for _ in 0..ROUNDS {
                    let q = p.clone();
                    assert!(!Tether::is_empty(&q));
                    drop(q);
                }
            });
        }
    });

    assert_eq!(Tether::block(&p).unwrap().count(), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    drop(p);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

struct Payload {
    seq: usize,
    _probe: Probe,
}

/// Detached addresses cross to a device loop that only understands plain
/// words, then come back and reattach.
#[test]
fn addresses_survive_the_ring() {
    const OPS: usize = 64;

    let sq = ArrayQueue::<usize>::new(OPS);
    let cq = ArrayQueue::<usize>::new(OPS);
    let drops = Arc::new(AtomicUsize::new(0));

    thread::scope(|s| {
        // the non-cooperating domain: echoes every submitted word
        s.spawn(|| {
            let mut served = 0;
            while served < OPS {
                let Some(word) = sq.pop() else {
                    thread::yield_now();
                    continue;
                };
                if fastrand::u8(0..4) == 0 {
                    thread::yield_now();
                }
                cq.push(word).unwrap();
                served += 1;
            }
        });

        for seq in 0..OPS {
            let op = Tether::new(Payload {
                seq,
                _probe: Probe::share(&drops),
            });
            sq.push(Tether::detach(op) as usize).unwrap();
        }

        let mut seen = Vec::with_capacity(OPS);
        while seen.len() < OPS {
            let Some(word) = cq.pop() else {
                thread::yield_now();
                continue;
            };
            let op = unsafe { Tether::reattach(word as *mut Block<Payload>) };
            assert_eq!(Tether::block(&op).unwrap().count(), 1);
            seen.push(op.seq);
        }

        assert_eq!(drops.load(Ordering::SeqCst), OPS);
        seen.sort_unstable();
        assert_eq!(seen, (0..OPS).collect::<Vec<_>>());
    });
}
