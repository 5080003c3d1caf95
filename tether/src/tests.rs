#![cfg(test)]

mod counting;
mod ring;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts its own drops through a shared tally.
#[derive(Debug)]
pub(crate) struct Probe {
    drops: Arc<AtomicUsize>,
}

impl Probe {
    pub(crate) fn new() -> (Self, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        let probe = Self {
            drops: drops.clone(),
        };
        (probe, drops)
    }

    pub(crate) fn share(drops: &Arc<AtomicUsize>) -> Self {
        Self {
            drops: drops.clone(),
        }
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}
