/* ---------- lock-free SPSC sample ring ---------- */

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity single-producer/single-consumer ring of f32 samples.
///
/// Exactly one thread may call [`push`](Self::push) and exactly one thread may
/// call [`pop`](Self::pop). A second producer or consumer is a contract
/// violation and is not checked at runtime.
///
/// The occupancy counter, not cursor distance, tells full from empty, so the
/// whole backing store is usable and capacity need not be a power of two.
pub struct SampleRingBuffer {
    slots: Box<[UnsafeCell<f32>]>,
    write: AtomicUsize,
    read: AtomicUsize,
    count: AtomicUsize,
}

// Safety: the producer only writes the slot at `write` while `count < capacity`,
// the consumer only reads the slot at `read` while `count > 0`. The release on
// `count` after each slot access orders it against the other side's acquire,
// so the two threads never touch the same slot concurrently.
unsafe impl Send for SampleRingBuffer {}
unsafe impl Sync for SampleRingBuffer {}

impl SampleRingBuffer {
    /// Capacity is in samples, not frames. A zero capacity is bumped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(0.0f32))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Samples currently queued. Only a snapshot when the other side is active.
    #[inline]
    pub fn occupancy(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupancy() == 0
    }

    /// Producer: enqueue one sample. Returns false without waiting if full.
    pub fn push(&self, sample: f32) -> bool {
        if self.count.load(Ordering::Acquire) >= self.capacity() {
            return false;
        }
        let w = self.write.load(Ordering::Relaxed);
        // Safe: slot `w` is free (count < capacity) and only this thread writes it.
        unsafe { *self.slots[w].get() = sample };
        self.write.store(next(w, self.capacity()), Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Release);
        true
    }

    /// Consumer: dequeue one sample, or `None` if empty.
    pub fn pop(&self) -> Option<f32> {
        if self.count.load(Ordering::Acquire) == 0 {
            return None;
        }
        let r = self.read.load(Ordering::Relaxed);
        // Safe: slot `r` was published by the producer's release on `count`.
        let sample = unsafe { *self.slots[r].get() };
        self.read.store(next(r, self.capacity()), Ordering::Relaxed);
        self.count.fetch_sub(1, Ordering::Release);
        Some(sample)
    }
}

#[inline]
fn next(i: usize, cap: usize) -> usize {
    if i + 1 == cap {
        0
    } else {
        i + 1
    }
}
