// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Overwrite-on-full byte ring (§3, §4.1). One producer writes, one or more
//! consumers read; each read serializes with the others under the same lock.

use std::sync::Mutex;

struct Inner {
    buf: Vec<u8>,
    mask: usize,
    write: u64,
    read: u64,
}

/// A power-of-two-sized byte FIFO that never blocks and never fails a write.
/// When a write would exceed capacity, the oldest bytes are discarded first.
pub struct RingBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl RingBuffer {
    /// `capacity` is rounded up to the next power of two.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        RingBuffer {
            inner: Mutex::new(Inner {
                buf: vec![0u8; capacity],
                mask: capacity - 1,
                write: 0,
                read: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `src`. If the ring would overflow, the oldest bytes are
    /// dropped so that `available() <= capacity` always holds. Never blocks.
    pub fn write(&self, src: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        let cap = self.capacity as u64;
        let len = src.len();

        // A write longer than the whole ring only the trailing `capacity` bytes survive.
        let (src, len) = if len as u64 > cap {
            let skip = len - self.capacity;
            (&src[skip..], self.capacity)
        } else {
            (src, len)
        };

        let available = inner.write - inner.read;
        let free = cap - available;
        if len as u64 > free {
            inner.read += len as u64 - free;
        }

        let mask = inner.mask;
        for (i, &b) in src.iter().enumerate() {
            let idx = ((inner.write as usize).wrapping_add(i)) & mask;
            inner.buf[idx] = b;
        }
        inner.write += len as u64;
    }

    /// Copies up to `dst.len()` bytes into `dst`, returning the count copied.
    pub fn read(&self, dst: &mut [u8]) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let available = (inner.write - inner.read) as usize;
        let copied = dst.len().min(available);
        let mask = inner.mask;
        for (i, slot) in dst.iter_mut().take(copied).enumerate() {
            let idx = ((inner.read as usize).wrapping_add(i)) & mask;
            *slot = inner.buf[idx];
        }
        inner.read += copied as u64;
        copied
    }

    pub fn available(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        (inner.write - inner.read) as usize
    }

    /// Discards everything currently buffered.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.read = inner.write;
    }

    pub fn free(&self) -> usize {
        self.capacity - self.available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_after_write_returns_exact_bytes_in_order() {
        let rb = RingBuffer::new(16);
        rb.write(&[1, 2, 3, 4]);
        assert_eq!(rb.available(), 4);
        let mut out = [0u8; 4];
        let n = rb.read(&mut out);
        assert_eq!(n, 4);
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(rb.available(), 0);
    }

    #[test]
    fn overwrite_on_full_keeps_most_recent_bytes() {
        // Scenario 5: capacity 16, write 12 bytes A, write 8 bytes B.
        let rb = RingBuffer::new(16);
        let a: Vec<u8> = (0..12).collect();
        let b: Vec<u8> = (100..108).collect();
        rb.write(&a);
        rb.write(&b);
        assert_eq!(rb.available(), 16);
        let mut out = [0u8; 16];
        let n = rb.read(&mut out);
        assert_eq!(n, 16);
        let mut expected = Vec::new();
        expected.extend_from_slice(&a[4..12]);
        expected.extend_from_slice(&b);
        assert_eq!(&out[..], &expected[..]);
    }

    #[test]
    fn available_never_exceeds_capacity() {
        let rb = RingBuffer::new(8);
        for _ in 0..10 {
            rb.write(&[0u8; 3]);
            assert!(rb.available() <= rb.capacity());
        }
    }

    #[test]
    fn reset_discards_everything() {
        let rb = RingBuffer::new(8);
        rb.write(&[1, 2, 3]);
        rb.reset();
        assert_eq!(rb.available(), 0);
        let mut out = [0u8; 4];
        assert_eq!(rb.read(&mut out), 0);
    }

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        let rb = RingBuffer::new(100);
        assert_eq!(rb.capacity(), 128);
    }

    #[test]
    fn write_longer_than_capacity_keeps_only_the_tail() {
        let rb = RingBuffer::new(4);
        let data: Vec<u8> = (0..10).collect();
        rb.write(&data);
        assert_eq!(rb.available(), 4);
        let mut out = [0u8; 4];
        rb.read(&mut out);
        assert_eq!(out, [6, 7, 8, 9]);
    }
}
