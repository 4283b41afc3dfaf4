// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Generic chunked ring-buffer consumer thread (§4.7, C8). Grounded
//! directly on this system's `consumer.c`/`.h` worker loop: poll
//! `available()` against a chunk size, sleep ~1 ms when starved, invoke a
//! callback per chunk, and join cleanly on stop.

use rfe_core::RingBuffer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Owns a ring buffer and a worker thread that drains it in fixed chunks.
pub struct ConsumerWorker {
    running: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ConsumerWorker {
    /// Spawns the worker. `callback` runs on the worker thread; it must be
    /// reentrant with respect to other workers and must not call back into
    /// this one (§4.7).
    pub fn start<F>(ring: Arc<RingBuffer>, chunk_size: usize, mut callback: F) -> Self
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();

        let handle = std::thread::Builder::new()
            .name("rfe-consumer".into())
            .spawn(move || {
                let mut chunk = vec![0u8; chunk_size];
                while thread_running.load(Ordering::Relaxed) {
                    if ring.available() >= chunk_size {
                        let n = ring.read(&mut chunk);
                        callback(&chunk[..n]);
                    } else {
                        std::thread::sleep(POLL_INTERVAL);
                    }
                }
            })
            .expect("failed to spawn consumer thread");

        ConsumerWorker {
            running,
            handle: Some(handle),
        }
    }

    /// Signals the worker to stop and joins it.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ConsumerWorker {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[test]
    fn callback_fires_once_chunk_available() {
        let ring = Arc::new(RingBuffer::new(256));
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        let worker = ConsumerWorker::start(ring.clone(), 16, move |bytes| {
            seen_clone.fetch_add(bytes.len(), Ordering::SeqCst);
        });

        ring.write(&[1u8; 16]);
        std::thread::sleep(Duration::from_millis(50));
        worker.stop();

        assert_eq!(seen.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn stop_joins_cleanly_with_no_data() {
        let ring = Arc::new(RingBuffer::new(64));
        let worker = ConsumerWorker::start(ring, 16, |_| {});
        std::thread::sleep(Duration::from_millis(10));
        worker.stop();
    }

    #[test]
    fn multiple_chunks_are_each_delivered() {
        let ring = Arc::new(RingBuffer::new(256));
        let chunks = Arc::new(Mutex::new(Vec::new()));
        let chunks_clone = chunks.clone();

        let worker = ConsumerWorker::start(ring.clone(), 8, move |bytes| {
            chunks_clone.lock().unwrap().push(bytes.to_vec());
        });

        ring.write(&[1u8; 8]);
        ring.write(&[2u8; 8]);
        std::thread::sleep(Duration::from_millis(50));
        worker.stop();

        let got = chunks.lock().unwrap();
        assert!(got.len() >= 2);
    }
}
