// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! SDR driver interface (§6) and a synthetic source for local development and
//! tests. Grounded in this codebase's existing `IqSource` abstraction, with
//! the function-pointer + `void*` callback of the original interface
//! re-architected as a capability-based sink per §9.

use crate::fault_log::{classify_device_error, FaultLogger};
use rfe_core::HwConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Receives raw IQ byte bursts from the RX callback (T-rx, §5). Implementors
/// must not block or allocate on the hot path.
pub trait IqSink: Send + Sync {
    fn on_burst(&self, buffer: &[u8]);
}

/// Thin HAL around a USB tuner front end (§6). `open`/`close` are modeled as
/// construction/`Drop`; `init()` has no Rust-side analogue (the hardware
/// library performs it internally on `open`).
pub trait SdrDevice: Send {
    fn apply_cfg(&mut self, cfg: &HwConfig) -> rfe_core::DynResult<()>;
    fn start_rx(&mut self, sink: Arc<dyn IqSink>) -> rfe_core::DynResult<()>;
    fn stop_rx(&mut self) -> rfe_core::DynResult<()>;
}

/// Opens a device, retrying indefinitely on failure (§7: "Device open failure
/// (startup) ... retry forever, 5 s cadence").
pub fn open_with_retry<F, D>(mut open: F) -> D
where
    F: FnMut() -> rfe_core::DynResult<D>,
{
    let fault_log = FaultLogger::new("device open", classify_device_error);
    loop {
        match open() {
            Ok(device) => return device,
            Err(e) => {
                fault_log.log(&e.to_string());
                std::thread::sleep(Duration::from_secs(5));
            }
        }
    }
}

/// Synthetic source: generates periodic bursts of pseudo-random IQ bytes on
/// its own timer, standing in for the hardware callback in tests and local
/// runs without a USB front end attached.
pub struct MockSdrDevice {
    running: Arc<AtomicBool>,
    burst_thread: Mutex<Option<std::thread::JoinHandle<()>>>,
    burst_len: usize,
    burst_interval: Duration,
    applied: Option<HwConfig>,
}

impl MockSdrDevice {
    pub fn new(burst_len: usize, burst_interval: Duration) -> Self {
        MockSdrDevice {
            running: Arc::new(AtomicBool::new(false)),
            burst_thread: Mutex::new(None),
            burst_len,
            burst_interval,
            applied: None,
        }
    }

    pub fn applied_cfg(&self) -> Option<HwConfig> {
        self.applied
    }
}

impl SdrDevice for MockSdrDevice {
    fn apply_cfg(&mut self, cfg: &HwConfig) -> rfe_core::DynResult<()> {
        tracing::debug!(?cfg, "mock device applying config");
        self.applied = Some(*cfg);
        Ok(())
    }

    fn start_rx(&mut self, sink: Arc<dyn IqSink>) -> rfe_core::DynResult<()> {
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let burst_len = self.burst_len;
        let interval = self.burst_interval;

        let handle = std::thread::Builder::new()
            .name("mock-sdr-rx".into())
            .spawn(move || {
                let mut seed: u32 = 0x1234_5678;
                while running.load(Ordering::Relaxed) {
                    let mut buf = vec![0u8; burst_len];
                    for b in buf.iter_mut() {
                        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                        *b = (seed >> 24) as u8;
                    }
                    sink.on_burst(&buf);
                    std::thread::sleep(interval);
                }
            })?;
        *self.burst_thread.lock().unwrap() = Some(handle);
        Ok(())
    }

    fn stop_rx(&mut self) -> rfe_core::DynResult<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.burst_thread.lock().unwrap().take() {
            let _ = handle.join();
        }
        Ok(())
    }
}
