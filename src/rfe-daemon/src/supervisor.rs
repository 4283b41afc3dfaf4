// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The state machine coordinating configuration, acquisition, PSD publish,
//! and audio startup (§4.9, C10), plus bounded-retry hardware recovery
//! (§4.10, C11).

use crate::consumer::ConsumerWorker;
use crate::control::ControlLink;
use crate::device::{IqSink, SdrDevice};
use rfe_core::{
    decode_iq, execute_welch_psd, scale::scale_psd_bins, DesiredCfg, FmRadio, FmRadioConfig,
    HwConfig, ResolvedParams, RingBuffer,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const CONFIG_POLL_INTERVAL: Duration = Duration::from_millis(50);
const ACQUISITION_POLL_INTERVAL: Duration = Duration::from_millis(5);
const ACQUISITION_TIMEOUT: Duration = Duration::from_secs(5);
const RECOVERY_SETTLE: Duration = Duration::from_millis(100);
const RECOVERY_RETRY_DELAY: Duration = Duration::from_millis(500);
const RECOVERY_MAX_ATTEMPTS: u32 = 3;

/// Single-slot mailbox for inbound config messages (§9: "owned mailbox held
/// by the supervisor" replacing the original's module-scope mutable slot).
#[derive(Clone, Default)]
pub struct PendingConfig(Arc<Mutex<Option<DesiredCfg>>>);

impl PendingConfig {
    pub fn new() -> Self {
        PendingConfig::default()
    }

    /// Called by the control-link thread (T-ctrl) once a config has parsed cleanly.
    pub fn publish(&self, cfg: DesiredCfg) {
        *self.0.lock().unwrap() = Some(cfg);
    }

    /// Called by the supervisor (T-main); clears the slot atomically with the read.
    fn take(&self) -> Option<DesiredCfg> {
        self.0.lock().unwrap().take()
    }
}

struct DualRingSink {
    large: Arc<RingBuffer>,
    small: Arc<RingBuffer>,
}

impl IqSink for DualRingSink {
    fn on_burst(&self, buffer: &[u8]) {
        self.large.write(buffer);
        self.small.write(buffer);
    }
}

#[derive(Serialize)]
struct PsdMessage {
    start_freq_hz: f64,
    end_freq_hz: f64,
    #[serde(rename = "Pxx")]
    pxx: Vec<f64>,
}

/// Factory used by hardware recovery to close and reopen the device (§4.10).
pub type DeviceFactory = Box<dyn FnMut() -> rfe_core::DynResult<Box<dyn SdrDevice>> + Send>;

pub struct Supervisor {
    device: Box<dyn SdrDevice>,
    reopen: DeviceFactory,
    large_ring: Arc<RingBuffer>,
    small_ring: Arc<RingBuffer>,
    pending: PendingConfig,
    control_link: Arc<ControlLink>,
    last_applied_cfg: Option<HwConfig>,
    rx_running: bool,
    audio_started: bool,
    last_radio_sample_rate: Option<f64>,
    audio_consumer: Option<ConsumerWorker>,
    audio_fs_hz: u32,
    deemph_us: f64,
    audio_chunk_bytes: usize,
    audio_start_fn: Box<dyn FnMut(Arc<RingBuffer>, usize, FmRadio) -> ConsumerWorker>,
    running: Arc<AtomicBool>,
}

impl Supervisor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: Box<dyn SdrDevice>,
        reopen: DeviceFactory,
        large_ring: Arc<RingBuffer>,
        small_ring: Arc<RingBuffer>,
        pending: PendingConfig,
        control_link: Arc<ControlLink>,
        audio_fs_hz: u32,
        deemph_us: f64,
        audio_chunk_bytes: usize,
        audio_start_fn: Box<dyn FnMut(Arc<RingBuffer>, usize, FmRadio) -> ConsumerWorker>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Supervisor {
            device,
            reopen,
            large_ring,
            small_ring,
            pending,
            control_link,
            last_applied_cfg: None,
            rx_running: false,
            audio_started: false,
            last_radio_sample_rate: None,
            audio_consumer: None,
            audio_fs_hz,
            deemph_us,
            audio_chunk_bytes,
            audio_start_fn,
            running,
        }
    }

    /// Runs the supervisor loop until `running` is cleared (§5: cooperative shutdown).
    pub fn run(&mut self) {
        while self.running.load(Ordering::Relaxed) {
            self.run_once();
        }
    }

    /// One iteration of the flow in §4.9.
    fn run_once(&mut self) {
        let Some(cfg) = self.pending.take() else {
            std::thread::sleep(CONFIG_POLL_INTERVAL);
            return;
        };

        let resolved = ResolvedParams::resolve(&cfg);

        if resolved.total_bytes > self.large_ring.capacity() {
            tracing::warn!(
                total_bytes = resolved.total_bytes,
                capacity = self.large_ring.capacity(),
                "requested acquisition exceeds ring capacity, skipping cycle"
            );
            return;
        }

        self.apply_hw_config(&resolved.hw_config);
        self.maybe_reinit_audio(cfg.sample_rate_hz);
        self.maybe_start_audio();

        match self.wait_for_acquisition(resolved.total_bytes) {
            true => self.publish_psd(&cfg, &resolved),
            false => {
                tracing::warn!("acquisition timed out, entering hardware recovery");
                self.hardware_recovery();
            }
        }
    }

    /// Device fault (RX start or apply_cfg) invokes hardware recovery (§4.10,
    /// §7) rather than just being logged and left for the next cycle.
    fn apply_hw_config(&mut self, hw_cfg: &HwConfig) {
        if !self.rx_running {
            if let Err(e) = self.device.apply_cfg(hw_cfg) {
                tracing::warn!(error = %e, "apply_cfg failed before RX start, entering hardware recovery");
                self.hardware_recovery();
                return;
            }
            let sink = Arc::new(DualRingSink {
                large: self.large_ring.clone(),
                small: self.small_ring.clone(),
            });
            if let Err(e) = self.device.start_rx(sink) {
                tracing::warn!(error = %e, "start_rx failed, entering hardware recovery");
                self.hardware_recovery();
                return;
            }
            self.rx_running = true;
            self.last_applied_cfg = Some(*hw_cfg);
        } else if self.last_applied_cfg.as_ref().map(|c| c.roughly_eq(hw_cfg)) != Some(true) {
            // Never stop RX just to reconfigure (§4.9 step 4): re-apply in place.
            if let Err(e) = self.device.apply_cfg(hw_cfg) {
                tracing::warn!(error = %e, "apply_cfg failed while RX running, entering hardware recovery");
                self.hardware_recovery();
                return;
            }
            self.last_applied_cfg = Some(*hw_cfg);
        }
    }

    fn maybe_reinit_audio(&mut self, sample_rate_hz: f64) {
        if self.last_radio_sample_rate == Some(sample_rate_hz) {
            return;
        }
        self.last_radio_sample_rate = Some(sample_rate_hz);
        if let Some(worker) = self.audio_consumer.take() {
            worker.stop();
        }
        self.audio_started = false;
    }

    fn maybe_start_audio(&mut self) {
        if self.audio_started {
            return;
        }
        let Some(fs_in) = self.last_radio_sample_rate else {
            return;
        };
        let radio = FmRadio::new(FmRadioConfig {
            fs_in_hz: fs_in,
            fs_audio_hz: self.audio_fs_hz as f64,
            deemph_us: self.deemph_us,
        });
        let worker = (self.audio_start_fn)(self.small_ring.clone(), self.audio_chunk_bytes, radio);
        self.audio_consumer = Some(worker);
        self.audio_started = true;
    }

    fn wait_for_acquisition(&self, total_bytes: usize) -> bool {
        let deadline = Instant::now() + ACQUISITION_TIMEOUT;
        while Instant::now() < deadline {
            if self.large_ring.available() >= total_bytes {
                return true;
            }
            std::thread::sleep(ACQUISITION_POLL_INTERVAL);
        }
        false
    }

    fn publish_psd(&mut self, cfg: &DesiredCfg, resolved: &ResolvedParams) {
        let mut raw = vec![0u8; resolved.total_bytes];
        let n = self.large_ring.read(&mut raw);
        let samples = decode_iq(&raw[..n]);

        let mut result = execute_welch_psd(&samples, &resolved.psd_config);
        scale_psd_bins(&mut result.p_out, cfg.scale);

        let half_span = cfg.span_hz / 2.0;
        let mut start_idx = None;
        let mut end_idx = 0usize;
        for (i, &f) in result.f_out.iter().enumerate() {
            if f >= -half_span {
                if start_idx.is_none() {
                    start_idx = Some(i);
                }
                if f <= half_span {
                    end_idx = i;
                }
            }
        }
        let Some(start_idx) = start_idx else {
            return;
        };

        let center = cfg.center_freq_hz as f64;
        let message = PsdMessage {
            start_freq_hz: center + result.f_out[start_idx],
            end_freq_hz: center + result.f_out[end_idx],
            pxx: result.p_out[start_idx..=end_idx].to_vec(),
        };

        match serde_json::to_vec(&message) {
            Ok(bytes) => {
                if let Err(e) = self.control_link.send(&bytes) {
                    tracing::warn!(error = %e, "PSD publish failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "PSD message serialization failed"),
        }
    }

    /// §4.10: idempotent stop/close, bounded reopen retries.
    fn hardware_recovery(&mut self) -> bool {
        let _ = self.device.stop_rx();
        std::thread::sleep(RECOVERY_SETTLE);

        for attempt in 1..=RECOVERY_MAX_ATTEMPTS {
            std::thread::sleep(RECOVERY_RETRY_DELAY);
            match (self.reopen)() {
                Ok(device) => {
                    tracing::info!(attempt, "hardware recovery succeeded");
                    self.device = device;
                    self.rx_running = false;
                    self.last_applied_cfg = None;
                    return true;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "hardware recovery reopen failed");
                }
            }
        }
        false
    }
}
