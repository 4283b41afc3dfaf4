// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Process bootstrap for the SDR acquisition and DSP engine daemon.

mod audio_stream;
mod config_msg;
mod consumer;
mod control;
mod device;
mod env;
mod fault_log;
mod supervisor;

use audio_stream::AudioStreamClient;
use consumer::ConsumerWorker;
use control::ControlLink;
use device::{MockSdrDevice, SdrDevice};
use env::BootstrapConfig;
use rfe_core::{decode_iq, RingBuffer};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use supervisor::{PendingConfig, Supervisor};

/// Large acquisition ring target: ≈100 MB of interleaved 8-bit IQ (§2).
const LARGE_RING_BYTES: usize = 100 * 1024 * 1024;
/// Small ring: a handful of audio consumer chunks (§2).
const AUDIO_CHUNK_BYTES: usize = 16_384;
const SMALL_RING_BYTES: usize = AUDIO_CHUNK_BYTES * 8;

fn mock_device_factory() -> rfe_core::DynResult<Box<dyn SdrDevice>> {
    Ok(Box::new(MockSdrDevice::new(4096, Duration::from_millis(2))))
}

fn main() {
    let bootstrap = BootstrapConfig::from_env();
    rfe_app::logging::init_logging(bootstrap.verbose);

    tracing::info!(ipc_addr = %bootstrap.ipc_addr, "starting rf acquisition engine");

    let large_ring = Arc::new(RingBuffer::new(LARGE_RING_BYTES));
    let small_ring = Arc::new(RingBuffer::new(SMALL_RING_BYTES));
    let pending = PendingConfig::new();

    let control_pending = pending.clone();
    let control_link = match ControlLink::start(bootstrap.ipc_addr.clone(), move |payload| {
        match config_msg::parse_desired_cfg(payload) {
            Ok(cfg) => control_pending.publish(cfg),
            Err(e) => tracing::warn!(error = %e, "dropping unparseable config message"),
        }
    }) {
        Ok(link) => Arc::new(link),
        Err(e) => {
            tracing::error!(error = %e, "failed to start control link");
            std::process::exit(1);
        }
    };

    let device = device::open_with_retry(mock_device_factory);
    let running = Arc::new(AtomicBool::new(true));

    let audio_fs_hz = bootstrap.audio_fs_hz();
    let frame_samples = bootstrap.opus_frame_samples() as usize;
    let audio_cfg = bootstrap.clone();

    let audio_start_fn: Box<
        dyn FnMut(Arc<RingBuffer>, usize, rfe_core::FmRadio) -> ConsumerWorker,
    > = Box::new(move |ring, chunk, mut radio| {
        let audio_cfg = audio_cfg.clone();
        let mut client = AudioStreamClient::new(&audio_cfg)
            .expect("opus encoder configuration from bootstrap env must be valid");
        let mut pcm_buf: Vec<i16> = Vec::with_capacity(frame_samples * 2);

        ConsumerWorker::start(ring, chunk, move |bytes| {
            let samples = decode_iq(bytes);
            let pcm = radio.process(&samples);
            pcm_buf.extend_from_slice(&pcm);

            while pcm_buf.len() >= frame_samples {
                let frame: Vec<i16> = pcm_buf.drain(..frame_samples).collect();
                client.send_frame(&frame);
            }
        })
    });

    let mut supervisor = Supervisor::new(
        device,
        Box::new(mock_device_factory),
        large_ring,
        small_ring,
        pending,
        control_link,
        audio_fs_hz,
        75.0,
        AUDIO_CHUNK_BYTES,
        audio_start_fn,
        running.clone(),
    );

    supervisor.run();
}
