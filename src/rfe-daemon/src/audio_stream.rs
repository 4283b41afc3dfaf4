// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Opus encoding and TCP framing for the audio pipeline's output (§6, C12).
//!
//! Treated as an external collaborator by the core spec; grounded on this
//! system's `rf_audio.c` comment describing the wire format (`OPU0` magic,
//! `!IIIHH` header) and on this codebase's own length-prefixed audio framing
//! idiom (`trx-core`'s audio wire protocol) for the general shape.

use crate::env::BootstrapConfig;
use crate::fault_log::{classify_connect_error, FaultLogger};
use opus::{Application, Channels, Encoder};
use std::io::Write;
use std::net::TcpStream;
use std::time::{Duration, Instant};

const MAGIC: &[u8; 4] = b"OPU0";
const RECONNECT_INTERVAL: Duration = Duration::from_millis(200);

/// Encodes PCM16 audio frames as Opus and streams them, framed, to a single
/// TCP endpoint. Drops frames while disconnected rather than blocking the
/// audio thread (§7).
pub struct AudioStreamClient {
    host: String,
    port: u16,
    frame_samples: usize,
    sample_rate_hz: u32,
    encoder: Encoder,
    stream: Option<TcpStream>,
    last_connect_attempt: Instant,
    seq: u32,
    connect_fault_log: FaultLogger,
}

impl AudioStreamClient {
    pub fn new(cfg: &BootstrapConfig) -> rfe_core::DynResult<Self> {
        let mut encoder = Encoder::new(cfg.audio_fs_hz(), Channels::Mono, Application::Audio)?;
        encoder.set_bitrate(opus::Bitrate::Bits(cfg.opus_bitrate as i32))?;
        encoder.set_vbr(cfg.opus_vbr)?;
        encoder.set_complexity(cfg.opus_complexity() as u8)?;

        Ok(AudioStreamClient {
            host: cfg.audio_tcp_host.clone(),
            port: cfg.audio_tcp_port,
            frame_samples: cfg.opus_frame_samples() as usize,
            sample_rate_hz: cfg.audio_fs_hz(),
            encoder,
            stream: None,
            last_connect_attempt: Instant::now() - RECONNECT_INTERVAL,
            seq: 0,
            connect_fault_log: FaultLogger::new("audio stream connect", classify_connect_error),
        })
    }

    fn ensure_connected(&mut self) {
        if self.stream.is_some() {
            return;
        }
        if self.last_connect_attempt.elapsed() < RECONNECT_INTERVAL {
            return;
        }
        self.last_connect_attempt = Instant::now();
        match TcpStream::connect((self.host.as_str(), self.port)) {
            Ok(s) => {
                tracing::info!(host = %self.host, port = self.port, "audio stream connected");
                self.stream = Some(s);
            }
            Err(e) => {
                self.connect_fault_log.log(&e.to_string());
            }
        }
    }

    /// Accepts PCM16 samples, encoding and sending complete frames as they
    /// accumulate. Incomplete trailing samples are buffered by the caller.
    pub fn send_frame(&mut self, pcm: &[i16]) {
        debug_assert_eq!(pcm.len(), self.frame_samples);

        let mut opus_buf = vec![0u8; 4000];
        let encoded_len = match self.encoder.encode(pcm, &mut opus_buf) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "opus encode failed, dropping frame");
                return;
            }
        };
        opus_buf.truncate(encoded_len);

        self.ensure_connected();
        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        let mut header = Vec::with_capacity(20);
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(&self.seq.to_be_bytes());
        header.extend_from_slice(&0u32.to_be_bytes()); // timestamp (samples since start)
        header.extend_from_slice(&(opus_buf.len() as u32).to_be_bytes());
        header.extend_from_slice(&(self.sample_rate_hz as u16).to_be_bytes());
        header.extend_from_slice(&(self.frame_samples as u16).to_be_bytes());

        if stream.write_all(&header).and_then(|_| stream.write_all(&opus_buf)).is_err() {
            tracing::warn!("audio stream write failed, dropping connection");
            self.stream = None;
        } else {
            self.seq = self.seq.wrapping_add(1);
        }
    }
}

impl BootstrapConfig {
    fn opus_complexity(&self) -> u32 {
        self.opus_complexity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn test_cfg(port: u16) -> BootstrapConfig {
        BootstrapConfig {
            verbose: false,
            ipc_addr: String::new(),
            audio_tcp_host: "127.0.0.1".to_string(),
            audio_tcp_port: port,
            opus_frame_ms: 20,
            opus_bitrate: 32_000,
            opus_complexity: 5,
            opus_vbr: false,
        }
    }

    #[test]
    fn frames_are_length_prefixed_with_magic() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let cfg = test_cfg(port);

        let mut client = AudioStreamClient::new(&cfg).unwrap();
        let frame = vec![0i16; cfg.opus_frame_samples() as usize];

        let (conn, _) = std::thread::scope(|scope| {
            let handle = scope.spawn(|| listener.accept().unwrap());
            client.send_frame(&frame);
            handle.join().unwrap()
        });

        use std::io::Read;
        let mut conn = conn;
        let mut magic = [0u8; 4];
        conn.read_exact(&mut magic).unwrap();
        assert_eq!(&magic, MAGIC);
    }

    #[test]
    fn send_frame_without_listener_does_not_panic() {
        let cfg = test_cfg(1); // nothing listening on port 1
        let mut client = AudioStreamClient::new(&cfg).unwrap();
        let frame = vec![0i16; cfg.opus_frame_samples() as usize];
        client.send_frame(&frame);
    }
}
