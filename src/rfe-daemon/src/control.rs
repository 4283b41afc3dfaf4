// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Reliable PAIR-style control link with watchdog-driven reconnection (§4.8,
//! C9). Grounded directly on this system's `zmq_util.c`/`.h`: a `ZMQ_PAIR`
//! socket with `LINGER=0` and a 500 ms receive timeout, a background
//! listener thread, and a 10 s silence watchdog that forces reconnection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

const RECV_TIMEOUT_MS: i32 = 500;
const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport faults at the control link. `Transient` covers the routine
/// per-poll timeout; `Permanent` is a socket-level failure forcing reconnect.
#[derive(Debug, Error)]
pub enum ControlLinkError {
    #[error("transient receive timeout")]
    Transient,
    #[error("permanent socket failure: {0}")]
    Permanent(String),
}

fn connect(ctx: &zmq::Context, addr: &str) -> Result<zmq::Socket, ControlLinkError> {
    let socket = ctx
        .socket(zmq::PAIR)
        .map_err(|e| ControlLinkError::Permanent(e.to_string()))?;
    socket
        .set_linger(0)
        .map_err(|e| ControlLinkError::Permanent(e.to_string()))?;
    socket
        .set_rcvtimeo(RECV_TIMEOUT_MS)
        .map_err(|e| ControlLinkError::Permanent(e.to_string()))?;
    socket
        .connect(addr)
        .map_err(|e| ControlLinkError::Permanent(e.to_string()))?;
    Ok(socket)
}

/// A bidirectional control channel: inbound payloads are dispatched to a
/// user callback on a background thread; outbound sends are non-blocking.
pub struct ControlLink {
    socket: Arc<Mutex<zmq::Socket>>,
    running: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ControlLink {
    pub fn start<F>(addr: String, on_message: F) -> rfe_core::DynResult<Self>
    where
        F: Fn(&[u8]) + Send + 'static,
    {
        let ctx = zmq::Context::new();
        let socket = connect(&ctx, &addr)?;
        let socket = Arc::new(Mutex::new(socket));
        let running = Arc::new(AtomicBool::new(true));

        let thread_running = running.clone();
        let thread_socket = socket.clone();
        let thread_addr = addr.clone();

        let handle = std::thread::Builder::new()
            .name("rfe-control-link".into())
            .spawn(move || {
                let mut last_msg = Instant::now();
                let mut buf = vec![0u8; 4096];

                while thread_running.load(Ordering::Relaxed) {
                    let recv_result = {
                        let socket = thread_socket.lock().unwrap();
                        socket.recv_into(&mut buf, 0)
                    };

                    match recv_result {
                        Ok(len) => {
                            last_msg = Instant::now();
                            on_message(&buf[..len]);
                        }
                        Err(zmq::Error::EAGAIN) => {
                            if last_msg.elapsed() > WATCHDOG_TIMEOUT {
                                tracing::warn!(addr = %thread_addr, "control link silent, reconnecting");
                                match connect(&ctx, &thread_addr) {
                                    Ok(new_socket) => {
                                        *thread_socket.lock().unwrap() = new_socket;
                                        last_msg = Instant::now();
                                    }
                                    Err(e) => {
                                        tracing::warn!(error = %e, "control link reconnect failed");
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "control link recv error");
                        }
                    }
                }
            })?;

        Ok(ControlLink {
            socket,
            running,
            handle: Some(handle),
        })
    }

    /// Sends `payload` without blocking (§4.8). Drops the message on a full
    /// send queue rather than stalling the caller.
    pub fn send(&self, payload: &[u8]) -> Result<(), ControlLinkError> {
        let socket = self.socket.lock().unwrap();
        socket
            .send(payload, zmq::DONTWAIT)
            .map_err(|e| ControlLinkError::Permanent(e.to_string()))
    }

    pub fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ControlLink {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
