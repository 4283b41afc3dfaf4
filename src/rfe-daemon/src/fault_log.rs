// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Rate-limited repeated-fault logging (§10.1). Grounded directly on this
//! codebase's `trx-server/src/audio.rs`: `StreamErrorLogger` /
//! `classify_stream_error` / `AUDIO_STREAM_ERROR_LOG_INTERVAL` — log the
//! first occurrence of a fault class at `error`, suppress identical
//! recurrences, and emit a periodic suppressed-count summary at `warn`
//! instead of spamming one line per retry.

use std::sync::Mutex;
use std::time::{Duration, Instant};

const FAULT_LOG_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Default)]
struct FaultState {
    last_kind: Option<&'static str>,
    last_error: Option<String>,
    last_logged_at: Option<Instant>,
    suppressed: u64,
}

/// Classifies and rate-limits repeated faults under one label, e.g. "audio
/// stream connect" or "device open".
pub struct FaultLogger {
    label: &'static str,
    classify: fn(&str) -> &'static str,
    state: Mutex<FaultState>,
}

impl FaultLogger {
    pub fn new(label: &'static str, classify: fn(&str) -> &'static str) -> Self {
        FaultLogger {
            label,
            classify,
            state: Mutex::new(FaultState::default()),
        }
    }

    pub fn log(&self, err: &str) {
        let now = Instant::now();
        let kind = (self.classify)(err);
        let mut state = self.state.lock().expect("fault logger mutex poisoned");

        if state.last_kind != Some(kind) {
            if state.suppressed > 0 {
                tracing::warn!(
                    "{} repeated {} times: {}",
                    self.label,
                    state.suppressed,
                    state.last_error.as_deref().unwrap_or("<unknown>")
                );
            }
            tracing::error!("{}: {}", self.label, err);
            state.last_kind = Some(kind);
            state.last_error = Some(err.to_string());
            state.last_logged_at = Some(now);
            state.suppressed = 0;
            return;
        }

        state.suppressed += 1;
        let due = state
            .last_logged_at
            .map(|ts| now.duration_since(ts) >= FAULT_LOG_INTERVAL)
            .unwrap_or(false);
        if due {
            tracing::warn!(
                "{} recurring ({} repeats/{}s): {}",
                self.label,
                state.suppressed,
                FAULT_LOG_INTERVAL.as_secs(),
                state.last_error.as_deref().unwrap_or("<unknown>")
            );
            state.last_logged_at = Some(now);
            state.suppressed = 0;
        } else {
            state.last_error = Some(err.to_string());
        }
    }
}

/// Classifier for audio TCP connect failures.
pub fn classify_connect_error(err: &str) -> &'static str {
    if err.contains("refused") {
        "connection_refused"
    } else if err.contains("timed out") || err.contains("timeout") {
        "timeout"
    } else if err.contains("unreachable") || err.contains("No route to host") {
        "network_unreachable"
    } else {
        "other_connect_error"
    }
}

/// Classifier for SDR device open failures.
pub fn classify_device_error(err: &str) -> &'static str {
    if err.contains("busy") || err.contains("Busy") || err.contains("in use") {
        "device_busy"
    } else if err.contains("not found") || err.contains("No such") {
        "device_not_found"
    } else {
        "other_device_error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn classify_always_same(_: &str) -> &'static str {
        "same_kind"
    }

    #[test]
    fn first_occurrence_and_repeats_are_both_tracked() {
        let logger = FaultLogger::new("test fault", classify_always_same);
        logger.log("boom 1");
        logger.log("boom 2");
        logger.log("boom 3");

        let state = logger.state.lock().unwrap();
        assert_eq!(state.suppressed, 2);
        assert_eq!(state.last_error.as_deref(), Some("boom 3"));
    }

    #[test]
    fn changing_fault_class_resets_suppression() {
        fn classify(err: &str) -> &'static str {
            if err.contains("a") {
                "kind_a"
            } else {
                "kind_b"
            }
        }
        let logger = FaultLogger::new("test fault", classify);
        logger.log("aaa");
        logger.log("aaa");
        logger.log("bbb");

        let state = logger.state.lock().unwrap();
        assert_eq!(state.last_kind, Some("kind_b"));
        assert_eq!(state.suppressed, 0);
    }

    #[test]
    fn classify_connect_error_distinguishes_kinds() {
        assert_eq!(classify_connect_error("Connection refused"), "connection_refused");
        assert_eq!(classify_connect_error("operation timed out"), "timeout");
        assert_eq!(classify_connect_error("something else"), "other_connect_error");
    }

    #[test]
    fn does_not_double_count_when_called_concurrently() {
        // Not a true concurrency stress test, just confirms the mutex is
        // actually exercised without poisoning across repeated calls.
        let logger = FaultLogger::new("test fault", classify_always_same);
        let calls = AtomicUsize::new(0);
        for _ in 0..10 {
            logger.log("x");
            calls.fetch_add(1, Ordering::Relaxed);
        }
        assert_eq!(calls.load(Ordering::Relaxed), 10);
    }
}
