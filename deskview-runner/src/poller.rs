//! Cancellable periodic task bound to a view's lifetime.
//!
//! One named thread per view. The first poll runs immediately, then once per
//! interval, measured from the start of the previous poll. Polls within a
//! view are sequential. Cancelling wakes the sleeping thread at once; a poll
//! that completes after cancellation is dropped instead of being sent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Shared cancellation flag. Checked before every poll and before every send.
///
/// The check and the send happen under `gate`, and `cancel` takes the same
/// gate, so once `cancel` returns no further message is sent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    gate: Arc<Mutex<()>>,
}

enum Delivery {
    Sent,
    Cancelled,
    Disconnected,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn send_unless_cancelled<M>(&self, tx: &Sender<M>, msg: M) -> Delivery {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_cancelled() {
            return Delivery::Cancelled;
        }
        match tx.send(msg) {
            Ok(()) => Delivery::Sent,
            Err(_) => Delivery::Disconnected,
        }
    }
}

/// Owner of a running poller. Dropping it cancels the poller without joining.
pub struct PollHandle {
    name: String,
    token: CancelToken,
    wake: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop scheduling polls. An in-flight poll finishes but its result is discarded.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            info!(poller = %self.name, "poller cancelled");
        }
        self.token.cancel();
        let _ = self.wake.send(());
    }

    /// Cancel and wait for the thread to exit.
    pub fn join(mut self) {
        self.cancel();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
        let _ = self.wake.send(());
    }
}

/// Spawn a poller thread.
///
/// `poll` receives a per-poller sequence number (0, 1, 2, ...) and returns the
/// message to send. The loop ends on cancellation or when the receiver is gone.
pub fn spawn_poller<M, F>(
    name: &str,
    interval: Duration,
    tx: Sender<M>,
    mut poll: F,
) -> std::io::Result<PollHandle>
where
    M: Send + 'static,
    F: FnMut(u64) -> M + Send + 'static,
{
    let token = CancelToken::new();
    let (wake_tx, wake_rx) = mpsc::channel::<()>();
    let thread_token = token.clone();
    let thread_name = format!("deskview-poll-{name}");
    let label = name.to_string();

    let thread = thread::Builder::new()
        .name(thread_name)
        .spawn(move || {
            let mut seq = 0u64;
            let mut next = Instant::now();
            loop {
                if thread_token.is_cancelled() {
                    break;
                }
                let msg = poll(seq);
                match thread_token.send_unless_cancelled(&tx, msg) {
                    Delivery::Sent => {}
                    Delivery::Cancelled => {
                        debug!(poller = %label, seq, "discarding poll result after cancellation");
                        break;
                    }
                    Delivery::Disconnected => {
                        debug!(poller = %label, "receiver gone, stopping");
                        break;
                    }
                }
                seq += 1;

                // A poll slower than the interval starts the next one at once
                // and re-anchors the schedule.
                next += interval;
                let now = Instant::now();
                if next < now {
                    next = now;
                }
                match wake_rx.recv_timeout(next - now) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })?;

    info!(poller = %name, interval_ms = interval.as_millis() as u64, "poller started");

    Ok(PollHandle {
        name: name.to_string(),
        token,
        wake: wake_tx,
        thread: Some(thread),
    })
}
