//! Cooperative watch sessions.
//!
//! A session is a background thread blocked on a single-slot channel. Change
//! notifications are coalesced: while one is pending, further ones are dropped.
//! Stopping never blocks and never waits for the thread, so it is safe to call
//! from inside the callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread;
use tracing::{debug, info};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Signals delivered to a session's waiter thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchSignal {
    Changed,
    Stop,
}

/// Outcome of [`WatchSession::notify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The change was queued for the waiter.
    Queued,
    /// A change was already pending; this one was folded into it.
    Coalesced,
    /// The session has ended.
    Inactive,
}

/// One running watch.
#[derive(Debug)]
pub struct WatchSession {
    id: u64,
    sender: Option<SyncSender<WatchSignal>>,
    active: Arc<AtomicBool>,
}

impl WatchSession {
    /// Spawn the waiter thread. `callback` runs once per delivered change
    /// while the session is active.
    pub fn start<F>(mut callback: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::sync_channel(1);
        let active = Arc::new(AtomicBool::new(true));

        let flag = Arc::clone(&active);
        thread::Builder::new()
            .name(format!("buildcfg-watch-{}", id))
            .spawn(move || wait_for_signals(id, receiver, &flag, &mut callback))?;

        info!(session = id, "Started configuration watch");
        Ok(Self {
            id,
            sender: Some(sender),
            active,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Deliver a change notification without blocking.
    pub fn notify(&self) -> NotifyOutcome {
        if !self.is_active() {
            return NotifyOutcome::Inactive;
        }
        let Some(sender) = &self.sender else {
            return NotifyOutcome::Inactive;
        };
        match sender.try_send(WatchSignal::Changed) {
            Ok(()) => NotifyOutcome::Queued,
            Err(TrySendError::Full(_)) => NotifyOutcome::Coalesced,
            Err(TrySendError::Disconnected(_)) => NotifyOutcome::Inactive,
        }
    }

    /// End the session. Safe to call more than once.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(sender) = self.sender.take() {
            // A full slot is fine: dropping the sender below wakes the waiter.
            let _ = sender.try_send(WatchSignal::Stop);
            debug!(session = self.id, "Stopped configuration watch");
        }
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn wait_for_signals<F: FnMut()>(
    id: u64,
    receiver: Receiver<WatchSignal>,
    active: &AtomicBool,
    callback: &mut F,
) {
    while let Ok(signal) = receiver.recv() {
        match signal {
            WatchSignal::Stop => break,
            WatchSignal::Changed => {
                if !active.load(Ordering::Acquire) {
                    break;
                }
                debug!(session = id, "Configuration change signalled");
                callback();
            }
        }
    }
    debug!(session = id, "Watch waiter exiting");
}
