//! Background writers for the editor's artifacts.
//!
//! [`RetrySaver`] runs at most one write at a time. Requests that arrive while
//! a write is in flight collapse into a single follow-up write, so the last
//! state always reaches storage. [`DebouncedSaver`] sits in front of it and
//! turns a burst of change notifications into one request.

use super::{PersistenceError, PersistenceResult};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

/// Serializes current state and writes it out.
pub type SaveTask = Arc<dyn Fn() -> PersistenceResult<()> + Send + Sync>;

#[derive(Debug, Default)]
struct SaveState {
    saving: bool,
    pending: bool,
}

struct RetryInner {
    name: String,
    task: SaveTask,
    max_attempts: u32,
    retry_delay: Duration,
    state: Mutex<SaveState>,
    busy: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct RetrySaver {
    inner: Arc<RetryInner>,
}

impl RetrySaver {
    /// `max_attempts` below one is treated as one.
    pub fn new(
        name: impl Into<String>,
        task: SaveTask,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            inner: Arc::new(RetryInner {
                name: name.into(),
                task,
                max_attempts: max_attempts.max(1),
                retry_delay,
                state: Mutex::new(SaveState::default()),
                busy,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Schedules a write. Returns `false` when a write is already running and
    /// this request was folded into its follow-up.
    ///
    /// Inside a tokio runtime the write runs in the background. Outside one it
    /// runs on the calling thread through [`RetrySaver::save_blocking`].
    pub fn request(&self) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            debug!(saver = %self.inner.name, "no runtime, saving on the calling thread");
            // save_blocking logs its own failure.
            let _ = self.save_blocking();
            return true;
        };

        {
            let mut state = self.inner.state.lock();
            if state.saving {
                state.pending = true;
                trace!(saver = %self.inner.name, "save in flight, marked pending");
                return false;
            }
            state.saving = true;
            self.inner.busy.send_replace(true);
        }

        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            loop {
                inner.write_with_retries().await;
                let again = {
                    let mut state = inner.state.lock();
                    if state.pending {
                        state.pending = false;
                        true
                    } else {
                        state.saving = false;
                        inner.busy.send_replace(false);
                        false
                    }
                };
                if !again {
                    break;
                }
                debug!(saver = %inner.name, "running coalesced follow-up save");
            }
        });
        true
    }

    pub fn is_saving(&self) -> bool {
        self.inner.state.lock().saving
    }

    /// Waits until no write is running or pending.
    pub async fn flush(&self) {
        let mut busy = self.inner.busy.subscribe();
        // The sender lives in `inner`, which we hold, so this cannot fail.
        let _ = busy.wait_for(|busy| !*busy).await;
    }

    /// One write on the calling thread, retried without delay.
    pub fn save_blocking(&self) -> PersistenceResult<()> {
        let mut attempt = 1;
        loop {
            match (self.inner.task)() {
                Ok(()) => {
                    debug!(saver = %self.inner.name, attempt, "blocking save done");
                    return Ok(());
                }
                Err(err) if attempt < self.inner.max_attempts => {
                    warn!(saver = %self.inner.name, attempt, error = %err, "blocking save failed, retrying");
                    attempt += 1;
                }
                Err(err) => {
                    error!(saver = %self.inner.name, attempt, error = %err, "blocking save gave up");
                    return Err(err);
                }
            }
        }
    }
}

impl RetryInner {
    /// Runs the task on the blocking pool; file writes must not stall a worker.
    async fn write_once(&self) -> PersistenceResult<()> {
        let task = Arc::clone(&self.task);
        match tokio::task::spawn_blocking(move || task()).await {
            Ok(result) => result,
            Err(err) => Err(PersistenceError::Io(io::Error::other(err))),
        }
    }

    async fn write_with_retries(&self) -> bool {
        for attempt in 1..=self.max_attempts {
            match self.write_once().await {
                Ok(()) => {
                    debug!(saver = %self.name, attempt, "saved");
                    return true;
                }
                Err(err) => {
                    warn!(saver = %self.name, attempt, max = self.max_attempts, error = %err, "save failed");
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        error!(
            saver = %self.name,
            attempts = self.max_attempts,
            "save retries exhausted, keeping in-memory state"
        );
        false
    }
}

/// Trailing-edge debounce in front of a [`RetrySaver`]. Each notification
/// restarts the quiet window; when it elapses one save is requested.
pub struct DebouncedSaver {
    notify: mpsc::UnboundedSender<()>,
    handle: JoinHandle<()>,
}

impl DebouncedSaver {
    /// Must be called from within a tokio runtime.
    pub fn new(saver: RetrySaver, window: Duration) -> Self {
        let (notify, mut changes) = mpsc::unbounded_channel::<()>();
        let handle = tokio::spawn(async move {
            while changes.recv().await.is_some() {
                let mut coalesced = 1u32;
                loop {
                    tokio::select! {
                        change = changes.recv() => match change {
                            Some(()) => coalesced += 1,
                            None => {
                                saver.request();
                                return;
                            }
                        },
                        _ = tokio::time::sleep(window) => break,
                    }
                }
                trace!(saver = %saver.name(), coalesced, "debounce window elapsed");
                saver.request();
            }
        });
        Self { notify, handle }
    }

    pub fn notify(&self) {
        if self.notify.send(()).is_err() {
            warn!("debounced saver already stopped");
        }
    }

    /// Drops any notification still inside the window.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for DebouncedSaver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
