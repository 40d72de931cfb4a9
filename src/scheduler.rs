use crate::calendar;
use crate::clock::Clock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Fires a callback at every local midnight until cancelled.
pub struct RegenerationTimer {
    cancel: Mutex<Option<oneshot::Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RegenerationTimer {
    /// Must be called from within a tokio runtime.
    pub fn start<F>(clock: Arc<dyn Clock>, mut on_midnight: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            loop {
                let now = clock.now();
                let wake_at = calendar::next_midnight(now);
                // A clock that already passed midnight still waits a tick.
                let delay = clock
                    .interval(now, wake_at)
                    .to_std()
                    .unwrap_or(Duration::from_millis(1));
                debug!(%now, %wake_at, ?delay, "regeneration timer armed");

                tokio::select! {
                    _ = &mut cancel_rx => {
                        debug!("regeneration timer cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {
                        info!(at = %clock.now(), "midnight reached, regenerating");
                        on_midnight();
                    }
                }
            }
        });

        Self {
            cancel: Mutex::new(Some(cancel_tx)),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Stops the timer. Calling it again is a no-op.
    pub fn cancel(&self) {
        if let Some(cancel) = self.cancel.lock().take() {
            // The task may already be gone; nothing to stop then.
            let _ = cancel.send(());
        }
        self.handle.lock().take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.lock().is_none()
    }
}

impl Drop for RegenerationTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
