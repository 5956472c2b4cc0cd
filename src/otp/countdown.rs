use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Resend countdown, ticking once per second down to zero. Restarting
/// replaces the running timer; dropping it stops the timer.
pub struct Countdown {
    tx: Arc<watch::Sender<u32>>,
    rx: watch::Receiver<u32>,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(0);
        Self {
            tx: Arc::new(tx),
            rx,
            task: None,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, secs: u32) {
        self.stop();
        let _ = self.tx.send(secs);
        if secs == 0 {
            return;
        }

        let tx = Arc::clone(&self.tx);
        self.task = Some(tokio::spawn(async move {
            let mut remaining = secs;
            while remaining > 0 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                remaining -= 1;
                if tx.send(remaining).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn remaining(&self) -> u32 {
        *self.rx.borrow()
    }

    pub fn is_running(&self) -> bool {
        let ticking = self
            .task
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false);
        ticking && self.remaining() > 0
    }

    /// Receiver for rendering the countdown as it changes.
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.rx.clone()
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}
