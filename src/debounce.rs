use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Trailing-edge debouncer. Each `push` supersedes the pending value; the
/// last one is emitted once the input has been quiet for the configured
/// period. Dropping the debouncer cancels any pending emission.
pub struct Debouncer<T> {
    quiet: Duration,
    tx: mpsc::UnboundedSender<T>,
    rx: mpsc::UnboundedReceiver<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            quiet,
            tx,
            rx,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Must be called from within a tokio runtime.
    pub fn push(&mut self, value: T) {
        self.cancel();
        let tx = self.tx.clone();
        let quiet = self.quiet;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            let _ = tx.send(value);
        }));
    }

    /// Drops the pending value, including one already emitted but not yet
    /// received.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        while self.rx.try_recv().is_ok() {}
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Waits for the next settled value.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout, Instant};

    const QUIET: Duration = Duration::from_millis(250);

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_once_with_last_value() {
        let mut d = Debouncer::new(QUIET);
        let start = Instant::now();

        for text in ["p", "pu", "pun", "pune"] {
            d.push(text.to_string());
            sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(d.recv().await.as_deref(), Some("pune"));
        assert_eq!(start.elapsed(), Duration::from_millis(300 + 250));
        assert!(timeout(Duration::from_secs(5), d.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_emit_separately() {
        let mut d = Debouncer::new(QUIET);
        d.push(1);
        assert_eq!(d.recv().await, Some(1));
        d.push(2);
        d.push(3);
        assert_eq!(d.recv().await, Some(3));
        assert!(d.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_value() {
        let mut d = Debouncer::new(QUIET);
        d.push("stale");
        assert!(d.is_pending());
        d.cancel();
        assert!(!d.is_pending());
        assert!(timeout(Duration::from_secs(5), d.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_emitted_but_unreceived_value() {
        let mut d = Debouncer::new(QUIET);
        d.push("fired");
        sleep(Duration::from_millis(300)).await;
        d.cancel();
        assert!(d.try_recv().is_none());
    }
}
