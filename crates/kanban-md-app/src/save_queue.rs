//! FIFO persistence of whole-document writes.
//!
//! Every board mutation produces a complete document. Writes are handed to a
//! single worker task, so at most one is in flight and they land in the order
//! they were requested. While writes are pending (and for a short grace period
//! after the last one succeeds) the queue reports [`SaveQueue::is_saving`], which
//! lets the session ignore the change notifications its own writes cause.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::sink::DocumentSink;

/// Counters reported when the queue shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveStats {
    /// Writes that reached the sink.
    pub written: usize,
    /// Writes the sink rejected.
    pub failed: usize,
}

#[derive(Debug)]
struct QueueState {
    pending: AtomicUsize,
    written: AtomicUsize,
    failed: AtomicUsize,
    last_success: Mutex<Option<Instant>>,
    grace: Duration,
    idle: Notify,
}

impl QueueState {
    fn new(grace: Duration) -> Self {
        Self {
            pending: AtomicUsize::new(0),
            written: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            last_success: Mutex::new(None),
            grace,
            idle: Notify::new(),
        }
    }

    fn record(&self, ok: bool) {
        if ok {
            self.written.fetch_add(1, Ordering::SeqCst);
            *self
                .last_success
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn in_grace(&self) -> bool {
        self.last_success
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|at| at.elapsed() < self.grace)
    }

    fn stats(&self) -> SaveStats {
        SaveStats {
            written: self.written.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Serializes document writes through one worker task.
#[derive(Debug)]
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<String>,
    state: Arc<QueueState>,
    worker: JoinHandle<()>,
}

impl SaveQueue {
    /// Start the worker writing into `sink`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S: DocumentSink>(sink: S, grace: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(QueueState::new(grace));
        let worker = tokio::spawn(run_worker(sink, rx, Arc::clone(&state)));
        Self { tx, state, worker }
    }

    /// Queue `text` to be written after every write queued before it.
    pub fn enqueue(&self, text: String) {
        self.state.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(text).is_err() {
            warn!("save worker is gone; dropping document write");
            self.state.record(false);
        }
    }

    /// True while writes are pending or the last write finished within the grace period.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.pending() > 0 || self.state.in_grace()
    }

    /// Number of writes queued or in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.pending.load(Ordering::SeqCst)
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> SaveStats {
        self.state.stats()
    }

    /// Wait until every queued write has finished.
    pub async fn flush(&self) {
        loop {
            let idle = self.state.idle.notified();
            if self.pending() == 0 {
                return;
            }
            idle.await;
        }
    }

    /// Close the queue, wait for the remaining writes and return the final counters.
    pub async fn shutdown(self) -> SaveStats {
        let Self { tx, state, worker } = self;
        drop(tx);
        if let Err(err) = worker.await {
            warn!(error = %err, "save worker terminated abnormally");
        }
        state.stats()
    }
}

async fn run_worker<S: DocumentSink>(
    sink: S,
    mut rx: mpsc::UnboundedReceiver<String>,
    state: Arc<QueueState>,
) {
    while let Some(text) = rx.recv().await {
        let bytes = text.len();
        match sink.write(text).await {
            Ok(()) => {
                debug!(bytes, "document saved");
                state.record(true);
            }
            Err(err) => {
                warn!(error = %err, "failed to save document");
                state.record(false);
            }
        }
    }
    debug!("save worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;
    use std::future::Future;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Clone, Default)]
    struct RecordingSink {
        writes: Arc<AsyncMutex<Vec<String>>>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl DocumentSink for RecordingSink {
        fn write(&self, text: String) -> impl Future<Output = Result<(), SinkError>> + Send {
            let sink = self.clone();
            async move {
                let now = sink.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                sink.max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                sink.in_flight.fetch_sub(1, Ordering::SeqCst);
                if text.contains("fail") {
                    return Err(SinkError::Rejected(text));
                }
                sink.writes.lock().await.push(text);
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn writes_land_in_order_one_at_a_time() {
        let sink = RecordingSink::default();
        let queue = SaveQueue::spawn(sink.clone(), Duration::ZERO);
        for n in 0..20 {
            queue.enqueue(format!("doc {n}"));
        }
        queue.flush().await;

        let writes = sink.writes.lock().await.clone();
        let expected: Vec<String> = (0..20).map(|n| format!("doc {n}")).collect();
        assert_eq!(writes, expected);
        assert_eq!(sink.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(queue.shutdown().await, SaveStats { written: 20, failed: 0 });
    }

    #[tokio::test]
    async fn failed_write_does_not_block_later_ones() {
        let sink = RecordingSink::default();
        let queue = SaveQueue::spawn(sink.clone(), Duration::ZERO);
        queue.enqueue("first".into());
        queue.enqueue("fail here".into());
        queue.enqueue("third".into());

        let stats = queue.shutdown().await;
        assert_eq!(stats, SaveStats { written: 2, failed: 1 });
        assert_eq!(*sink.writes.lock().await, vec!["first", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn saving_flag_outlives_the_queue_by_the_grace_period() {
        let queue = SaveQueue::spawn(RecordingSink::default(), Duration::from_millis(100));
        assert!(!queue.is_saving());

        queue.enqueue("doc".into());
        assert!(queue.is_saving());
        queue.flush().await;
        assert_eq!(queue.pending(), 0);
        assert!(queue.is_saving());

        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(!queue.is_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_releases_the_flag_immediately() {
        let queue = SaveQueue::spawn(RecordingSink::default(), Duration::from_millis(100));
        queue.enqueue("fail".into());
        queue.flush().await;
        assert!(!queue.is_saving());
        assert_eq!(queue.stats().failed, 1);
    }

    #[tokio::test]
    async fn flush_on_idle_queue_returns() {
        let queue = SaveQueue::spawn(RecordingSink::default(), Duration::ZERO);
        queue.flush().await;
        assert_eq!(queue.shutdown().await, SaveStats::default());
    }
}
