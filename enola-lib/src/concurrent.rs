//! Bounded worker pool with a single merged output stream.
//!
//! A fixed set of work items is placed in a shared queue. At most `width` workers
//! pull items one at a time, run the handler, and push its output onto a bounded
//! channel. The consumer sees outputs in completion order, and the stream ends once
//! every worker has exited.

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

/// Output stream of a pool run.
pub type MergedStream<R> = Pin<Box<dyn Stream<Item = R> + Send>>;

/// Runs a handler over a fixed set of items with bounded concurrency.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    width: usize,
}

impl WorkerPool {
    /// Create a pool that keeps at most `width` handlers running at once.
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Start processing `items` and return the merged output stream.
    ///
    /// Workers stop pulling new items as soon as `cancel` fires, and an in-flight
    /// handler is dropped mid-way. The stream still terminates in that case, just
    /// with fewer outputs than items. Dropping the stream also stops the workers.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run<T, R, F, Fut>(
        &self,
        items: Vec<T>,
        handler: F,
        cancel: CancellationToken,
    ) -> MergedStream<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let worker_count = self.width.min(items.len());
        let queue = Arc::new(Mutex::new(items.into_iter()));
        let handler = Arc::new(handler);
        let (result_tx, result_rx) = mpsc::channel(self.width);

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let queue = queue.clone();
            let handler = handler.clone();
            let result_tx = result_tx.clone();
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }

                    let Some(item) = queue.lock().await.next() else {
                        break;
                    };

                    let output = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        output = (*handler)(item) => output,
                    };

                    let sent = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        sent = result_tx.send(output) => sent,
                    };

                    // Receiver gone: nobody is listening any more.
                    if sent.is_err() {
                        break;
                    }
                }
                trace!(worker_id, "worker exiting");
            }));
        }

        // Only workers hold senders now, so the stream ends when the last one exits.
        drop(result_tx);

        tokio::spawn(async move {
            for handle in handles {
                if let Err(e) = handle.await {
                    error!(error = %e, "worker task failed");
                }
            }
            if cancel.is_cancelled() {
                warn!("run cancelled, workers stopped early");
            } else {
                debug!("all workers exited");
            }
        });

        Box::pin(ReceiverStream::new(result_rx))
    }
}
