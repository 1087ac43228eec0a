//! In-process FIFO task queue with a single consumer.
use color_eyre::eyre::eyre;
use log::*;
use std::future::Future;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{CaretakerError, Result};

/// Runs queued items through one handler, one at a time, in push order.
/// A failed item is logged and the consumer moves on to the next one.
pub struct TaskQueue<T> {
    sender: mpsc::UnboundedSender<T>,
    worker: JoinHandle<usize>,
}

impl<T: Send + 'static> TaskQueue<T> {
    pub fn spawn<F, Fut>(mut handler: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<T>();

        let worker = tokio::spawn(async move {
            let mut processed = 0;
            while let Some(item) = receiver.recv().await {
                processed += 1;
                if let Err(err) = handler(item).await {
                    error!("queued task #{processed} failed: {err}");
                }
            }
            debug!("task queue closed after {processed} task(s)");
            processed
        });

        Self { sender, worker }
    }

    pub fn push(&self, item: T) -> Result<()> {
        self.sender
            .send(item)
            .map_err(|_| CaretakerError::Other(eyre!("task queue is closed")))
    }

    /// Stop accepting items, wait for the backlog to drain and return how
    /// many items were processed.
    pub async fn shutdown(self) -> Result<usize> {
        drop(self.sender);
        self.worker
            .await
            .map_err(|e| CaretakerError::Other(eyre!("task queue worker: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn processes_items_in_push_order() {
        let seen = Arc::new(Mutex::new(vec![]));
        let sink = seen.clone();

        let queue = TaskQueue::spawn(move |item: u32| {
            let sink = sink.clone();
            async move {
                sink.lock().await.push(item);
                Ok(())
            }
        });

        for item in 1..=5 {
            queue.push(item).unwrap();
        }

        assert_eq!(queue.shutdown().await.unwrap(), 5);
        assert_eq!(*seen.lock().await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn failed_item_does_not_stop_the_queue() {
        let seen = Arc::new(Mutex::new(vec![]));
        let sink = seen.clone();

        let queue = TaskQueue::spawn(move |item: &'static str| {
            let sink = sink.clone();
            async move {
                if item == "bad" {
                    return Err(CaretakerError::Worker("bad item".into()));
                }
                sink.lock().await.push(item);
                Ok(())
            }
        });

        queue.push("first").unwrap();
        queue.push("bad").unwrap();
        queue.push("last").unwrap();

        assert_eq!(queue.shutdown().await.unwrap(), 3);
        assert_eq!(*seen.lock().await, vec!["first", "last"]);
    }

    #[tokio::test]
    async fn items_run_one_at_a_time() {
        let running = Arc::new(Mutex::new(0u32));
        let max_seen = Arc::new(Mutex::new(0u32));
        let (running_ref, max_ref) = (running.clone(), max_seen.clone());

        let queue = TaskQueue::spawn(move |_: u32| {
            let (running, max_seen) = (running_ref.clone(), max_ref.clone());
            async move {
                {
                    let mut running = running.lock().await;
                    *running += 1;
                    let mut max_seen = max_seen.lock().await;
                    *max_seen = (*max_seen).max(*running);
                }
                tokio::task::yield_now().await;
                *running.lock().await -= 1;
                Ok(())
            }
        });

        for item in 0..10 {
            queue.push(item).unwrap();
        }
        queue.shutdown().await.unwrap();

        assert_eq!(*max_seen.lock().await, 1);
    }
}
