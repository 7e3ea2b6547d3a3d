//! Live query subscription handle

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use taskstore::Task;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A live task list: the current result first, then one list per change
///
/// Dropping the handle cancels the producing task; nothing is delivered
/// through this handle afterwards.
pub struct TaskSubscription {
    rx: mpsc::Receiver<Vec<Task>>,
    handle: JoinHandle<()>,
}

impl TaskSubscription {
    /// Wrap a producer task and the receiving end of its channel
    pub fn new(rx: mpsc::Receiver<Vec<Task>>, handle: JoinHandle<()>) -> Self {
        Self { rx, handle }
    }

    /// Next result, or None once the producer has stopped
    pub async fn next(&mut self) -> Option<Vec<Task>> {
        self.rx.recv().await
    }

    /// Whether the producing task has stopped
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskSubscription {
    fn drop(&mut self) {
        debug!("TaskSubscription::drop: cancelling producer");
        self.rx.close();
        self.handle.abort();
    }
}

impl Stream for TaskSubscription {
    type Item = Vec<Task>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drop_aborts_producer() {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });
        let abort_probe = handle.abort_handle();
        let subscription = TaskSubscription::new(rx, handle);
        drop(subscription);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(abort_probe.is_finished());
    }

    #[tokio::test]
    async fn test_stream_yields_until_producer_ends() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(async move {
            tx.send(vec![]).await.unwrap();
            tx.send(vec![taskstore::Task::new("x")]).await.unwrap();
        });
        let subscription = TaskSubscription::new(rx, handle);
        let items: Vec<Vec<Task>> = subscription.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_empty());
        assert_eq!(items[1][0].name, "x");
    }
}
