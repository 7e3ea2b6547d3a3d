//! FilterPipeline - one live, correctly ordered task list
//!
//! Combines the latest search text and filter preferences into a single
//! store subscription. Whenever either input changes, the current
//! subscription is dropped before the replacement is opened, so results from
//! a superseded query never reach the consumer.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use taskstore::{Task, TaskQuery};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::preferences::FilterPreferences;
use crate::state::{TaskManager, TaskSubscription};

/// Anything that can open a live query
pub trait TaskSource: Send + Sync + 'static {
    fn subscribe(&self, query: TaskQuery) -> TaskSubscription;
}

impl TaskSource for TaskManager {
    fn subscribe(&self, query: TaskQuery) -> TaskSubscription {
        TaskManager::subscribe(self, query)
    }
}

/// Live filtered task list
///
/// Yields the current list first, then a fresh list whenever the tasks,
/// the search text or the preferences change. Dropping it cancels the
/// pipeline and its store subscription.
pub struct FilterPipeline {
    rx: mpsc::Receiver<Vec<Task>>,
    handle: JoinHandle<()>,
}

impl FilterPipeline {
    /// Start a pipeline over `source` driven by the two input channels
    pub fn spawn(
        source: impl TaskSource,
        search: watch::Receiver<String>,
        preferences: watch::Receiver<FilterPreferences>,
        capacity: usize,
    ) -> Self {
        debug!(capacity, "FilterPipeline::spawn: called");
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(pipeline_loop(source, search, preferences, tx));
        Self { rx, handle }
    }

    /// Next list, or None once the pipeline has stopped
    pub async fn next(&mut self) -> Option<Vec<Task>> {
        self.rx.recv().await
    }
}

impl Drop for FilterPipeline {
    fn drop(&mut self) {
        debug!("FilterPipeline::drop: cancelling");
        self.rx.close();
        self.handle.abort();
    }
}

impl Stream for FilterPipeline {
    type Item = Vec<Task>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Input channels and whether their senders are still alive
struct Inputs {
    search: watch::Receiver<String>,
    preferences: watch::Receiver<FilterPreferences>,
    search_open: bool,
    preferences_open: bool,
}

impl Inputs {
    /// Query from the latest values, marking both as seen
    fn current_query(&mut self) -> TaskQuery {
        let search = self.search.borrow_and_update().clone();
        let prefs = *self.preferences.borrow_and_update();
        TaskQuery::new(search, prefs.sort_order, prefs.hide_completed)
    }

    /// Resolves when either input changes; pending forever once both are closed
    async fn changed(&mut self) {
        loop {
            tokio::select! {
                biased;
                res = self.search.changed(), if self.search_open => match res {
                    Ok(()) => return,
                    Err(_) => {
                        debug!("Inputs::changed: search sender gone, keeping last value");
                        self.search_open = false;
                    }
                },
                res = self.preferences.changed(), if self.preferences_open => match res {
                    Ok(()) => return,
                    Err(_) => {
                        debug!("Inputs::changed: preference sender gone, keeping last value");
                        self.preferences_open = false;
                    }
                },
                else => std::future::pending::<()>().await,
            }
        }
    }
}

async fn pipeline_loop(
    source: impl TaskSource,
    search: watch::Receiver<String>,
    preferences: watch::Receiver<FilterPreferences>,
    out: mpsc::Sender<Vec<Task>>,
) {
    let mut inputs = Inputs {
        search,
        preferences,
        search_open: true,
        preferences_open: true,
    };
    info!("FilterPipeline started");

    loop {
        let query = inputs.current_query();
        debug!(?query, "pipeline_loop: subscribing");
        let mut subscription = source.subscribe(query);

        'current: loop {
            // input changes win over results so a stale list is never forwarded
            let tasks = tokio::select! {
                biased;
                _ = inputs.changed() => break 'current,
                item = subscription.next() => match item {
                    Some(tasks) => tasks,
                    None => {
                        info!("FilterPipeline stopped: task source ended");
                        return;
                    }
                },
            };

            tokio::select! {
                biased;
                _ = inputs.changed() => break 'current,
                permit = out.reserve() => match permit {
                    Ok(permit) => permit.send(tasks),
                    Err(_) => {
                        debug!("pipeline_loop: consumer dropped");
                        return;
                    }
                },
            }
        }

        // cancel before the replacement exists
        drop(subscription);
    }
}
