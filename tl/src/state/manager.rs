//! TaskManager - actor that owns the task repository
//!
//! Processes commands via channels for serialised access to task storage and
//! drives live query subscriptions from the change broadcast.

use taskstore::{Task, TaskId, TaskQuery, TaskRepository};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::SubscriptionConfig;

use super::messages::{StateCommand, StateError, StateResponse};
use super::subscription::TaskSubscription;

/// Event broadcast after a mutation has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A task was inserted or replaced
    TaskInserted { id: TaskId, version: u64 },
    /// A task record was updated
    TaskUpdated { id: TaskId, version: u64 },
    /// A task was deleted
    TaskDeleted { id: TaskId, version: u64 },
    /// Completed tasks were deleted in bulk
    CompletedDeleted { count: usize, version: u64 },
}

impl StoreEvent {
    /// Mutation counter after this change
    pub fn version(&self) -> u64 {
        match self {
            Self::TaskInserted { version, .. }
            | Self::TaskUpdated { version, .. }
            | Self::TaskDeleted { version, .. }
            | Self::CompletedDeleted { version, .. } => *version,
        }
    }
}

/// Handle to send commands to the TaskManager
#[derive(Clone)]
pub struct TaskManager {
    tx: mpsc::Sender<StateCommand>,
    /// Broadcast sender for change notifications
    event_tx: broadcast::Sender<StoreEvent>,
    /// Result buffer per subscription
    channel_capacity: usize,
}

impl TaskManager {
    /// Spawn a TaskManager actor with default channel sizes
    pub fn spawn(repo: impl TaskRepository + 'static) -> Self {
        Self::spawn_with_config(repo, &SubscriptionConfig::default())
    }

    /// Spawn a TaskManager actor
    pub fn spawn_with_config(repo: impl TaskRepository + 'static, config: &SubscriptionConfig) -> Self {
        debug!(?config, "TaskManager::spawn_with_config: called");
        let (tx, rx) = mpsc::channel(256);
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));

        tokio::spawn(actor_loop(Box::new(repo), rx, event_tx.clone()));

        info!("TaskManager spawned");

        Self {
            tx,
            event_tx,
            channel_capacity: config.channel_capacity.max(1),
        }
    }

    /// Subscribe to raw change events
    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    /// Open a live subscription for `query`
    ///
    /// The subscription yields the current result immediately and then a new
    /// list whenever a mutation changes that result.
    pub fn subscribe(&self, query: TaskQuery) -> TaskSubscription {
        debug!(?query, "subscribe: called");
        // subscribe before the first query so no change slips between them
        let events = self.event_tx.subscribe();
        let (out_tx, out_rx) = mpsc::channel(self.channel_capacity);
        let handle = tokio::spawn(subscription_loop(self.tx.clone(), query, events, out_tx));
        TaskSubscription::new(out_rx, handle)
    }

    /// One-off query
    pub async fn query(&self, query: TaskQuery) -> StateResponse<Vec<Task>> {
        debug!(?query, "query: called");
        request_query(&self.tx, query).await
    }

    /// Get a task by id
    pub async fn get(&self, id: TaskId) -> StateResponse<Option<Task>> {
        debug!(%id, "get: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::Get { id, reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Get a task by id, returning error if not found
    pub async fn get_required(&self, id: TaskId) -> StateResponse<Task> {
        debug!(%id, "get_required: called");
        self.get(id).await?.ok_or(StateError::NotFound(id))
    }

    /// Insert or replace a task
    pub async fn insert(&self, task: Task) -> StateResponse<TaskId> {
        debug!(task_id = task.id, name = %task.name, "insert: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::Insert { task, reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Replace the full record of an existing task
    pub async fn update(&self, task: Task) -> StateResponse<()> {
        debug!(task_id = task.id, "update: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::Update { task, reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Delete a task; Ok(false) when it did not exist
    pub async fn delete(&self, id: TaskId) -> StateResponse<bool> {
        debug!(%id, "delete: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::Delete { id, reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Delete every completed task
    pub async fn delete_completed(&self) -> StateResponse<usize> {
        debug!("delete_completed: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::DeleteCompleted { reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Stop the actor; later calls fail with [`StateError::ChannelError`]
    pub async fn shutdown(&self) {
        debug!("shutdown: called");
        let _ = self.tx.send(StateCommand::Shutdown).await;
    }
}

async fn request_query(tx: &mpsc::Sender<StateCommand>, query: TaskQuery) -> StateResponse<Vec<Task>> {
    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(StateCommand::Query { query, reply: reply_tx })
        .await
        .map_err(|_| StateError::ChannelError)?;
    reply_rx.await.map_err(|_| StateError::ChannelError)?
}

/// The actor loop that owns the repository and processes commands
async fn actor_loop(
    mut repo: Box<dyn TaskRepository>,
    mut rx: mpsc::Receiver<StateCommand>,
    event_tx: broadcast::Sender<StoreEvent>,
) {
    debug!("TaskManager actor started");
    let mut version: u64 = 0;

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::Query { query, reply } => {
                debug!(?query, "actor_loop: Query command");
                let result = repo.query(&query).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::Get { id, reply } => {
                debug!(%id, "actor_loop: Get command");
                let result = repo.get(id).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::Insert { task, reply } => {
                debug!(task_id = task.id, "actor_loop: Insert command");
                let result = repo.insert(&task).map_err(StateError::from);
                if let Ok(id) = result {
                    publish(&event_tx, &mut version, |version| StoreEvent::TaskInserted { id, version });
                }
                let _ = reply.send(result);
            }

            StateCommand::Update { task, reply } => {
                debug!(task_id = task.id, "actor_loop: Update command");
                let id = task.id;
                let result = repo.update(&task).map_err(StateError::from);
                if result.is_ok() {
                    publish(&event_tx, &mut version, |version| StoreEvent::TaskUpdated { id, version });
                }
                let _ = reply.send(result);
            }

            StateCommand::Delete { id, reply } => {
                debug!(%id, "actor_loop: Delete command");
                let result = repo.delete(id).map_err(StateError::from);
                if let Ok(true) = result {
                    publish(&event_tx, &mut version, |version| StoreEvent::TaskDeleted { id, version });
                } else if let Ok(false) = result {
                    debug!(%id, "actor_loop: Delete of absent task is a no-op");
                }
                let _ = reply.send(result);
            }

            StateCommand::DeleteCompleted { reply } => {
                debug!("actor_loop: DeleteCompleted command");
                let result = repo.delete_completed().map_err(StateError::from);
                if let Ok(count) = result
                    && count > 0
                {
                    publish(&event_tx, &mut version, |version| StoreEvent::CompletedDeleted { count, version });
                }
                let _ = reply.send(result);
            }

            StateCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("TaskManager shutting down");
                break;
            }
        }
    }

    debug!("TaskManager actor stopped");
}

/// Bump the mutation counter and broadcast the change
fn publish(event_tx: &broadcast::Sender<StoreEvent>, version: &mut u64, make: impl FnOnce(u64) -> StoreEvent) {
    *version += 1;
    let event = make(*version);
    debug!(?event, "publish: change applied");
    // Ignore send errors (no subscribers is OK)
    let _ = event_tx.send(event);
}

/// Producer behind a [`TaskSubscription`]
///
/// Re-queries after every change event and forwards the result when it
/// differs from the last one delivered. Query failures keep the last good
/// result; the loop ends when the consumer or the actor goes away.
async fn subscription_loop(
    tx: mpsc::Sender<StateCommand>,
    query: TaskQuery,
    mut events: broadcast::Receiver<StoreEvent>,
    out: mpsc::Sender<Vec<Task>>,
) {
    debug!(?query, "subscription_loop: started");
    let mut last: Option<Vec<Task>> = None;

    loop {
        match request_query(&tx, query.clone()).await {
            Ok(tasks) => {
                if last.as_ref() != Some(&tasks) {
                    if out.send(tasks.clone()).await.is_err() {
                        debug!("subscription_loop: consumer dropped");
                        return;
                    }
                    last = Some(tasks);
                } else {
                    debug!("subscription_loop: result unchanged");
                }
            }
            Err(StateError::ChannelError) => {
                debug!("subscription_loop: task manager stopped");
                return;
            }
            Err(e) => {
                warn!(error = %e, ?query, "Live query failed, keeping last result");
            }
        }

        let event = tokio::select! {
            event = events.recv() => event,
            _ = tx.closed() => {
                debug!("subscription_loop: task manager stopped");
                return;
            }
        };

        match event {
            Ok(event) => debug!(version = event.version(), "subscription_loop: change received"),
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "subscription_loop: lagged, re-querying"),
            Err(RecvError::Closed) => {
                debug!("subscription_loop: event channel closed");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use taskstore::{MemoryStore, SortOrder, StoreError, StoreResult};
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    async fn next(sub: &mut TaskSubscription) -> Vec<Task> {
        timeout(WAIT, sub.next()).await.unwrap().unwrap()
    }

    fn names(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_task_manager_crud() {
        let manager = TaskManager::spawn(MemoryStore::new());

        let id = manager.insert(Task::new("Water plants")).await.unwrap();
        let mut task = manager.get_required(id).await.unwrap();
        assert_eq!(task.name, "Water plants");

        task.important = true;
        manager.update(task.clone()).await.unwrap();
        assert!(manager.get_required(id).await.unwrap().important);

        assert!(manager.delete(id).await.unwrap());
        assert!(!manager.delete(id).await.unwrap());
        assert!(matches!(manager.get_required(id).await, Err(StateError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let manager = TaskManager::spawn(MemoryStore::new());
        let mut task = Task::new("ghost");
        task.id = 5;
        assert!(matches!(manager.update(task).await, Err(StateError::NotFound(5))));
    }

    #[tokio::test]
    async fn test_events_published_only_for_real_changes() {
        let manager = TaskManager::spawn(MemoryStore::new());
        let mut events = manager.subscribe_events();

        let id = manager.insert(Task::new("a")).await.unwrap();
        manager.delete(id).await.unwrap();
        manager.delete(id).await.unwrap();
        manager.delete_completed().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), StoreEvent::TaskInserted { id, version: 1 });
        assert_eq!(events.recv().await.unwrap(), StoreEvent::TaskDeleted { id, version: 2 });
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_subscription_emits_current_then_changes() {
        let manager = TaskManager::spawn(MemoryStore::new());
        let mut sub = manager.subscribe(TaskQuery::new("Call", SortOrder::ByName, false));

        assert!(next(&mut sub).await.is_empty());

        manager.insert(Task::new("Call dad")).await.unwrap();
        assert_eq!(names(&next(&mut sub).await), vec!["Call dad"]);

        manager.insert(Task::new("Call mom").with_important(true)).await.unwrap();
        assert_eq!(names(&next(&mut sub).await), vec!["Call mom", "Call dad"]);
    }

    #[tokio::test]
    async fn test_subscription_skips_unrelated_changes() {
        let manager = TaskManager::spawn(MemoryStore::new());
        let mut sub = manager.subscribe(TaskQuery::new("Call", SortOrder::ByName, false));
        assert!(next(&mut sub).await.is_empty());

        manager.insert(Task::new("Buy milk")).await.unwrap();
        manager.insert(Task::new("Call dad")).await.unwrap();

        // the "Buy milk" insert leaves the result unchanged, so the next
        // emission already reflects the second insert
        assert_eq!(names(&next(&mut sub).await), vec!["Call dad"]);
    }

    #[tokio::test]
    async fn test_undo_round_trip() {
        let manager = TaskManager::spawn(MemoryStore::seeded());
        let mut sub = manager.subscribe(TaskQuery::default());
        let before = next(&mut sub).await;
        let victim = before.iter().find(|t| t.name == "Call mom").unwrap().clone();

        manager.delete(victim.id).await.unwrap();
        let during = next(&mut sub).await;
        assert!(!during.contains(&victim));

        manager.insert(victim.clone()).await.unwrap();
        let after = next(&mut sub).await;
        assert_eq!(after, before);
    }

    struct FlakyStore {
        inner: MemoryStore,
        fail_queries: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }

    impl TaskRepository for FlakyStore {
        fn query(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
            if self.fail_queries.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StoreError::InvalidData("disk on fire".to_string()));
            }
            self.inner.query(query)
        }
        fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
            self.inner.get(id)
        }
        fn insert(&mut self, task: &Task) -> StoreResult<TaskId> {
            self.inner.insert(task)
        }
        fn update(&mut self, task: &Task) -> StoreResult<()> {
            self.inner.update(task)
        }
        fn delete(&mut self, id: TaskId) -> StoreResult<bool> {
            self.inner.delete(id)
        }
        fn delete_completed(&mut self) -> StoreResult<usize> {
            self.inner.delete_completed()
        }
    }

    #[tokio::test]
    async fn test_subscription_survives_query_failure() {
        let fail = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let manager = TaskManager::spawn(FlakyStore {
            inner: MemoryStore::new(),
            fail_queries: fail.clone(),
        });
        let mut sub = manager.subscribe(TaskQuery::default());
        assert!(next(&mut sub).await.is_empty());

        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        manager.insert(Task::new("lost in the fire")).await.unwrap();
        assert!(timeout(Duration::from_millis(100), sub.next()).await.is_err());

        fail.store(false, std::sync::atomic::Ordering::SeqCst);
        manager.insert(Task::new("back")).await.unwrap();
        assert_eq!(next(&mut sub).await.len(), 2);
        assert!(!sub.is_finished());
    }

    #[tokio::test]
    async fn test_calls_fail_after_shutdown() {
        let manager = TaskManager::spawn(MemoryStore::new());
        manager.shutdown().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            manager.insert(Task::new("late")).await,
            Err(StateError::ChannelError)
        ));
    }
}
