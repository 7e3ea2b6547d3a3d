//! Task state with the actor pattern
//!
//! TaskManager owns the task repository and processes commands via channels.
//! Every applied mutation is broadcast as a [`StoreEvent`], which live
//! [`TaskSubscription`]s use to re-evaluate their query.

mod manager;
mod messages;
mod subscription;

pub use manager::{StoreEvent, TaskManager};
pub use messages::{StateCommand, StateError, StateResponse};
pub use subscription::TaskSubscription;
