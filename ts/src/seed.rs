//! Example tasks written into a freshly created store

use crate::task::Task;

/// The tasks a new store starts with
pub fn seed_tasks() -> Vec<Task> {
    vec![
        Task::new("Wash the dishes"),
        Task::new("Do the laundry"),
        Task::new("Buy groceries").with_important(true),
        Task::new("Prepare food").with_completed(true),
        Task::new("Call mom"),
        Task::new("Visit grandma").with_completed(true),
        Task::new("Repair my bike"),
        Task::new("Call Elon Musk"),
    ]
}
