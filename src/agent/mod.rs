// agent/mod.rs — Conversational facade over the task store.
//
// One free-text instruction in, one human-readable string out. The resolver
// picks which of the six operations to run; dispatch executes it against the
// store. Nothing here returns an error to the caller — every failure is
// folded into the reply text.

pub mod gemini;
pub mod resolver;

use tracing::debug;

pub use resolver::{ActionCall, Resolver};

use crate::storage::{Task, TaskStore};

pub struct Agent {
    store: TaskStore,
    resolver: Box<dyn Resolver>,
}

impl Agent {
    pub fn new(store: TaskStore, resolver: Box<dyn Resolver>) -> Self {
        Self { store, resolver }
    }

    /// Resolve and execute one instruction. Infallible by design: resolver
    /// and store failures become descriptive reply text.
    pub async fn handle(&self, message: &str) -> String {
        let tasks = match self.store.list_all().await {
            Ok(page) => page.tasks,
            Err(e) => return format!("Sorry, something went wrong: {e}"),
        };
        let call = match self.resolver.resolve(message, &tasks).await {
            Ok(call) => call,
            Err(e) => return format!("Sorry, something went wrong: {e}"),
        };
        debug!("resolved instruction to {call:?}");
        self.dispatch(call).await
    }

    async fn dispatch(&self, call: ActionCall) -> String {
        match call {
            ActionCall::Create {
                name,
                description,
                status,
            } => {
                if name.trim().is_empty() {
                    return "Failed to create task: task name must not be empty".to_string();
                }
                match self.store.create_auto(&name, &description, status).await {
                    Ok(id) => format!("Created task #{id}: {name}"),
                    Err(e) => format!("Failed to create task: {e}"),
                }
            }

            ActionCall::List => match self.store.list_all().await {
                Ok(page) => render_task_list(&page.tasks),
                Err(e) => format!("Failed to fetch tasks: {e}"),
            },

            ActionCall::Remove { id } => match self.store.delete(id).await {
                Ok(()) => format!("Task #{id} deleted."),
                Err(e @ crate::storage::StoreError::NotFound(_)) => format!("Error: {e}"),
                Err(e) => format!("Failed to delete task: {e}"),
            },

            ActionCall::MarkComplete { id } => self.set_status(id, true).await,
            ActionCall::MarkPending { id } => self.set_status(id, false).await,

            ActionCall::UpdateInfo {
                id,
                name,
                description,
                status,
            } => {
                let current = match self.store.get(id).await {
                    Ok(Some(task)) => task,
                    Ok(None) => return format!("Task #{id} not found"),
                    Err(e) => return format!("Failed to update task: {e}"),
                };
                // Merge supplied fields over the current row so nothing is
                // ever written back null.
                let merged = Task {
                    id,
                    name: name.unwrap_or(current.name),
                    description: description.unwrap_or(current.description),
                    status: status.unwrap_or(current.status),
                };
                match self.store.update(&merged).await {
                    Ok(()) => format!("Updated task #{id}: {}", merged.name),
                    Err(e) => format!("Failed to update task: {e}"),
                }
            }
        }
    }

    /// Shared body of mark-complete / mark-pending: read first, short-circuit
    /// when the target state already holds, otherwise rewrite with only the
    /// status flipped.
    async fn set_status(&self, id: i64, done: bool) -> String {
        let (verb, already) = if done {
            ("complete", "completed")
        } else {
            ("pending", "pending")
        };
        let current = match self.store.get(id).await {
            Ok(Some(task)) => task,
            Ok(None) => return format!("Task #{id} not found"),
            Err(e) => return format!("Failed to mark task {verb}: {e}"),
        };
        if current.status == done {
            return format!("Task #{id} is already {already}");
        }
        let updated = Task {
            status: done,
            ..current
        };
        match self.store.update(&updated).await {
            Ok(()) => format!("Task #{id} marked as {verb}"),
            Err(e) => format!("Failed to mark task {verb}: {e}"),
        }
    }
}

fn render_task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found. Time to get productive!".to_string();
    }
    let mut out = String::from("Here are your tasks:\n\n");
    for task in tasks {
        let (icon, status) = if task.status {
            ("✅", "Done")
        } else {
            ("⏳", "Pending")
        };
        out.push_str(&format!("{icon} **Task #{}**: {}\n", task.id, task.name));
        if !task.description.is_empty() {
            out.push_str(&format!("   📝 {}\n", task.description));
        }
        out.push_str(&format!("   Status: {status}\n\n"));
    }
    out
}
