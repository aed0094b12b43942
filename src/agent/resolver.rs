use async_trait::async_trait;

use crate::storage::Task;

/// One structured operation resolved from a free-text instruction. Closed
/// set: every instruction maps to exactly one of these six calls.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionCall {
    Create {
        name: String,
        description: String,
        status: bool,
    },
    /// Partial update: `None` fields are filled from the current row before
    /// the write (the store itself only does full overwrites).
    UpdateInfo {
        id: i64,
        name: Option<String>,
        description: Option<String>,
        status: Option<bool>,
    },
    List,
    Remove {
        id: i64,
    },
    MarkComplete {
        id: i64,
    },
    MarkPending {
        id: i64,
    },
}

/// Maps one instruction plus a snapshot of the current task list onto exactly
/// one operation call. Implementations are interchangeable — the production
/// resolver delegates to Gemini function calling, tests use a stub.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, text: &str, tasks: &[Task]) -> anyhow::Result<ActionCall>;
}

/// Stands in when no provider credential is configured. The agent folds the
/// error into its reply, so chatting without a credential yields a setup hint
/// rather than an HTTP failure.
pub struct UnconfiguredResolver;

#[async_trait]
impl Resolver for UnconfiguredResolver {
    async fn resolve(&self, _text: &str, _tasks: &[Task]) -> anyhow::Result<ActionCall> {
        anyhow::bail!(
            "no agent credential configured — set TODOD_AGENT_CREDENTIAL or GEMINI_API_KEY"
        )
    }
}
