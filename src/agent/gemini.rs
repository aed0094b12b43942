// agent/gemini.rs — Gemini-backed resolver.
//
// One generateContent call per instruction, with the six operations exposed
// as function declarations and function-calling forced to ANY so the model
// can never answer in prose. The current task list is summarised into the
// user turn so references like "the groceries task" resolve to an id.

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::resolver::{ActionCall, Resolver};
use crate::storage::Task;

const SYSTEM_POLICY: &str = "\
You are a todo list management AI. Your ONLY job is to call the provided \
functions to manage the user's tasks. Never answer directly.\n\
Rules:\n\
1. Use create_task when the user wants to add a new task\n\
2. Use show_tasks when the user wants to see their tasks\n\
3. Use mark_task_complete when the user wants to mark a task as done\n\
4. Use mark_task_pending when the user wants to mark a task as not done\n\
5. Use update_task_info when the user wants to modify a task\n\
6. Use remove_task when the user wants to delete a task\n\
When the user refers to a task by name, find its id in the task list \
provided with the request.";

pub struct GeminiResolver {
    client: reqwest::Client,
    model: String,
    use_vertex: bool,
    credential: String,
}

impl GeminiResolver {
    /// `use_vertex` selects the auth mode: bearer token against the Vertex
    /// publisher endpoint, or API key against the AI Studio endpoint.
    pub fn new(model: &str, use_vertex: bool, credential: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            model: model.to_string(),
            use_vertex,
            credential: credential.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        if self.use_vertex {
            format!(
                "https://aiplatform.googleapis.com/v1/publishers/google/models/{}:generateContent",
                self.model
            )
        } else {
            format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                self.model
            )
        }
    }

    async fn call_model(&self, prompt: &str) -> Result<GenerateResponse> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_POLICY }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "tools": [{ "functionDeclarations": function_declarations() }],
            "toolConfig": { "functionCallingConfig": { "mode": "ANY" } },
        });

        let request = self.client.post(self.endpoint()).json(&body);
        let request = if self.use_vertex {
            request.bearer_auth(&self.credential)
        } else {
            request.header("x-goog-api-key", &self.credential)
        };

        let resp = request.send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Resolver for GeminiResolver {
    async fn resolve(&self, text: &str, tasks: &[Task]) -> Result<ActionCall> {
        let prompt = format!("{}\n\n{text}", summarize_tasks(tasks));
        let response = self.call_model(&prompt).await?;
        let call = response
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content)
            .unwrap_or_default()
            .parts
            .into_iter()
            .find_map(|p| p.function_call)
            .context("model returned no function call")?;
        parse_function_call(&call.name, &call.args)
    }
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(rename = "functionCall")]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

// ─── Declarations & parsing ───────────────────────────────────────────────────

fn task_id_param() -> Value {
    json!({ "type": "integer", "description": "Id of an existing task" })
}

fn function_declarations() -> Value {
    json!([
        {
            "name": "create_task",
            "description": "Create a new task with an auto-generated id.",
            "parameters": {
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Short task label" },
                    "description": { "type": "string" },
                    "status": { "type": "boolean", "description": "true when already done" },
                },
                "required": ["name"],
            },
        },
        {
            "name": "update_task_info",
            "description": "Update an existing task. Omitted fields keep their current value.",
            "parameters": {
                "type": "object",
                "properties": {
                    "task_id": task_id_param(),
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "status": { "type": "boolean" },
                },
                "required": ["task_id"],
            },
        },
        {
            "name": "show_tasks",
            "description": "Display all tasks.",
            "parameters": { "type": "object", "properties": {} },
        },
        {
            "name": "remove_task",
            "description": "Delete a task by id.",
            "parameters": {
                "type": "object",
                "properties": { "task_id": task_id_param() },
                "required": ["task_id"],
            },
        },
        {
            "name": "mark_task_complete",
            "description": "Mark a task as completed.",
            "parameters": {
                "type": "object",
                "properties": { "task_id": task_id_param() },
                "required": ["task_id"],
            },
        },
        {
            "name": "mark_task_pending",
            "description": "Mark a task as pending.",
            "parameters": {
                "type": "object",
                "properties": { "task_id": task_id_param() },
                "required": ["task_id"],
            },
        },
    ])
}

/// Compact state snapshot prepended to the user turn.
fn summarize_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "Current tasks: (none)".to_string();
    }
    let mut out = String::from("Current tasks:");
    for task in tasks {
        let status = if task.status { "done" } else { "pending" };
        out.push_str(&format!("\n  #{} {} [{}]", task.id, task.name, status));
    }
    out
}

fn require_id(args: &Value) -> Result<i64> {
    args.get("task_id")
        .and_then(Value::as_i64)
        .context("function call missing task_id")
}

fn opt_string(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_function_call(name: &str, args: &Value) -> Result<ActionCall> {
    let call = match name {
        "create_task" => ActionCall::Create {
            name: opt_string(args, "name").context("function call missing name")?,
            description: opt_string(args, "description").unwrap_or_default(),
            status: args.get("status").and_then(Value::as_bool).unwrap_or(false),
        },
        "update_task_info" => ActionCall::UpdateInfo {
            id: require_id(args)?,
            name: opt_string(args, "name"),
            description: opt_string(args, "description"),
            status: args.get("status").and_then(Value::as_bool),
        },
        "show_tasks" => ActionCall::List,
        "remove_task" => ActionCall::Remove { id: require_id(args)? },
        "mark_task_complete" => ActionCall::MarkComplete { id: require_id(args)? },
        "mark_task_pending" => ActionCall::MarkPending { id: require_id(args)? },
        other => bail!("model called unknown function {other:?}"),
    };
    Ok(call)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_task_defaults() {
        let call = parse_function_call("create_task", &json!({ "name": "Buy milk" })).unwrap();
        assert_eq!(
            call,
            ActionCall::Create {
                name: "Buy milk".to_string(),
                description: String::new(),
                status: false,
            }
        );
    }

    #[test]
    fn test_parse_update_partial_fields() {
        let call = parse_function_call(
            "update_task_info",
            &json!({ "task_id": 2, "description": "new details" }),
        )
        .unwrap();
        assert_eq!(
            call,
            ActionCall::UpdateInfo {
                id: 2,
                name: None,
                description: Some("new details".to_string()),
                status: None,
            }
        );
    }

    #[test]
    fn test_parse_mark_calls() {
        assert_eq!(
            parse_function_call("mark_task_complete", &json!({ "task_id": 1 })).unwrap(),
            ActionCall::MarkComplete { id: 1 }
        );
        assert_eq!(
            parse_function_call("mark_task_pending", &json!({ "task_id": 1 })).unwrap(),
            ActionCall::MarkPending { id: 1 }
        );
    }

    #[test]
    fn test_parse_missing_required_arg() {
        assert!(parse_function_call("remove_task", &json!({})).is_err());
        assert!(parse_function_call("create_task", &json!({})).is_err());
    }

    #[test]
    fn test_parse_unknown_function() {
        assert!(parse_function_call("explode", &json!({})).is_err());
    }

    #[test]
    fn test_function_call_response_deserializes() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "functionCall": { "name": "remove_task", "args": { "task_id": 4 } }
                    }]
                }
            }]
        });
        let resp: GenerateResponse = serde_json::from_value(raw).unwrap();
        let call = resp.candidates[0].content.parts[0].function_call.as_ref().unwrap();
        assert_eq!(call.name, "remove_task");
        assert_eq!(call.args["task_id"], 4);
    }

    #[test]
    fn test_summarize_tasks() {
        assert_eq!(summarize_tasks(&[]), "Current tasks: (none)");
        let tasks = vec![Task {
            id: 3,
            name: "Groceries".to_string(),
            description: String::new(),
            status: true,
        }];
        assert_eq!(summarize_tasks(&tasks), "Current tasks:\n  #3 Groceries [done]");
    }
}
