use serde_json::Value;
use std::sync::Arc;

use crate::error::{InformerError, Result};
use crate::models::{Run, ToolOutput};
use crate::tools::ToolRegistry;
use crate::transport::AssistantApi;

/// Executes the tool calls of a `requires_action` run and submits the
/// complete output batch back to the remote service.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    api: Arc<dyn AssistantApi>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, api: Arc<dyn AssistantApi>) -> Self {
        Self { registry, api }
    }

    /// All calls must resolve and execute before anything is submitted: an
    /// unknown name or a failing tool aborts the batch with no partial
    /// submission, leaving the run unresolved for the caller.
    pub async fn dispatch(&self, run: &Run) -> Result<()> {
        let Some(action) = &run.required_action else {
            return Err(InformerError::Internal(format!(
                "Run {} requires action but carries no tool calls",
                run.id
            )));
        };

        let calls = &action.submit_tool_outputs.tool_calls;
        tracing::info!("Dispatching {} tool call(s) for run {}", calls.len(), run.id);

        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            let name = &call.function.name;
            let tool = self.registry.get(name).ok_or_else(|| {
                tracing::error!("Unknown tool function: {name}");
                InformerError::UnknownTool(name.clone())
            })?;

            let arguments: Value = serde_json::from_str(&call.function.arguments)?;
            let output = tool.call(arguments).await?;
            tracing::debug!("Tool {name} produced {} byte(s) for call {}", output.len(), call.id);

            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }

        self.api
            .submit_tool_outputs(&run.thread_id, &run.id, outputs)
            .await?;
        tracing::info!("Submitted tool outputs for run {}", run.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequiredAction, RunStatus, SubmitToolOutputs, ToolCall};
    use crate::tools::test_support::echo_registry;
    use crate::transport::test_support::{RecordingApi, tool_call};

    fn run_requiring(calls: Vec<ToolCall>) -> Run {
        Run {
            id: "run_test".to_string(),
            thread_id: "thread_test".to_string(),
            status: RunStatus::RequiresAction,
            required_action: Some(RequiredAction {
                submit_tool_outputs: SubmitToolOutputs { tool_calls: calls },
            }),
        }
    }

    #[tokio::test]
    async fn dispatch_submits_outputs_keyed_by_call_id() {
        let api = Arc::new(RecordingApi::new());
        let dispatcher = ToolDispatcher::new(echo_registry(), api.clone());

        let run = run_requiring(vec![
            tool_call("call_1", "echo", r#"{"query":"a"}"#),
            tool_call("call_2", "echo", r#"{"query":"b"}"#),
        ]);
        dispatcher.dispatch(&run).await.unwrap();

        let submissions = api.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        let (thread_id, run_id, outputs) = &submissions[0];
        assert_eq!(thread_id, "thread_test");
        assert_eq!(run_id, "run_test");
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].tool_call_id, "call_1");
        assert_eq!(outputs[0].output, r#"{"query":"a"}"#);
        assert_eq!(outputs[1].tool_call_id, "call_2");
    }

    #[tokio::test]
    async fn unknown_tool_aborts_batch_without_submitting() {
        let api = Arc::new(RecordingApi::new());
        let dispatcher = ToolDispatcher::new(echo_registry(), api.clone());

        let run = run_requiring(vec![
            tool_call("call_1", "echo", r#"{"query":"a"}"#),
            tool_call("call_2", "lookup_bonds", "{}"),
        ]);
        let err = dispatcher.dispatch(&run).await.unwrap_err();

        assert!(matches!(err, InformerError::UnknownTool(name) if name == "lookup_bonds"));
        assert!(api.submissions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_arguments_abort_batch_without_submitting() {
        let api = Arc::new(RecordingApi::new());
        let dispatcher = ToolDispatcher::new(echo_registry(), api.clone());

        let run = run_requiring(vec![tool_call("call_1", "echo", "{not json")]);
        let err = dispatcher.dispatch(&run).await.unwrap_err();

        assert!(matches!(err, InformerError::Json(_)));
        assert!(api.submissions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_without_required_action_is_an_internal_error() {
        let api = Arc::new(RecordingApi::new());
        let dispatcher = ToolDispatcher::new(echo_registry(), api.clone());

        let run = Run {
            id: "run_test".to_string(),
            thread_id: "thread_test".to_string(),
            status: RunStatus::RequiresAction,
            required_action: None,
        };
        assert!(matches!(
            dispatcher.dispatch(&run).await.unwrap_err(),
            InformerError::Internal(_)
        ));
    }
}
