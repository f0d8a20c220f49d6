use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{Config, PollConfig};
use crate::dispatcher::ToolDispatcher;
use crate::error::{InformerError, Result};
use crate::media::MediaStore;
use crate::models::{
    CreateAssistantRequest, CreateMessageRequest, CreateRunRequest, Message, MessageContent,
    ReplyPart, RunStatus,
};
use crate::tools::ToolRegistry;
use crate::transport::AssistantApi;

const DEFAULT_INSTRUCTIONS: &str = "You are an ETF research assistant. You help users find and \
compare exchange-traded funds. When a question concerns concrete securities, volumes, fees or \
replication methods, call the search_etfs function and ground your answer in its results. Answer \
concisely and never invent ISINs.";

/// Drives remote runs to completion: appends the user message, starts a run,
/// polls its state, hands `requires_action` states to the dispatcher and
/// extracts the final reply.
pub struct AssistantService {
    api: Arc<dyn AssistantApi>,
    dispatcher: ToolDispatcher,
    media: MediaStore,
    assistant_id: String,
    poll: PollConfig,
}

impl AssistantService {
    /// Registers the assistant with the remote service once at startup,
    /// advertising every tool in the registry.
    pub async fn new(
        api: Arc<dyn AssistantApi>,
        registry: Arc<ToolRegistry>,
        media: MediaStore,
        config: &Config,
    ) -> Result<Self> {
        let instructions = load_instructions(&config.assistant.instructions_path).await;

        let assistant = api
            .create_assistant(&CreateAssistantRequest {
                model: config.assistant.model.clone(),
                instructions,
                tools: registry.definitions(),
            })
            .await?;
        tracing::info!("Registered assistant {}", assistant.id);

        Ok(Self {
            dispatcher: ToolDispatcher::new(registry, api.clone()),
            api,
            media,
            assistant_id: assistant.id,
            poll: config.poll.clone(),
        })
    }

    pub async fn create_thread(&self) -> Result<String> {
        let thread = self.api.create_thread().await?;
        tracing::info!("Created thread {}", thread.id);
        Ok(thread.id)
    }

    /// Append one user message, start a run and poll it to a terminal state.
    /// Terminal failure statuses and an exhausted poll budget are typed
    /// errors, never replies.
    pub async fn process_message(&self, thread_id: &str, content: &str) -> Result<Vec<ReplyPart>> {
        tracing::info!("Processing message in thread {thread_id}");

        self.api
            .create_message(
                thread_id,
                &CreateMessageRequest {
                    role: "user".to_string(),
                    content: content.to_string(),
                },
            )
            .await?;

        let run = self
            .api
            .create_run(
                thread_id,
                &CreateRunRequest {
                    assistant_id: self.assistant_id.clone(),
                },
            )
            .await?;

        let mut attempts = 0u32;
        loop {
            if attempts >= self.poll.max_attempts {
                tracing::error!(
                    "Run {} still not terminal after {attempts} polls - giving up",
                    run.id
                );
                return Err(InformerError::PollTimeout { attempts });
            }
            attempts += 1;
            sleep(Duration::from_millis(self.poll.initial_delay_ms)).await;

            let state = self.api.retrieve_run(thread_id, &run.id).await?;
            match state.status {
                RunStatus::Completed => {
                    let messages = self.api.list_messages(thread_id).await?;
                    let reply = self.format_reply(&messages.data).await?;
                    tracing::info!(
                        "Run {} completed after {attempts} poll(s), {} reply part(s)",
                        run.id,
                        reply.len()
                    );
                    return Ok(reply);
                }
                RunStatus::Failed | RunStatus::Expired | RunStatus::Cancelled => {
                    tracing::error!("Run {} ended with status {}", run.id, state.status);
                    return Err(InformerError::RunFailed(state.status));
                }
                RunStatus::RequiresAction => {
                    tracing::info!("Run {} requires action", run.id);
                    self.dispatcher.dispatch(&state).await?;
                }
                status => {
                    tracing::debug!("Run {} is {status} - waiting", run.id);
                    sleep(Duration::from_millis(self.poll.interval_ms)).await;
                }
            }
        }
    }

    /// Build the reply from everything the assistant said since the most
    /// recent user turn. The listing arrives newest first; order is restored
    /// to chronological before returning.
    async fn format_reply(&self, messages: &[Message]) -> Result<Vec<ReplyPart>> {
        let mut grouped: Vec<Vec<ReplyPart>> = Vec::new();

        for message in messages {
            if message.role == "user" {
                break;
            }
            let mut parts = Vec::new();
            for item in &message.content {
                match item {
                    MessageContent::Text { text } => {
                        parts.push(ReplyPart::Text(text.value.clone()));
                    }
                    MessageContent::ImageFile { image_file } => {
                        let bytes = self.api.file_content(&image_file.file_id).await?;
                        let url = self.media.persist_image(&image_file.file_id, &bytes).await?;
                        parts.push(ReplyPart::Image(url));
                    }
                    MessageContent::Unsupported => {
                        tracing::warn!("Skipping unsupported content part in message {}", message.id);
                    }
                }
            }
            grouped.push(parts);
        }

        grouped.reverse();
        Ok(grouped.into_iter().flatten().collect())
    }
}

async fn load_instructions(path: &str) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            tracing::info!("Loaded assistant instructions from {path}");
            contents
        }
        Err(_) if !Path::new(path).exists() => {
            tracing::info!("No instructions file at {path} - using built-in instructions");
            DEFAULT_INSTRUCTIONS.to_string()
        }
        Err(e) => {
            tracing::warn!("Failed to read instructions from {path}: {e} - using built-in instructions");
            DEFAULT_INSTRUCTIONS.to_string()
        }
    }
}
