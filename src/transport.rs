use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{InformerError, Result};
use crate::models::{
    Assistant, CreateAssistantRequest, CreateMessageRequest, CreateRunRequest,
    ListMessagesResponse, Message, Run, SubmitToolOutputsRequest, Thread, ToolOutput,
};

/// Seam over the remote Assistants REST API. Everything the conversation
/// driver and the tool dispatcher need from the remote service goes through
/// this trait, so tests can substitute a recording implementation.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_assistant(&self, req: &CreateAssistantRequest) -> Result<Assistant>;
    async fn create_thread(&self) -> Result<Thread>;
    async fn create_message(&self, thread_id: &str, req: &CreateMessageRequest)
    -> Result<Message>;
    async fn create_run(&self, thread_id: &str, req: &CreateRunRequest) -> Result<Run>;
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run>;
    async fn list_messages(&self, thread_id: &str) -> Result<ListMessagesResponse>;
    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>>;
}

/// Azure OpenAI implementation. Authentication is the `api-key` header, the
/// API revision travels as the `api-version` query parameter. Failures are
/// surfaced to the caller immediately; retrying is not this layer's job.
pub struct AzureOpenAiTransport {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl AzureOpenAiTransport {
    pub fn new(endpoint: &str, api_key: &str, api_version: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_version: api_version.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/openai/{}?api-version={}",
            self.endpoint, path, self.api_version
        )
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(InformerError::Api { status, message })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    async fn get_response(&self, path: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(self.url(path))
            .header("api-key", &self.api_key)
            .send()
            .await?;
        self.check(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(self.get_response(path).await?.json().await?)
    }
}

#[async_trait]
impl AssistantApi for AzureOpenAiTransport {
    async fn create_assistant(&self, req: &CreateAssistantRequest) -> Result<Assistant> {
        self.post_json("assistants", req).await
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.post_json("threads", &serde_json::json!({})).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        req: &CreateMessageRequest,
    ) -> Result<Message> {
        self.post_json(&format!("threads/{thread_id}/messages"), req)
            .await
    }

    async fn create_run(&self, thread_id: &str, req: &CreateRunRequest) -> Result<Run> {
        self.post_json(&format!("threads/{thread_id}/runs"), req)
            .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.get_json(&format!("threads/{thread_id}/runs/{run_id}"))
            .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run> {
        let body = SubmitToolOutputsRequest {
            tool_outputs: outputs,
        };
        self.post_json(
            &format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
            &body,
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<ListMessagesResponse> {
        self.get_json(&format!("threads/{thread_id}/messages"))
            .await
    }

    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>> {
        let response = self.get_response(&format!("files/{file_id}/content")).await?;
        Ok(response.bytes().await?.to_vec())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_api_version_and_trims_trailing_slash() {
        let transport = AzureOpenAiTransport::new(
            "https://example.openai.azure.com/",
            "key",
            "2024-05-01-preview",
        );
        assert_eq!(
            transport.url("threads/thread_1/runs/run_1"),
            "https://example.openai.azure.com/openai/threads/thread_1/runs/run_1?api-version=2024-05-01-preview"
        );
    }
}
