//! ChatProvider implementation for OpenAiClient.

use async_trait::async_trait;
use tracing::debug;

use crate::http::send_json;
use crate::{ChatProvider, ProviderError, ProviderResponse, ToolSpec, Transcript};

use super::client::OpenAiClient;

#[async_trait]
impl ChatProvider for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ToolSpec],
        model: Option<&str>,
    ) -> Result<ProviderResponse, ProviderError> {
        let model = model.unwrap_or(self.config.model.as_str());
        let body = self.build_request_body(transcript, tools, model);

        debug!(model = %model, turns = transcript.len(), tools = tools.len(), "OpenAI API request");

        let request = self
            .http
            .post(self.api_url())
            .bearer_auth(&self.config.api_key)
            .header("content-type", "application/json")
            .json(&body);

        let json = send_json(request).await?;
        self.parse_response(json)
    }
}
