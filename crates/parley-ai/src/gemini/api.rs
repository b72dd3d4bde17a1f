//! ChatProvider implementation for GeminiClient.

use async_trait::async_trait;
use tracing::debug;

use crate::http::send_json;
use crate::{ChatProvider, ProviderError, ProviderResponse, ToolSpec, Transcript};

use super::client::GeminiClient;

#[async_trait]
impl ChatProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
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
        let body = self.build_request_body(transcript, tools);
        let url = self.api_url(model);

        debug!(model = %model, turns = transcript.len(), tools = tools.len(), "Gemini API request");

        let request = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body);

        let json = send_json(request).await?;
        self.parse_response(json)
    }
}
