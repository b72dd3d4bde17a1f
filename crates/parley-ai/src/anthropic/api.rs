//! ChatProvider implementation for AnthropicClient.

use async_trait::async_trait;
use tracing::debug;

use crate::http::send_json;
use crate::{ChatProvider, ProviderError, ProviderResponse, ToolSpec, Transcript};

use super::client::{AnthropicClient, ANTHROPIC_VERSION};

#[async_trait]
impl ChatProvider for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
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

        debug!(
            model = %model,
            turns = transcript.len(),
            tools = tools.len(),
            "Anthropic API request"
        );

        let request = self
            .http
            .post(self.api_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let json = send_json(request).await?;
        self.parse_response(json)
    }
}
