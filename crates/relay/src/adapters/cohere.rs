// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use async_trait::async_trait;
use llm_contracts::{
    AdapterOptions, Completion, ProviderCallResult, ProviderError, ProviderId, ProviderProfile,
    TokenUsage,
};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::http::{build_client, non_empty, send_json, token_count};
use super::ProviderAdapter;

const DEFAULT_BASE_URL: &str = "https://api.cohere.ai";

#[derive(Debug, Clone)]
pub struct CohereAdapter {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl CohereAdapter {
    pub fn new(api_key: String, profile: &ProviderProfile) -> ProviderCallResult<Self> {
        Ok(Self {
            client: build_client()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: profile.model_identifier.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_cohere_payload(&self, prompt: &str, options: &AdapterOptions) -> Value {
        json!({
            "message": prompt,
            "model": self.model,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
        })
    }

    fn parse_cohere_response(prompt: &str, response_data: &Value) -> ProviderCallResult<Completion> {
        let content = response_data["text"].as_str().ok_or_else(|| {
            ProviderError::Provider("Failed to extract content from Cohere response".to_string())
        })?;
        let text = non_empty(content)?;

        // v1 chat reports billed units and raw tokens; raw tokens are preferred.
        let meta = &response_data["meta"];
        let input = token_count(&meta["tokens"]["input_tokens"])
            .or_else(|| token_count(&meta["billed_units"]["input_tokens"]));
        let output = token_count(&meta["tokens"]["output_tokens"])
            .or_else(|| token_count(&meta["billed_units"]["output_tokens"]));

        Ok(Completion {
            tokens: TokenUsage::reported_or_estimate(prompt, &text, input, output),
            text,
        })
    }
}

#[async_trait]
impl ProviderAdapter for CohereAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Cohere
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &AdapterOptions,
    ) -> ProviderCallResult<Completion> {
        debug!(model = %self.model, "Sending Cohere request");
        let request = self
            .client
            .post(format!("{}/v1/chat", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_cohere_payload(prompt, options));

        let response_data = send_json(request, "Cohere").await?;
        Self::parse_cohere_response(prompt, &response_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billed_units_used_when_raw_tokens_absent() {
        let data = json!({
            "text": "Souveraineté numérique",
            "meta": { "billed_units": { "input_tokens": 9, "output_tokens": 3 } }
        });
        let completion = CohereAdapter::parse_cohere_response("prompt", &data).unwrap();
        assert_eq!(completion.tokens, TokenUsage { input: 9, output: 3, total: 12 });
    }

    #[test]
    fn test_missing_text_is_a_provider_error() {
        let data = json!({ "message": "invalid request" });
        assert!(matches!(
            CohereAdapter::parse_cohere_response("p", &data),
            Err(ProviderError::Provider(_))
        ));
    }
}
