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

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiAdapter {
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

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_gemini_payload(prompt: &str, options: &AdapterOptions) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_tokens,
            }
        })
    }

    fn parse_gemini_response(prompt: &str, response_data: &Value) -> ProviderCallResult<Completion> {
        let parts = response_data["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| {
                ProviderError::Provider("Failed to extract content from Gemini response".to_string())
            })?;

        let joined: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect();
        let text = non_empty(&joined)?;

        let usage = &response_data["usageMetadata"];
        let tokens = TokenUsage::reported_or_estimate(
            prompt,
            &text,
            token_count(&usage["promptTokenCount"]),
            token_count(&usage["candidatesTokenCount"]),
        );

        Ok(Completion { text, tokens })
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &AdapterOptions,
    ) -> ProviderCallResult<Completion> {
        debug!(model = %self.model, "Sending Gemini request");
        let payload = Self::build_gemini_payload(prompt, options);
        let request = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&payload);

        let response_data = send_json(request, "Gemini").await?;
        Self::parse_gemini_response(prompt, &response_data)
    }
}
