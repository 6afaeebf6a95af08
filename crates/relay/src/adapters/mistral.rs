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
use llm_contracts::{AdapterOptions, Completion, ProviderCallResult, ProviderId, ProviderProfile};
use reqwest::Client;
use tracing::debug;

use super::http::{build_client, chat_completion_payload, parse_chat_completion, send_json};
use super::ProviderAdapter;

const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

#[derive(Debug, Clone)]
pub struct MistralAdapter {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl MistralAdapter {
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
}

#[async_trait]
impl ProviderAdapter for MistralAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Mistral
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &AdapterOptions,
    ) -> ProviderCallResult<Completion> {
        debug!(model = %self.model, "Sending Mistral request");
        let request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&chat_completion_payload(&self.model, prompt, options));

        let response_data = send_json(request, "Mistral").await?;
        parse_chat_completion("Mistral", prompt, &response_data)
    }
}
