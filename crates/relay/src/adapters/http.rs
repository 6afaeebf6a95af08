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

use llm_contracts::{
    AdapterOptions, Completion, ProviderCallResult, ProviderError, TokenUsage,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

pub(crate) fn build_client() -> ProviderCallResult<Client> {
    Client::builder()
        .build()
        .map_err(|e| ProviderError::Configuration(format!("Failed to create HTTP client: {e}")))
}

/// Sends the request once and maps HTTP failures onto `ProviderError`.
/// Transport-level deadlines belong to the orchestrator, so none is set here.
pub(crate) async fn send_json(request: RequestBuilder, vendor: &str) -> ProviderCallResult<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Network(format!("{vendor} request failed: {e}")))?;

    let status = response.status();
    debug!(vendor, %status, "Received vendor response");

    if status.is_success() {
        return response.json::<Value>().await.map_err(|e| {
            ProviderError::Serialisation(format!("Failed to parse {vendor} response: {e}"))
        });
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(vendor, %status, error = %e, "Failed to read vendor error body");
            String::new()
        }
    };
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Authentication(format!("{vendor} API error {status}: {body}"))
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit,
        _ => ProviderError::Provider(format!("{vendor} API error {status}: {body}")),
    })
}

pub(crate) fn token_count(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

pub(crate) fn non_empty(text: &str) -> ProviderCallResult<String> {
    if text.trim().is_empty() {
        Err(ProviderError::EmptyCompletion)
    } else {
        Ok(text.to_string())
    }
}

/// OpenAI-compatible chat payload, shared by Mistral and the Hugging Face
/// router.
pub(crate) fn chat_completion_payload(model: &str, prompt: &str, options: &AdapterOptions) -> Value {
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": options.temperature,
        "max_tokens": options.max_tokens,
    })
}

pub(crate) fn parse_chat_completion(
    vendor: &str,
    prompt: &str,
    response_data: &Value,
) -> ProviderCallResult<Completion> {
    let content = response_data["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            ProviderError::Provider(format!("Failed to extract content from {vendor} response"))
        })?;
    let text = non_empty(content)?;

    let usage = &response_data["usage"];
    let tokens = TokenUsage::reported_or_estimate(
        prompt,
        &text,
        token_count(&usage["prompt_tokens"]),
        token_count(&usage["completion_tokens"]),
    );

    Ok(Completion { text, tokens })
}
