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

use crate::types::{ProviderId, ResultStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
    pub total: u32,
}

impl TokenUsage {
    pub fn new(input: u32, output: u32) -> Self {
        Self {
            input,
            output,
            total: input.saturating_add(output),
        }
    }

    /// `ceil(chars / 4)`, kept verbatim so adapters without native usage
    /// reporting stay comparable.
    pub fn estimate_tokens(text: &str) -> u32 {
        let chars = text.chars().count();
        u32::try_from(chars.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u32::MAX)
    }

    pub fn estimate(prompt: &str, completion: &str) -> Self {
        Self::new(Self::estimate_tokens(prompt), Self::estimate_tokens(completion))
    }

    /// Prefers vendor-reported counts and falls back to the estimate for any
    /// side the vendor left out (or reported as zero).
    pub fn reported_or_estimate(
        prompt: &str,
        completion: &str,
        reported_input: Option<u32>,
        reported_output: Option<u32>,
    ) -> Self {
        let input = reported_input
            .filter(|n| *n > 0)
            .unwrap_or_else(|| Self::estimate_tokens(prompt));
        let output = reported_output
            .filter(|n| *n > 0)
            .unwrap_or_else(|| Self::estimate_tokens(completion));
        Self::new(input, output)
    }
}

/// What a provider adapter hands back on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub tokens: TokenUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub request_id: Uuid,
    pub provider: ProviderId,
    pub text: Option<String>,
    pub token_usage: TokenUsage,
    pub latency_ms: u64,
    pub status: ResultStatus,
    pub error_message: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl ProviderResult {
    pub fn success(
        request_id: Uuid,
        provider: ProviderId,
        completion: Completion,
        latency_ms: u64,
    ) -> Self {
        Self {
            request_id,
            provider,
            text: Some(completion.text),
            token_usage: completion.tokens,
            latency_ms,
            status: ResultStatus::Success,
            error_message: None,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(
        request_id: Uuid,
        provider: ProviderId,
        error_message: String,
        latency_ms: u64,
    ) -> Self {
        Self {
            request_id,
            provider,
            text: None,
            token_usage: TokenUsage::default(),
            latency_ms,
            status: ResultStatus::Failed,
            error_message: Some(error_message),
            completed_at: Utc::now(),
        }
    }

    pub fn timed_out(
        request_id: Uuid,
        provider: ProviderId,
        timeout_ms: u64,
        latency_ms: u64,
    ) -> Self {
        Self {
            request_id,
            provider,
            text: None,
            token_usage: TokenUsage::default(),
            latency_ms,
            status: ResultStatus::Timeout,
            error_message: Some(format!("Request timed out after {timeout_ms} ms")),
            completed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    /// Text of a successful result, `None` for anything that cannot be scored.
    pub fn scorable_text(&self) -> Option<&str> {
        if self.is_success() {
            self.text.as_deref()
        } else {
            None
        }
    }
}
