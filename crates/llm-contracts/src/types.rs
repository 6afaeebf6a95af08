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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    Mistral,
    HuggingFace,
    Cohere,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Gemini,
        ProviderId::Mistral,
        ProviderId::HuggingFace,
        ProviderId::Cohere,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::Mistral => "mistral",
            ProviderId::HuggingFace => "huggingface",
            ProviderId::Cohere => "cohere",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ProviderId::Gemini),
            "mistral" => Ok(ProviderId::Mistral),
            "huggingface" => Ok(ProviderId::HuggingFace),
            "cohere" => Ok(ProviderId::Cohere),
            _ => Err(ValidationError::UnknownProvider(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failed,
    Timeout,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Success => f.write_str("success"),
            ResultStatus::Failed => f.write_str("failed"),
            ResultStatus::Timeout => f.write_str("timeout"),
        }
    }
}

/// Failure of a single vendor call. Never escapes the orchestrator; it is
/// recorded on the provider's result instead.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialisation error: {0}")]
    Serialisation(String),

    #[error("Provider returned an empty completion")]
    EmptyCompletion,
}

pub type ProviderCallResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Prompt must be at least {min} characters (got {actual})")]
    PromptTooShort { min: usize, actual: usize },

    #[error("Prompt must be at most {max} characters (got {actual})")]
    PromptTooLong { max: usize, actual: usize },

    #[error("At least one provider is required")]
    EmptyProviderList,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Temperature must be within 0..=1 (got {0})")]
    TemperatureOutOfRange(f32),

    #[error("maxTokens must be within {min}..={max} (got {actual})")]
    MaxTokensOutOfRange { min: u32, max: u32, actual: u32 },

    #[error("Timeout must be greater than zero")]
    ZeroTimeout,
}

/// The only failures that leave the aggregation core.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("No AI providers available for [{}]. Please configure API keys.", .requested.join(", "))]
    NoProvidersAvailable { requested: Vec<String> },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
