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

use crate::types::{ProviderId, ValidationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

pub const MIN_PROMPT_CHARS: usize = 3;
pub const MAX_PROMPT_CHARS: usize = 2000;
pub const MIN_MAX_TOKENS: u32 = 50;
pub const MAX_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
            timeout_ms: 30_000,
        }
    }
}

impl GenerationOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ValidationError::TemperatureOutOfRange(self.temperature));
        }
        if !(MIN_MAX_TOKENS..=MAX_MAX_TOKENS).contains(&self.max_tokens) {
            return Err(ValidationError::MaxTokensOutOfRange {
                min: MIN_MAX_TOKENS,
                max: MAX_MAX_TOKENS,
                actual: self.max_tokens,
            });
        }
        if self.timeout_ms == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        Ok(())
    }
}

/// The subset of generation options an adapter forwards to its vendor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdapterOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        GenerationOptions::default().adapter_options()
    }
}

/// A validated prompt submission. Fields are private so the only way to get
/// one is through [`PromptRequest::new`].
#[derive(Debug, Clone, Serialize)]
pub struct PromptRequest {
    id: Uuid,
    text: String,
    providers: Vec<ProviderId>,
    options: GenerationOptions,
}

impl PromptRequest {
    pub fn new<S: AsRef<str>>(
        text: &str,
        providers: &[S],
        options: GenerationOptions,
    ) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        let length = trimmed.chars().count();
        if length < MIN_PROMPT_CHARS {
            return Err(ValidationError::PromptTooShort {
                min: MIN_PROMPT_CHARS,
                actual: length,
            });
        }
        if length > MAX_PROMPT_CHARS {
            return Err(ValidationError::PromptTooLong {
                max: MAX_PROMPT_CHARS,
                actual: length,
            });
        }

        if providers.is_empty() {
            return Err(ValidationError::EmptyProviderList);
        }
        let mut resolved: Vec<ProviderId> = Vec::with_capacity(providers.len());
        for raw in providers {
            let id: ProviderId = raw.as_ref().parse()?;
            if !resolved.contains(&id) {
                resolved.push(id);
            }
        }

        options.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            text: trimmed.to_string(),
            providers: resolved,
            options,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn providers(&self) -> &[ProviderId] {
        &self.providers
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_char_prompt_is_rejected() {
        let err = PromptRequest::new("X", &["gemini"], GenerationOptions::default()).unwrap_err();
        assert_eq!(err, ValidationError::PromptTooShort { min: 3, actual: 1 });
    }

    #[test]
    fn test_whitespace_does_not_count_towards_length() {
        let err =
            PromptRequest::new("   ab   ", &["gemini"], GenerationOptions::default()).unwrap_err();
        assert!(matches!(err, ValidationError::PromptTooShort { actual: 2, .. }));
    }

    #[test]
    fn test_overlong_prompt_is_rejected() {
        let text = "a".repeat(2001);
        let err = PromptRequest::new(&text, &["gemini"], GenerationOptions::default()).unwrap_err();
        assert!(matches!(err, ValidationError::PromptTooLong { actual: 2001, .. }));
    }

    #[test]
    fn test_empty_and_unknown_providers_are_rejected() {
        let empty: [&str; 0] = [];
        assert_eq!(
            PromptRequest::new("hello", &empty, GenerationOptions::default()).unwrap_err(),
            ValidationError::EmptyProviderList
        );
        assert_eq!(
            PromptRequest::new("hello", &["gpt4"], GenerationOptions::default()).unwrap_err(),
            ValidationError::UnknownProvider("gpt4".to_string())
        );
    }

    #[test]
    fn test_duplicate_providers_collapse_in_first_seen_order() {
        let request = PromptRequest::new(
            "Explain quantum computing",
            &["mistral", "gemini", "MISTRAL"],
            GenerationOptions::default(),
        )
        .unwrap();
        assert_eq!(
            request.providers(),
            &[ProviderId::Mistral, ProviderId::Gemini]
        );
    }

    #[test]
    fn test_option_ranges_are_enforced() {
        let hot = GenerationOptions {
            temperature: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            hot.validate(),
            Err(ValidationError::TemperatureOutOfRange(_))
        ));

        let tiny = GenerationOptions {
            max_tokens: 10,
            ..Default::default()
        };
        assert!(matches!(
            tiny.validate(),
            Err(ValidationError::MaxTokensOutOfRange { actual: 10, .. })
        ));

        let instant = GenerationOptions {
            timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(instant.validate(), Err(ValidationError::ZeroTimeout));
        assert!(GenerationOptions::default().validate().is_ok());
    }
}
