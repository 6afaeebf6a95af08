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

use llm_contracts::ProviderId;
use std::collections::BTreeMap;
use std::env;

/// Opaque bearer credentials, one per provider. Call `dotenvy::dotenv()`
/// before `from_env` if a `.env` file should be honoured.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: BTreeMap<ProviderId, String>,
}

impl Credentials {
    pub fn env_var(id: ProviderId) -> &'static str {
        match id {
            ProviderId::Gemini => "GOOGLE_GEMINI_API_KEY",
            ProviderId::Mistral => "MISTRAL_API_KEY",
            ProviderId::HuggingFace => "HUGGINGFACE_API_KEY",
            ProviderId::Cohere => "COHERE_API_KEY",
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut credentials = Self::default();
        for id in ProviderId::ALL {
            if let Some(key) = lookup(Self::env_var(id)) {
                credentials.insert(id, key);
            }
        }
        credentials
    }

    /// Blank keys are ignored.
    pub fn insert(&mut self, id: ProviderId, key: impl Into<String>) {
        let key = key.into();
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            self.keys.insert(id, trimmed.to_string());
        }
    }

    pub fn with(mut self, id: ProviderId, key: impl Into<String>) -> Self {
        self.insert(id, key);
        self
    }

    pub fn get(&self, id: ProviderId) -> Option<&str> {
        self.keys.get(&id).map(String::as_str)
    }

    pub fn providers(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.keys.keys().copied()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("providers", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_skips_blank_values() {
        let credentials = Credentials::from_lookup(|name| match name {
            "MISTRAL_API_KEY" => Some("sk-mistral".to_string()),
            "COHERE_API_KEY" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(credentials.get(ProviderId::Mistral), Some("sk-mistral"));
        assert_eq!(credentials.get(ProviderId::Cohere), None);
        assert_eq!(credentials.providers().collect::<Vec<_>>(), vec![ProviderId::Mistral]);
    }

    #[test]
    fn test_debug_never_prints_keys() {
        let credentials = Credentials::default().with(ProviderId::Gemini, "secret-key");
        assert!(!format!("{credentials:?}").contains("secret-key"));
    }
}
