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

use crate::config::{Jurisdiction, LicenseType, ProviderProfile, RegistryConfig, SovereigntyMeta};
use crate::requests::GenerationOptions;
use crate::types::ProviderId;
use std::collections::BTreeMap;

/// Read-only provider metadata, built once at start-up and shared behind an
/// `Arc`. Entries may be missing; lookups return `None` rather than failing.
#[derive(Debug, Clone)]
pub struct MetadataRegistry {
    profiles: BTreeMap<ProviderId, ProviderProfile>,
    defaults: GenerationOptions,
}

impl MetadataRegistry {
    pub fn builtin() -> Self {
        let profiles = ProviderId::ALL
            .into_iter()
            .map(|id| (id, builtin_profile(id)))
            .collect();
        Self {
            profiles,
            defaults: GenerationOptions::default(),
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        let mut registry = Self::builtin();
        registry.defaults = config.defaults;
        for (id, overrides) in &config.providers {
            if overrides.enabled == Some(false) {
                registry.profiles.remove(id);
                continue;
            }
            if let Some(profile) = registry.profiles.remove(id) {
                registry.profiles.insert(*id, overrides.apply(profile));
            }
        }
        registry
    }

    pub fn with_profiles(
        profiles: impl IntoIterator<Item = (ProviderId, ProviderProfile)>,
    ) -> Self {
        Self {
            profiles: profiles.into_iter().collect(),
            defaults: GenerationOptions::default(),
        }
    }

    pub fn profile(&self, id: ProviderId) -> Option<&ProviderProfile> {
        self.profiles.get(&id)
    }

    pub fn sovereignty(&self, id: ProviderId) -> Option<&SovereigntyMeta> {
        self.profiles.get(&id).map(|p| &p.sovereignty)
    }

    pub fn profiles(&self) -> impl Iterator<Item = (ProviderId, &ProviderProfile)> {
        self.profiles.iter().map(|(id, p)| (*id, p))
    }

    pub fn contains(&self, id: ProviderId) -> bool {
        self.profiles.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn defaults(&self) -> &GenerationOptions {
        &self.defaults
    }
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_profile(id: ProviderId) -> ProviderProfile {
    match id {
        ProviderId::Gemini => ProviderProfile {
            model_identifier: "gemini-2.5-flash".to_string(),
            description: "Google Gemini Pro - Free tier".to_string(),
            max_tokens: 2048,
            default_temperature: 0.7,
            rate_limit_per_window: 60,
            sovereignty: SovereigntyMeta {
                hosting_country: Jurisdiction::Usa,
                company_nationality: Jurisdiction::Usa,
                license_type: LicenseType::Proprietary,
                cloud_provider: "Google Cloud".to_string(),
                retention_policy: "30 days".to_string(),
                rgpd_compliant: true,
                hosting_label: None,
                company_label: None,
            },
            energy_per_k_token_kwh: 0.005,
        },
        ProviderId::Mistral => ProviderProfile {
            model_identifier: "mistral-tiny".to_string(),
            description: "Mistral Tiny - Free tier".to_string(),
            max_tokens: 2048,
            default_temperature: 0.7,
            rate_limit_per_window: 10,
            sovereignty: SovereigntyMeta {
                hosting_country: Jurisdiction::France,
                company_nationality: Jurisdiction::France,
                license_type: LicenseType::OpenWeights,
                cloud_provider: "European Cloud (Scaleway)".to_string(),
                retention_policy: "No retention".to_string(),
                rgpd_compliant: true,
                hosting_label: None,
                company_label: None,
            },
            energy_per_k_token_kwh: 0.002,
        },
        ProviderId::HuggingFace => ProviderProfile {
            model_identifier: "meta-llama/Llama-3.2-3B-Instruct".to_string(),
            description: "Meta Llama 3.2 3B via Hugging Face".to_string(),
            max_tokens: 1024,
            default_temperature: 0.7,
            rate_limit_per_window: 100,
            sovereignty: SovereigntyMeta {
                hosting_country: Jurisdiction::Usa,
                company_nationality: Jurisdiction::Usa,
                license_type: LicenseType::OpenSource,
                cloud_provider: "AWS/Azure (Multi-cloud)".to_string(),
                retention_policy: "Variable".to_string(),
                rgpd_compliant: true,
                hosting_label: None,
                company_label: None,
            },
            energy_per_k_token_kwh: 0.004,
        },
        ProviderId::Cohere => ProviderProfile {
            model_identifier: "command-r-08-2024".to_string(),
            description: "Cohere Command R".to_string(),
            max_tokens: 2048,
            default_temperature: 0.7,
            rate_limit_per_window: 5000,
            sovereignty: SovereigntyMeta {
                hosting_country: Jurisdiction::Usa,
                company_nationality: Jurisdiction::Usa,
                license_type: LicenseType::Proprietary,
                cloud_provider: "AWS".to_string(),
                retention_policy: "90 days".to_string(),
                rgpd_compliant: false,
                hosting_label: None,
                company_label: None,
            },
            energy_per_k_token_kwh: 0.006,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderProfileOverride;

    #[test]
    fn test_builtin_registry_covers_every_provider() {
        let registry = MetadataRegistry::builtin();
        assert_eq!(registry.len(), ProviderId::ALL.len());
        let mistral = registry.sovereignty(ProviderId::Mistral).unwrap();
        assert_eq!(mistral.hosting_country, Jurisdiction::France);
        assert_eq!(mistral.license_type, LicenseType::OpenWeights);
    }

    #[test]
    fn test_config_can_disable_and_override() {
        let mut config = RegistryConfig::default();
        config.providers.insert(
            ProviderId::Cohere,
            ProviderProfileOverride {
                enabled: Some(false),
                ..Default::default()
            },
        );
        config.providers.insert(
            ProviderId::Gemini,
            ProviderProfileOverride {
                hosting_country: Some("EU".to_string()),
                ..Default::default()
            },
        );

        let registry = MetadataRegistry::from_config(&config);
        assert!(!registry.contains(ProviderId::Cohere));
        assert!(registry.profile(ProviderId::Cohere).is_none());
        assert_eq!(
            registry.sovereignty(ProviderId::Gemini).unwrap().hosting_country,
            Jurisdiction::Eu
        );
        assert_eq!(
            registry.profile(ProviderId::Gemini).unwrap().model_identifier,
            "gemini-2.5-flash"
        );
    }
}
