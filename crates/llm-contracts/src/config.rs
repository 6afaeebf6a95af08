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

use crate::requests::GenerationOptions;
use crate::types::{ConfigError, ProviderId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Where servers sit or where a company is incorporated. Anything the tables
/// do not name collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Jurisdiction {
    France,
    Eu,
    Usa,
    China,
    Other,
}

impl Jurisdiction {
    pub fn is_eu(&self) -> bool {
        matches!(self, Jurisdiction::France | Jurisdiction::Eu)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Jurisdiction::France => "France",
            Jurisdiction::Eu => "EU",
            Jurisdiction::Usa => "USA",
            Jurisdiction::China => "China",
            Jurisdiction::Other => "Other",
        }
    }
}

impl From<String> for Jurisdiction {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "france" => Jurisdiction::France,
            "eu" => Jurisdiction::Eu,
            "usa" | "us" => Jurisdiction::Usa,
            "china" => Jurisdiction::China,
            _ => Jurisdiction::Other,
        }
    }
}

impl From<&str> for Jurisdiction {
    fn from(s: &str) -> Self {
        Jurisdiction::from(s.to_string())
    }
}

impl From<Jurisdiction> for String {
    fn from(j: Jurisdiction) -> Self {
        j.as_str().to_string()
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LicenseType {
    OpenSource,
    OpenWeights,
    Proprietary,
    Unknown,
}

impl LicenseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseType::OpenSource => "Open Source",
            LicenseType::OpenWeights => "Open Weights",
            LicenseType::Proprietary => "Proprietary",
            LicenseType::Unknown => "Unknown",
        }
    }
}

impl From<String> for LicenseType {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "open source" => LicenseType::OpenSource,
            "open weights" => LicenseType::OpenWeights,
            "proprietary" => LicenseType::Proprietary,
            _ => LicenseType::Unknown,
        }
    }
}

impl From<&str> for LicenseType {
    fn from(s: &str) -> Self {
        LicenseType::from(s.to_string())
    }
}

impl From<LicenseType> for String {
    fn from(l: LicenseType) -> Self {
        l.as_str().to_string()
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SovereigntyMeta {
    pub hosting_country: Jurisdiction,
    pub company_nationality: Jurisdiction,
    pub license_type: LicenseType,
    pub cloud_provider: String,
    pub retention_policy: String,
    pub rgpd_compliant: bool,
    /// Raw configured name when `hosting_country` fell back to `Other`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosting_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_label: Option<String>,
}

impl SovereigntyMeta {
    pub fn set_hosting_country(&mut self, raw: &str) {
        self.hosting_country = Jurisdiction::from(raw);
        self.hosting_label = unnamed_label(self.hosting_country, raw);
    }

    pub fn set_company_nationality(&mut self, raw: &str) {
        self.company_nationality = Jurisdiction::from(raw);
        self.company_label = unnamed_label(self.company_nationality, raw);
    }

    /// Hosting location for reports: the configured name, or the jurisdiction.
    pub fn hosting_location(&self) -> &str {
        self.hosting_label
            .as_deref()
            .unwrap_or_else(|| self.hosting_country.as_str())
    }

    pub fn company_location(&self) -> &str {
        self.company_label
            .as_deref()
            .unwrap_or_else(|| self.company_nationality.as_str())
    }
}

fn unnamed_label(jurisdiction: Jurisdiction, raw: &str) -> Option<String> {
    let raw = raw.trim();
    (jurisdiction == Jurisdiction::Other && !raw.is_empty()).then(|| raw.to_string())
}

impl Default for SovereigntyMeta {
    fn default() -> Self {
        Self {
            hosting_country: Jurisdiction::Other,
            company_nationality: Jurisdiction::Other,
            license_type: LicenseType::Unknown,
            cloud_provider: "Unknown".to_string(),
            retention_policy: "Unknown".to_string(),
            rgpd_compliant: false,
            hosting_label: None,
            company_label: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub model_identifier: String,
    pub description: String,
    pub max_tokens: u32,
    pub default_temperature: f32,
    pub rate_limit_per_window: u32,
    pub sovereignty: SovereigntyMeta,
    pub energy_per_k_token_kwh: f64,
}

/// Partial profile read from TOML; every field left out keeps the built-in
/// value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderProfileOverride {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub model_identifier: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub default_temperature: Option<f32>,
    #[serde(default)]
    pub rate_limit_per_window: Option<u32>,
    #[serde(default)]
    pub energy_per_k_token_kwh: Option<f64>,
    #[serde(default)]
    pub hosting_country: Option<String>,
    #[serde(default)]
    pub company_nationality: Option<String>,
    #[serde(default)]
    pub license_type: Option<LicenseType>,
    #[serde(default)]
    pub cloud_provider: Option<String>,
    #[serde(default)]
    pub retention_policy: Option<String>,
    #[serde(default)]
    pub rgpd_compliant: Option<bool>,
}

impl ProviderProfileOverride {
    pub fn apply(&self, mut profile: ProviderProfile) -> ProviderProfile {
        if let Some(model) = &self.model_identifier {
            profile.model_identifier = model.clone();
        }
        if let Some(description) = &self.description {
            profile.description = description.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            profile.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.default_temperature {
            profile.default_temperature = temperature;
        }
        if let Some(rate) = self.rate_limit_per_window {
            profile.rate_limit_per_window = rate;
        }
        if let Some(energy) = self.energy_per_k_token_kwh {
            profile.energy_per_k_token_kwh = energy;
        }
        if let Some(hosting) = &self.hosting_country {
            profile.sovereignty.set_hosting_country(hosting);
        }
        if let Some(company) = &self.company_nationality {
            profile.sovereignty.set_company_nationality(company);
        }
        if let Some(license) = self.license_type {
            profile.sovereignty.license_type = license;
        }
        if let Some(cloud) = &self.cloud_provider {
            profile.sovereignty.cloud_provider = cloud.clone();
        }
        if let Some(retention) = &self.retention_policy {
            profile.sovereignty.retention_policy = retention.clone();
        }
        if let Some(rgpd) = self.rgpd_compliant {
            profile.sovereignty.rgpd_compliant = rgpd;
        }
        profile
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub defaults: GenerationOptions,
    #[serde(default)]
    pub providers: BTreeMap<ProviderId, ProviderProfileOverride>,
}

impl RegistryConfig {
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config/prism.toml")
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(config_path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
            path: config_path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// A missing file is not an error; a present but malformed one is.
    pub fn load_or_default(config_path: &Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            Self::load_from_file(config_path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.defaults
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("defaults: {e}")))?;
        for (id, profile) in &self.providers {
            if let Some(energy) = profile.energy_per_k_token_kwh {
                if !energy.is_finite() || energy < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "{id}: energy_per_k_token_kwh must be a non-negative number"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unknown_labels_fall_back() {
        assert_eq!(Jurisdiction::from("Canada"), Jurisdiction::Other);
        assert_eq!(Jurisdiction::from("eu"), Jurisdiction::Eu);
        assert_eq!(LicenseType::from("open_weights"), LicenseType::OpenWeights);
        assert_eq!(LicenseType::from("GPL-ish"), LicenseType::Unknown);
    }

    #[test]
    fn test_toml_overrides_parse() {
        let config = RegistryConfig::from_toml_str(
            r#"
            [defaults]
            timeout_ms = 5000

            [providers.mistral]
            model_identifier = "mistral-small"
            hosting_country = "EU"

            [providers.cohere]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.defaults.timeout_ms, 5000);
        assert_eq!(config.defaults.max_tokens, 500);
        let mistral = &config.providers[&ProviderId::Mistral];
        assert_eq!(mistral.model_identifier.as_deref(), Some("mistral-small"));
        assert_eq!(mistral.hosting_country.as_deref(), Some("EU"));
        assert_eq!(config.providers[&ProviderId::Cohere].enabled, Some(false));
    }

    #[test]
    fn test_unnamed_country_keeps_configured_name() {
        let mut meta = SovereigntyMeta::default();
        meta.set_hosting_country(" Canada ");
        meta.set_company_nationality("eu");

        assert_eq!(meta.hosting_country, Jurisdiction::Other);
        assert_eq!(meta.hosting_location(), "Canada");
        assert_eq!(meta.company_nationality, Jurisdiction::Eu);
        assert_eq!(meta.company_label, None);
        assert_eq!(meta.company_location(), "EU");

        meta.set_hosting_country("France");
        assert_eq!(meta.hosting_label, None);
        assert_eq!(meta.hosting_location(), "France");
    }

    #[test]
    fn test_invalid_defaults_are_rejected() {
        let err = RegistryConfig::from_toml_str("[defaults]\ntemperature = 3.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_or_default_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let config = RegistryConfig::load_or_default(&missing).unwrap();
        assert!(config.providers.is_empty());

        let present = dir.path().join("prism.toml");
        let mut file = fs::File::create(&present).unwrap();
        writeln!(file, "[providers.gemini]\nmax_tokens = 1024").unwrap();
        let config = RegistryConfig::load_or_default(&present).unwrap();
        assert_eq!(config.providers[&ProviderId::Gemini].max_tokens, Some(1024));
    }
}
