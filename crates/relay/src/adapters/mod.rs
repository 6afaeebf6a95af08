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

pub mod cohere;
pub mod gemini;
pub mod http;
pub mod huggingface;
pub mod mistral;

use crate::credentials::Credentials;
use async_trait::async_trait;
use llm_contracts::{
    AdapterOptions, Completion, MetadataRegistry, ProviderCallResult, ProviderId,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Uniform contract over one vendor: a prompt in, text plus token usage out.
/// Implementations fail with a `ProviderError` instead of returning empty text.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    fn model(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        options: &AdapterOptions,
    ) -> ProviderCallResult<Completion>;
}

pub use cohere::CohereAdapter;
pub use gemini::GeminiAdapter;
pub use huggingface::HuggingFaceAdapter;
pub use mistral::MistralAdapter;

/// Builds one adapter per provider that has both a credential and a registry
/// profile. Providers missing either are skipped, never an error.
pub fn build_adapters(
    credentials: &Credentials,
    registry: &MetadataRegistry,
) -> Vec<Arc<dyn ProviderAdapter>> {
    let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();

    for id in ProviderId::ALL {
        let Some(api_key) = credentials.get(id) else {
            warn!(provider = %id, "API key not found; provider will not be registered");
            continue;
        };
        let Some(profile) = registry.profile(id) else {
            warn!(provider = %id, "No registry profile; provider will not be registered");
            continue;
        };

        let built: ProviderCallResult<Arc<dyn ProviderAdapter>> = match id {
            ProviderId::Gemini => GeminiAdapter::new(api_key.to_string(), profile)
                .map(|a| Arc::new(a) as Arc<dyn ProviderAdapter>),
            ProviderId::Mistral => MistralAdapter::new(api_key.to_string(), profile)
                .map(|a| Arc::new(a) as Arc<dyn ProviderAdapter>),
            ProviderId::HuggingFace => HuggingFaceAdapter::new(api_key.to_string(), profile)
                .map(|a| Arc::new(a) as Arc<dyn ProviderAdapter>),
            ProviderId::Cohere => CohereAdapter::new(api_key.to_string(), profile)
                .map(|a| Arc::new(a) as Arc<dyn ProviderAdapter>),
        };

        match built {
            Ok(adapter) => {
                info!(provider = %id, model = adapter.model(), "Provider initialised");
                adapters.push(adapter);
            }
            Err(e) => warn!(provider = %id, error = %e, "Failed to initialise provider"),
        }
    }

    adapters
}
