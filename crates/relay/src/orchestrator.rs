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

use crate::adapters::{build_adapters, ProviderAdapter};
use crate::credentials::Credentials;
use futures::future::join_all;
use llm_contracts::{
    AdapterOptions, AggregationError, GenerationOptions, MetadataRegistry, PromptRequest,
    ProviderError, ProviderId, ProviderResult, SovereigntyMeta,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub rate_limit_per_window: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableModel {
    pub id: ProviderId,
    pub name: String,
    pub description: String,
    pub config: ModelConfig,
    pub sovereignty: SovereigntyMeta,
}

/// Fans a prompt out to every requested provider and collects exactly one
/// [`ProviderResult`] per resolved provider, in request order.
pub struct Orchestrator {
    registry: Arc<MetadataRegistry>,
    adapters: BTreeMap<ProviderId, Arc<dyn ProviderAdapter>>,
}

/// Spawned provider calls. Dropping the guard aborts whatever is still
/// running, so a cancelled aggregate never leaks vendor requests.
#[derive(Default)]
struct InFlight {
    handles: Vec<JoinHandle<ProviderResult>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl Orchestrator {
    /// Later adapters with the same id replace earlier ones.
    pub fn new(
        registry: Arc<MetadataRegistry>,
        adapters: impl IntoIterator<Item = Arc<dyn ProviderAdapter>>,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.id(), adapter))
            .collect();
        Self { registry, adapters }
    }

    pub fn from_credentials(registry: Arc<MetadataRegistry>, credentials: &Credentials) -> Self {
        let adapters = build_adapters(credentials, &registry);
        Self::new(registry, adapters)
    }

    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }

    pub fn configured_providers(&self) -> Vec<ProviderId> {
        self.adapters.keys().copied().collect()
    }

    pub fn available_models(&self) -> Vec<AvailableModel> {
        self.adapters
            .keys()
            .filter_map(|id| {
                let profile = self.registry.profile(*id)?;
                Some(AvailableModel {
                    id: *id,
                    name: profile.model_identifier.clone(),
                    description: profile.description.clone(),
                    config: ModelConfig {
                        max_tokens: profile.max_tokens,
                        temperature: profile.default_temperature,
                        rate_limit_per_window: profile.rate_limit_per_window,
                    },
                    sovereignty: profile.sovereignty.clone(),
                })
            })
            .collect()
    }

    /// Validates the submission, then dispatches it. Options default to the
    /// registry's configured defaults.
    pub async fn aggregate<S: AsRef<str>>(
        &self,
        prompt: &str,
        providers: &[S],
        options: Option<GenerationOptions>,
    ) -> Result<Vec<ProviderResult>, AggregationError> {
        let options = options.unwrap_or(*self.registry.defaults());
        let request = PromptRequest::new(prompt, providers, options)?;
        self.aggregate_request(&request).await
    }

    pub async fn aggregate_request(
        &self,
        request: &PromptRequest,
    ) -> Result<Vec<ProviderResult>, AggregationError> {
        let resolved: Vec<(ProviderId, Arc<dyn ProviderAdapter>)> = request
            .providers()
            .iter()
            .filter_map(|id| match self.adapters.get(id) {
                Some(adapter) => Some((*id, Arc::clone(adapter))),
                None => {
                    warn!(provider = %id, "Provider not configured; skipping");
                    None
                }
            })
            .collect();

        if resolved.is_empty() {
            return Err(AggregationError::NoProvidersAvailable {
                requested: request.providers().iter().map(|id| id.to_string()).collect(),
            });
        }

        let options = request.options();
        info!(
            request_id = %request.id(),
            providers = resolved.len(),
            timeout_ms = options.timeout_ms,
            "Starting aggregation"
        );

        let started = Instant::now();
        let prompt: Arc<str> = Arc::from(request.text());
        let mut in_flight = InFlight::default();
        for (_, adapter) in &resolved {
            in_flight.handles.push(tokio::spawn(execute_single_call(
                request.id(),
                Arc::clone(adapter),
                Arc::clone(&prompt),
                options.adapter_options(),
                options.timeout_ms,
            )));
        }

        let outcomes = join_all(in_flight.handles.iter_mut()).await;

        let results: Vec<ProviderResult> = resolved
            .iter()
            .zip(outcomes)
            .map(|((id, _), outcome)| match outcome {
                Ok(result) => result,
                Err(join_error) => {
                    error!(provider = %id, error = %join_error, "Provider task did not complete");
                    let message = if join_error.is_panic() {
                        "Provider task panicked".to_string()
                    } else {
                        "Provider task was cancelled".to_string()
                    };
                    ProviderResult::failed(request.id(), *id, message, elapsed_ms(started))
                }
            })
            .collect();

        let successful = results.iter().filter(|r| r.is_success()).count();
        info!(
            request_id = %request.id(),
            successful,
            total = results.len(),
            elapsed_ms = elapsed_ms(started),
            "Aggregation complete"
        );

        Ok(results)
    }
}

async fn execute_single_call(
    request_id: Uuid,
    adapter: Arc<dyn ProviderAdapter>,
    prompt: Arc<str>,
    options: AdapterOptions,
    timeout_ms: u64,
) -> ProviderResult {
    let provider = adapter.id();
    let start_time = Instant::now();
    debug!(provider = %provider, model = adapter.model(), "Dispatching provider call");

    let execution_result = timeout(
        Duration::from_millis(timeout_ms),
        adapter.generate(&prompt, &options),
    )
    .await;
    let latency_ms = elapsed_ms(start_time);

    match execution_result {
        Ok(Ok(completion)) if completion.text.trim().is_empty() => {
            error!(provider = %provider, "Provider returned an empty completion");
            ProviderResult::failed(
                request_id,
                provider,
                ProviderError::EmptyCompletion.to_string(),
                latency_ms,
            )
        }
        Ok(Ok(completion)) => {
            debug!(provider = %provider, latency_ms, tokens = completion.tokens.total, "Provider call succeeded");
            ProviderResult::success(request_id, provider, completion, latency_ms)
        }
        Ok(Err(e)) => {
            error!(provider = %provider, latency_ms, error = %e, "Provider call failed");
            ProviderResult::failed(request_id, provider, e.to_string(), latency_ms)
        }
        Err(_) => {
            warn!(provider = %provider, timeout_ms, "Provider call timed out");
            ProviderResult::timed_out(request_id, provider, timeout_ms, latency_ms)
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
