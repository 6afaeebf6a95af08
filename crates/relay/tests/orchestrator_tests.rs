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
use llm_contracts::{
    AdapterOptions, AggregationError, Completion, GenerationOptions, MetadataRegistry,
    ProviderCallResult, ProviderError, ProviderId, ResultStatus, TokenUsage, ValidationError,
};
use relay::{Orchestrator, ProviderAdapter};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone)]
enum Behaviour {
    Reply(&'static str),
    Delayed(Duration, &'static str),
    Fail,
    Panic,
    Blank,
}

struct MockAdapter {
    id: ProviderId,
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
    finished: Arc<AtomicBool>,
}

impl MockAdapter {
    fn new(id: ProviderId, behaviour: Behaviour) -> Self {
        Self {
            id,
            behaviour,
            calls: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &AdapterOptions,
    ) -> ProviderCallResult<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = match &self.behaviour {
            Behaviour::Reply(text) => *text,
            Behaviour::Delayed(delay, text) => {
                tokio::time::sleep(*delay).await;
                *text
            }
            Behaviour::Fail => {
                return Err(ProviderError::Provider("upstream exploded".to_string()));
            }
            Behaviour::Panic => panic!("adapter bug"),
            Behaviour::Blank => "   ",
        };
        self.finished.store(true, Ordering::SeqCst);
        Ok(Completion {
            text: text.to_string(),
            tokens: TokenUsage::estimate(prompt, text),
        })
    }
}

fn orchestrator(adapters: Vec<MockAdapter>) -> Orchestrator {
    Orchestrator::new(
        Arc::new(MetadataRegistry::builtin()),
        adapters
            .into_iter()
            .map(|a| Arc::new(a) as Arc<dyn ProviderAdapter>),
    )
}

fn options_with_timeout(timeout_ms: u64) -> Option<GenerationOptions> {
    Some(GenerationOptions {
        timeout_ms,
        ..GenerationOptions::default()
    })
}

#[tokio::test]
async fn test_one_result_per_provider_in_request_order() {
    let orchestrator = orchestrator(vec![
        MockAdapter::new(
            ProviderId::Gemini,
            Behaviour::Delayed(Duration::from_millis(80), "Quantum computers use qubits."),
        ),
        MockAdapter::new(ProviderId::Mistral, Behaviour::Reply("Qubits exploit superposition.")),
    ]);

    let results = orchestrator
        .aggregate("Explain quantum computing", &["gemini", "mistral"], None)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].provider, ProviderId::Gemini);
    assert_eq!(results[1].provider, ProviderId::Mistral);
    assert!(results.iter().all(|r| r.status == ResultStatus::Success));
    assert_eq!(results[0].request_id, results[1].request_id);
}

#[tokio::test]
async fn test_timeout_isolated_to_slow_provider() {
    let orchestrator = orchestrator(vec![
        MockAdapter::new(
            ProviderId::Gemini,
            Behaviour::Delayed(Duration::from_secs(10), "too late"),
        ),
        MockAdapter::new(ProviderId::Mistral, Behaviour::Reply("on time")),
    ]);

    let started = Instant::now();
    let results = orchestrator
        .aggregate("Explain quantum computing", &["gemini", "mistral"], options_with_timeout(100))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(results[0].status, ResultStatus::Timeout);
    assert!(results[0].text.is_none());
    assert_eq!(
        results[0].error_message.as_deref(),
        Some("Request timed out after 100 ms")
    );
    assert!(results[0].latency_ms >= 100);
    assert_eq!(results[1].status, ResultStatus::Success);
    assert_eq!(results[1].text.as_deref(), Some("on time"));
}

#[tokio::test]
async fn test_failures_and_panics_become_failed_results() {
    let orchestrator = orchestrator(vec![
        MockAdapter::new(ProviderId::Gemini, Behaviour::Reply("fine")),
        MockAdapter::new(ProviderId::Cohere, Behaviour::Fail),
        MockAdapter::new(ProviderId::HuggingFace, Behaviour::Panic),
        MockAdapter::new(ProviderId::Mistral, Behaviour::Blank),
    ]);

    let results = orchestrator
        .aggregate(
            "Explain quantum computing",
            &["cohere", "gemini", "huggingface", "mistral"],
            None,
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].status, ResultStatus::Failed);
    assert_eq!(
        results[0].error_message.as_deref(),
        Some("Provider error: upstream exploded")
    );
    assert_eq!(results[1].status, ResultStatus::Success);
    assert_eq!(results[2].status, ResultStatus::Failed);
    assert!(results[2].error_message.is_some());
    assert_eq!(results[3].status, ResultStatus::Failed);
    assert!(results[3].text.is_none());
}

#[tokio::test]
async fn test_validation_happens_before_any_call() {
    let adapter = MockAdapter::new(ProviderId::Mistral, Behaviour::Reply("never"));
    let calls = Arc::clone(&adapter.calls);
    let orchestrator = orchestrator(vec![adapter]);

    let err = orchestrator.aggregate("a", &["mistral"], None).await.unwrap_err();
    assert!(matches!(
        err,
        AggregationError::Validation(ValidationError::PromptTooShort { .. })
    ));

    let err = orchestrator
        .aggregate("Explain quantum computing", &["mistral", "gpt"], None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AggregationError::Validation(ValidationError::UnknownProvider(ref id)) if id == "gpt"
    ));

    let empty: [&str; 0] = [];
    let err = orchestrator
        .aggregate("Explain quantum computing", &empty, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AggregationError::Validation(ValidationError::EmptyProviderList)
    ));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unconfigured_providers_are_skipped() {
    let orchestrator = orchestrator(vec![MockAdapter::new(
        ProviderId::Mistral,
        Behaviour::Reply("bonjour"),
    )]);

    let results = orchestrator
        .aggregate("Explain quantum computing", &["cohere", "mistral"], None)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].provider, ProviderId::Mistral);

    let err = orchestrator
        .aggregate("Explain quantum computing", &["cohere"], None)
        .await
        .unwrap_err();
    match err {
        AggregationError::NoProvidersAvailable { requested } => {
            assert_eq!(requested, vec!["cohere".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_duplicate_ids_are_called_once() {
    let adapter = MockAdapter::new(ProviderId::Gemini, Behaviour::Reply("once"));
    let calls = Arc::clone(&adapter.calls);
    let orchestrator = orchestrator(vec![adapter]);

    let results = orchestrator
        .aggregate("Explain quantum computing", &["gemini", "GEMINI", "gemini"], None)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dropping_aggregate_aborts_in_flight_calls() {
    let adapter = MockAdapter::new(
        ProviderId::Gemini,
        Behaviour::Delayed(Duration::from_millis(200), "late"),
    );
    let finished = Arc::clone(&adapter.finished);
    let orchestrator = orchestrator(vec![adapter]);

    let outcome = tokio::time::timeout(
        Duration::from_millis(30),
        orchestrator.aggregate("Explain quantum computing", &["gemini"], None),
    )
    .await;
    assert!(outcome.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_available_models_lists_configured_adapters_only() {
    let orchestrator = orchestrator(vec![
        MockAdapter::new(ProviderId::Cohere, Behaviour::Reply("x")),
        MockAdapter::new(ProviderId::Mistral, Behaviour::Reply("x")),
    ]);

    let models = orchestrator.available_models();
    let ids: Vec<ProviderId> = models.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![ProviderId::Mistral, ProviderId::Cohere]);
    assert_eq!(models[0].name, "mistral-tiny");
    assert_eq!(models[0].config.max_tokens, 2048);
    assert!(models[0].sovereignty.rgpd_compliant);
    assert_eq!(
        orchestrator.configured_providers(),
        vec![ProviderId::Mistral, ProviderId::Cohere]
    );
}
