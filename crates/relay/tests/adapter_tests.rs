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

use llm_contracts::{AdapterOptions, MetadataRegistry, ProviderError, ProviderId, TokenUsage};
use relay::adapters::{CohereAdapter, GeminiAdapter, HuggingFaceAdapter, MistralAdapter};
use relay::{build_adapters, Credentials, ProviderAdapter};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROMPT: &str = "Explain quantum computing";

fn options() -> AdapterOptions {
    AdapterOptions {
        temperature: 0.3,
        max_tokens: 256,
    }
}

fn profile(id: ProviderId) -> llm_contracts::ProviderProfile {
    MetadataRegistry::builtin()
        .profile(id)
        .cloned()
        .expect("builtin profile")
}

#[tokio::test]
async fn test_gemini_request_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "gemini-key"))
        .and(body_partial_json(json!({ "generationConfig": { "maxOutputTokens": 256 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Qubits can be 0 and 1." }] } }],
            "usageMetadata": { "promptTokenCount": 5, "candidatesTokenCount": 9 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = GeminiAdapter::new("gemini-key".to_string(), &profile(ProviderId::Gemini))
        .unwrap()
        .with_base_url(server.uri());
    let completion = adapter.generate(PROMPT, &options()).await.unwrap();

    assert_eq!(completion.text, "Qubits can be 0 and 1.");
    assert_eq!(completion.tokens, TokenUsage { input: 5, output: 9, total: 14 });
}

#[tokio::test]
async fn test_mistral_uses_bearer_auth_and_chat_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer mistral-key"))
        .and(body_partial_json(json!({
            "model": "mistral-tiny",
            "messages": [{ "role": "user", "content": PROMPT }],
            "max_tokens": 256
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Les qubits." } }],
            "usage": { "prompt_tokens": 6, "completion_tokens": 4, "total_tokens": 10 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = MistralAdapter::new("mistral-key".to_string(), &profile(ProviderId::Mistral))
        .unwrap()
        .with_base_url(server.uri());
    let completion = adapter.generate(PROMPT, &options()).await.unwrap();

    assert_eq!(completion.text, "Les qubits.");
    assert_eq!(completion.tokens.total, 10);
}

#[tokio::test]
async fn test_huggingface_estimates_tokens_without_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "meta-llama/Llama-3.2-3B-Instruct" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "abcdefgh" } }]
        })))
        .mount(&server)
        .await;

    let adapter =
        HuggingFaceAdapter::new("hf-key".to_string(), &profile(ProviderId::HuggingFace))
            .unwrap()
            .with_base_url(server.uri());
    let completion = adapter.generate(PROMPT, &options()).await.unwrap();

    // 25 prompt chars -> 7 tokens, 8 completion chars -> 2 tokens
    assert_eq!(completion.tokens, TokenUsage { input: 7, output: 2, total: 9 });
}

#[tokio::test]
async fn test_cohere_reads_meta_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(header("authorization", "Bearer cohere-key"))
        .and(body_partial_json(json!({ "message": PROMPT, "model": "command-r-08-2024" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "Quantum computing uses qubits.",
            "meta": { "tokens": { "input_tokens": 12, "output_tokens": 6 } }
        })))
        .mount(&server)
        .await;

    let adapter = CohereAdapter::new("cohere-key".to_string(), &profile(ProviderId::Cohere))
        .unwrap()
        .with_base_url(server.uri());
    let completion = adapter.generate(PROMPT, &options()).await.unwrap();

    assert_eq!(completion.tokens, TokenUsage { input: 12, output: 6, total: 18 });
}

#[tokio::test]
async fn test_http_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer bad-key"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;
    Mock::given(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer busy-key"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer broken-key"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let adapter_with = |key: &str| {
        MistralAdapter::new(key.to_string(), &profile(ProviderId::Mistral))
            .unwrap()
            .with_base_url(server.uri())
    };

    let err = adapter_with("bad-key").generate(PROMPT, &options()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Authentication(ref m) if m.contains("invalid api key")));

    let err = adapter_with("busy-key").generate(PROMPT, &options()).await.unwrap_err();
    assert!(matches!(err, ProviderError::RateLimit));

    let err = adapter_with("broken-key").generate(PROMPT, &options()).await.unwrap_err();
    match err {
        ProviderError::Provider(message) => {
            assert!(message.starts_with("Mistral API error 503"));
            assert!(message.contains("overloaded"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_blank_completion_and_bad_json() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/chat"))
        .and(header("authorization", "Bearer blank-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "  \n " })))
        .mount(&server)
        .await;
    Mock::given(path("/v1/chat"))
        .and(header("authorization", "Bearer junk-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let blank = CohereAdapter::new("blank-key".to_string(), &profile(ProviderId::Cohere))
        .unwrap()
        .with_base_url(server.uri());
    assert!(matches!(
        blank.generate(PROMPT, &options()).await,
        Err(ProviderError::EmptyCompletion)
    ));

    let junk = CohereAdapter::new("junk-key".to_string(), &profile(ProviderId::Cohere))
        .unwrap()
        .with_base_url(server.uri());
    assert!(matches!(
        junk.generate(PROMPT, &options()).await,
        Err(ProviderError::Serialisation(_))
    ));
}

/// Serves one request with an error status whose body is cut short of its
/// declared length.
async fn serve_truncated_error() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            request.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&request).to_lowercase();
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + body_len {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        stream
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial")
            .await
            .unwrap();
        stream.shutdown().await.unwrap();
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest).await;
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_unreadable_error_body_still_maps_status() {
    let adapter = MistralAdapter::new("k".to_string(), &profile(ProviderId::Mistral))
        .unwrap()
        .with_base_url(serve_truncated_error().await);

    match adapter.generate(PROMPT, &options()).await {
        Err(ProviderError::Provider(message)) => {
            assert!(message.starts_with("Mistral API error 500"));
            assert!(message.ends_with(": "));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_a_network_error() {
    let adapter = GeminiAdapter::new("k".to_string(), &profile(ProviderId::Gemini))
        .unwrap()
        .with_base_url("http://127.0.0.1:9");
    assert!(matches!(
        adapter.generate(PROMPT, &options()).await,
        Err(ProviderError::Network(_))
    ));
}

#[test]
fn test_build_adapters_only_registers_credentialed_providers() {
    let credentials = Credentials::default()
        .with(ProviderId::Mistral, "m")
        .with(ProviderId::Cohere, "c");
    let adapters = build_adapters(&credentials, &MetadataRegistry::builtin());
    let ids: Vec<ProviderId> = adapters.iter().map(|a| a.id()).collect();
    assert_eq!(ids, vec![ProviderId::Mistral, ProviderId::Cohere]);
    assert_eq!(adapters[0].model(), "mistral-tiny");
}
