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

use crate::error::{ScoringError, ScoringResult};
use crate::green::{GreenEstimator, GreenImpact};
use crate::sovereignty::{SovereigntyScore, SovereigntyScorer};
use crate::summary::ComparativeSummary;
use crate::text::{TextAnalysis, TextAnalyzer};
use llm_contracts::{MetadataRegistry, ProviderResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const RELEVANCE_WEIGHT: f64 = 0.45;
pub const SOVEREIGNTY_WEIGHT: f64 = 0.25;
pub const SIMILARITY_WEIGHT: f64 = 0.20;
pub const SPEED_WEIGHT: f64 = 0.10;

pub const DEFAULT_RELEVANCE: u8 = 50;
pub const DEFAULT_SIMILARITY: u8 = 50;
pub const DEFAULT_SPEED: u8 = 50;

const PROMPT_KEYWORDS: usize = 5;

/// Square, symmetric, diagonal 100. One row per successful response, in
/// input order.
pub type SimilarityMatrix = Vec<Vec<u8>>;

/// A provider result with every metric attached. Metric fields are `None`
/// unless the result succeeded with text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResponse {
    #[serde(flatten)]
    pub result: ProviderResult,
    pub model: Option<String>,
    pub relevance: Option<u8>,
    pub similarity: Option<u8>,
    pub speed: Option<u8>,
    pub composite: Option<u8>,
    pub sovereignty: Option<SovereigntyScore>,
    pub green_impact: GreenImpact,
    pub text_analysis: TextAnalysis,
}

impl ScoredResponse {
    pub fn is_scored(&self) -> bool {
        self.composite.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub request_id: Option<Uuid>,
    pub prompt: String,
    pub responses: Vec<ScoredResponse>,
    pub summary: ComparativeSummary,
    pub similarity_matrix: SimilarityMatrix,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    registry: Arc<MetadataRegistry>,
    analyzer: TextAnalyzer,
    sovereignty: SovereigntyScorer,
    green: GreenEstimator,
}

impl ScoringEngine {
    pub fn new(registry: Arc<MetadataRegistry>) -> Self {
        Self {
            registry,
            analyzer: TextAnalyzer::new(),
            sovereignty: SovereigntyScorer::new(),
            green: GreenEstimator::default(),
        }
    }

    pub fn with_green_estimator(mut self, green: GreenEstimator) -> Self {
        self.green = green;
        self
    }

    pub fn analyzer(&self) -> &TextAnalyzer {
        &self.analyzer
    }

    pub fn green_estimator(&self) -> &GreenEstimator {
        &self.green
    }

    /// One scored response per input result, same order. The inputs are
    /// copied into the output untouched.
    pub fn score_all_responses(
        &self,
        results: &[ProviderResult],
        original_prompt: &str,
    ) -> Vec<ScoredResponse> {
        let texts: Vec<Option<&str>> = results.iter().map(ProviderResult::scorable_text).collect();
        let max_latency = results.iter().map(|r| r.latency_ms).max().unwrap_or(0);

        results
            .iter()
            .enumerate()
            .map(|(index, result)| {
                let profile = self.registry.profile(result.provider);
                let sovereignty = profile.map(|p| self.sovereignty.calculate_sovereignty(&p.sovereignty));
                let model = profile.map(|p| p.model_identifier.clone());

                let Some(text) = texts[index] else {
                    debug!(provider = %result.provider, status = %result.status, "Response not scorable");
                    return ScoredResponse {
                        result: result.clone(),
                        model,
                        relevance: None,
                        similarity: None,
                        speed: None,
                        composite: None,
                        sovereignty,
                        green_impact: GreenImpact::empty(),
                        text_analysis: TextAnalysis::default(),
                    };
                };

                let others = texts
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != index)
                    .filter_map(|(_, t)| *t);

                let relevance = self
                    .calculate_relevance(text, original_prompt)
                    .unwrap_or_else(|e| degraded(result, "relevance", e, DEFAULT_RELEVANCE));
                let similarity = self
                    .calculate_average_similarity(text, others)
                    .unwrap_or_else(|e| degraded(result, "similarity", e, DEFAULT_SIMILARITY));
                let speed = calculate_speed(result.latency_ms, max_latency)
                    .unwrap_or_else(|e| degraded(result, "speed", e, DEFAULT_SPEED));
                let composite = calculate_composite(
                    relevance,
                    sovereignty.as_ref().map(|s| s.total),
                    similarity,
                    speed,
                );

                let green_impact = self.green.calculate_impact(
                    &result.token_usage,
                    profile.map(|p| p.energy_per_k_token_kwh),
                    profile.map(|p| p.sovereignty.hosting_country),
                );

                debug!(
                    provider = %result.provider,
                    relevance,
                    similarity,
                    speed,
                    composite,
                    "Scored response"
                );

                ScoredResponse {
                    result: result.clone(),
                    model,
                    relevance: Some(relevance),
                    similarity: Some(similarity),
                    speed: Some(speed),
                    composite: Some(composite),
                    sovereignty,
                    green_impact,
                    text_analysis: self.analyzer.analyze_text(text),
                }
            })
            .collect()
    }

    /// Lexical overlap with the prompt (40), a length band (20) and the
    /// share of the prompt's top keywords echoed in the response (40).
    pub fn calculate_relevance(&self, response: &str, prompt: &str) -> ScoringResult<u8> {
        if response.trim().is_empty() {
            return Err(ScoringError::BlankResponse);
        }

        let mut score = self.analyzer.calculate_similarity(response, prompt) * 40.0;

        let words = self.analyzer.count_words(response);
        if words > 20 && words < 500 {
            score += 20.0;
        } else if words >= 10 {
            score += 10.0;
        }

        let keywords = self.analyzer.extract_keywords(prompt, PROMPT_KEYWORDS);
        if !keywords.is_empty() {
            let lowered = response.to_lowercase();
            let matches = keywords
                .iter()
                .filter(|k| lowered.contains(&k.word.to_lowercase()))
                .count();
            score += matches as f64 / keywords.len() as f64 * 40.0;
        }

        Ok(to_score(score))
    }

    /// Mean Jaccard similarity to every other successful response. A lone
    /// response is in full agreement with itself.
    pub fn calculate_average_similarity<'a>(
        &self,
        response: &str,
        others: impl IntoIterator<Item = &'a str>,
    ) -> ScoringResult<u8> {
        let others: Vec<&str> = others.into_iter().collect();
        if others.is_empty() {
            return Ok(100);
        }
        if self.analyzer.count_words(response) == 0 {
            return Err(ScoringError::NoComparableTokens);
        }

        let total: f64 = others
            .iter()
            .map(|other| self.analyzer.calculate_similarity(response, other))
            .sum();
        Ok(to_score(total / others.len() as f64 * 100.0))
    }

    pub fn calculate_similarity_matrix(&self, scored: &[ScoredResponse]) -> SimilarityMatrix {
        let texts: Vec<&str> = scored
            .iter()
            .filter_map(|s| s.result.scorable_text())
            .collect();
        let n = texts.len();
        let mut matrix = vec![vec![100u8; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let similarity = to_score(self.analyzer.calculate_similarity(texts[i], texts[j]) * 100.0);
                matrix[i][j] = similarity;
                matrix[j][i] = similarity;
            }
        }

        matrix
    }

    pub fn generate_comparative_summary(&self, scored: &[ScoredResponse]) -> ComparativeSummary {
        ComparativeSummary::from_scored(scored, &self.green)
    }

    /// Scores, summarises and cross-compares one batch of results.
    pub fn analyse(&self, results: &[ProviderResult], original_prompt: &str) -> AnalysisReport {
        let responses = self.score_all_responses(results, original_prompt);
        let summary = self.generate_comparative_summary(&responses);
        let similarity_matrix = self.calculate_similarity_matrix(&responses);

        info!(
            responses = responses.len(),
            successful = summary.successful_responses,
            average_composite = summary.average_composite,
            "Analysis complete"
        );

        AnalysisReport {
            request_id: results.first().map(|r| r.request_id),
            prompt: original_prompt.to_string(),
            responses,
            summary,
            similarity_matrix,
        }
    }
}

/// Inverse-normalised latency: the fastest possible call scores 100, the
/// slowest in the batch scores 0.
pub fn calculate_speed(latency_ms: u64, max_latency_ms: u64) -> ScoringResult<u8> {
    if max_latency_ms == 0 {
        return Err(ScoringError::NoLatencyData);
    }
    Ok(to_score(100.0 * (1.0 - latency_ms as f64 / max_latency_ms as f64)))
}

/// Missing sovereignty counts as zero.
pub fn calculate_composite(relevance: u8, sovereignty: Option<u8>, similarity: u8, speed: u8) -> u8 {
    to_score(
        f64::from(relevance) * RELEVANCE_WEIGHT
            + f64::from(sovereignty.unwrap_or(0)) * SOVEREIGNTY_WEIGHT
            + f64::from(similarity) * SIMILARITY_WEIGHT
            + f64::from(speed) * SPEED_WEIGHT,
    )
}

fn to_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

fn degraded(result: &ProviderResult, metric: &str, error: ScoringError, default: u8) -> u8 {
    warn!(provider = %result.provider, metric, error = %error, default, "Metric degraded to default");
    default
}
