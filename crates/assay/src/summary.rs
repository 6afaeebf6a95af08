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

use crate::green::{GreenEstimator, TotalImpact};
use crate::round_to;
use crate::scoring::ScoredResponse;
use indexmap::IndexMap;
use llm_contracts::{ProviderId, ResultStatus};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_LOCATION: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseHighlight {
    pub provider: ProviderId,
    pub model: Option<String>,
    pub composite: u8,
    pub relevance: Option<u8>,
    pub sovereignty: Option<u8>,
}

impl ResponseHighlight {
    fn from_scored(scored: &ScoredResponse) -> Self {
        Self {
            provider: scored.result.provider,
            model: scored.model.clone(),
            composite: scored.composite.unwrap_or(0),
            relevance: scored.relevance,
            sovereignty: scored.sovereignty.as_ref().map(|s| s.total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeSummary {
    pub total_responses: usize,
    pub successful_responses: usize,
    pub failed_responses: usize,
    pub timed_out_responses: usize,
    pub average_relevance: u8,
    pub average_similarity: u8,
    pub average_sovereignty: u8,
    pub average_composite: u8,
    /// Over every response, failures included.
    pub average_response_time: u64,
    pub best_response: Option<ResponseHighlight>,
    pub worst_response: Option<ResponseHighlight>,
    /// Mean similarity of the successful responses, 0..=100.
    pub consensus_level: f64,
    pub sovereignty_distribution: IndexMap<String, usize>,
    pub green_impact: TotalImpact,
}

impl ComparativeSummary {
    pub fn from_scored(scored: &[ScoredResponse], green: &GreenEstimator) -> Self {
        let successful: Vec<&ScoredResponse> =
            scored.iter().filter(|s| s.result.is_success()).collect();
        let count_status = |status: ResultStatus| {
            scored.iter().filter(|s| s.result.status == status).count()
        };

        let average_response_time = if scored.is_empty() {
            0
        } else {
            let total: u64 = scored.iter().map(|s| s.result.latency_ms).sum();
            (total as f64 / scored.len() as f64).round() as u64
        };

        let mut sovereignty_distribution: IndexMap<String, usize> = IndexMap::new();
        for response in scored {
            let location = response
                .sovereignty
                .as_ref()
                .map(|s| s.metadata.hosting_location().to_string())
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
            *sovereignty_distribution.entry(location).or_insert(0) += 1;
        }

        let impacts: Vec<_> = scored.iter().map(|s| s.green_impact.clone()).collect();
        let green_impact = green.total_impact(&impacts);

        let mean = |metric: fn(&ScoredResponse) -> u8| -> f64 {
            if successful.is_empty() {
                return 0.0;
            }
            let total: u32 = successful.iter().map(|s| u32::from(metric(s))).sum();
            f64::from(total) / successful.len() as f64
        };
        let average_similarity = mean(|s| s.similarity.unwrap_or(0));

        // Strict comparisons: ties keep the first response encountered.
        let mut best: Option<&ScoredResponse> = None;
        let mut worst: Option<&ScoredResponse> = None;
        for response in &successful {
            let composite = response.composite.unwrap_or(0);
            if best.map_or(true, |b| composite > b.composite.unwrap_or(0)) {
                best = Some(*response);
            }
            if worst.map_or(true, |w| composite < w.composite.unwrap_or(0)) {
                worst = Some(*response);
            }
        }

        Self {
            total_responses: scored.len(),
            successful_responses: successful.len(),
            failed_responses: count_status(ResultStatus::Failed),
            timed_out_responses: count_status(ResultStatus::Timeout),
            average_relevance: mean(|s| s.relevance.unwrap_or(0)).round() as u8,
            average_similarity: average_similarity.round() as u8,
            average_sovereignty: mean(|s| s.sovereignty.as_ref().map_or(0, |v| v.total)).round()
                as u8,
            average_composite: mean(|s| s.composite.unwrap_or(0)).round() as u8,
            average_response_time,
            best_response: best.map(ResponseHighlight::from_scored),
            worst_response: worst.map(ResponseHighlight::from_scored),
            consensus_level: round_to(average_similarity, 2),
            sovereignty_distribution,
            green_impact,
        }
    }
}
