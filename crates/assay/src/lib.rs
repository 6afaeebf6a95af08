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

pub mod error;
pub mod green;
pub mod scoring;
pub mod sovereignty;
pub mod summary;
pub mod text;

pub use error::{ScoringError, ScoringResult};
pub use green::{EcoGrade, GreenEstimator, GreenImpact, HourSource, TotalImpact};
pub use scoring::{AnalysisReport, ScoredResponse, ScoringEngine, SimilarityMatrix};
pub use sovereignty::{SovereigntyLevel, SovereigntyScore, SovereigntyScorer};
pub use summary::ComparativeSummary;
pub use text::{Sentiment, TextAnalysis, TextAnalyzer};

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
