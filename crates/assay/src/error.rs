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

use thiserror::Error;

/// Internal failure of a single metric. Never leaves the scoring engine: each
/// variant is replaced by that metric's neutral default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("Response text is blank")]
    BlankResponse,

    #[error("Response text has no comparable tokens")]
    NoComparableTokens,

    #[error("No latency data in batch")]
    NoLatencyData,
}

pub type ScoringResult<T> = Result<T, ScoringError>;
