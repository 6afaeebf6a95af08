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

use crate::round_to;
use chrono::{DateTime, Local, Timelike, Utc};
use llm_contracts::{Jurisdiction, TokenUsage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// kWh per 1000 tokens when a provider has no registry profile.
pub const DEFAULT_ENERGY_PER_K_TOKEN_KWH: f64 = 0.005;
pub const PEAK_TIME_FACTOR: f64 = 1.2;
pub const NORMAL_TIME_FACTOR: f64 = 1.0;
const PEAK_HOURS: std::ops::Range<u32> = 18..22;

const CAR_GRAMS_PER_KM: f64 = 120.0;
const PHONE_CHARGE_GRAMS: f64 = 8.22;
const STREAMING_GRAMS_PER_MINUTE: f64 = 2.4;
const TREE_GRAMS_PER_YEAR: f64 = 21_000.0;

/// Grid carbon intensity in gCO2 per kWh.
pub fn carbon_intensity(location: Jurisdiction) -> f64 {
    match location {
        Jurisdiction::France => 50.0,
        Jurisdiction::Eu => 250.0,
        Jurisdiction::Usa => 380.0,
        Jurisdiction::China | Jurisdiction::Other => 500.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcoGrade {
    A,
    B,
    C,
    D,
    E,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl EcoGrade {
    pub fn from_grams_per_token(grams_per_token: f64) -> Self {
        match grams_per_token {
            g if g <= 0.0001 => EcoGrade::A,
            g if g <= 0.0005 => EcoGrade::B,
            g if g <= 0.001 => EcoGrade::C,
            g if g <= 0.002 => EcoGrade::D,
            _ => EcoGrade::E,
        }
    }
}

impl fmt::Display for EcoGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EcoGrade::A => "A",
            EcoGrade::B => "B",
            EcoGrade::C => "C",
            EcoGrade::D => "D",
            EcoGrade::E => "E",
            EcoGrade::NotApplicable => "N/A",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Equivalences {
    pub car_km: f64,
    pub phone_charges: f64,
    pub streaming_minutes: f64,
    pub trees_per_year: f64,
}

impl Equivalences {
    fn from_grams(grams: f64) -> Self {
        Self {
            car_km: round_to(grams / CAR_GRAMS_PER_KM, 4),
            phone_charges: round_to(grams / PHONE_CHARGE_GRAMS, 4),
            streaming_minutes: round_to(grams / STREAMING_GRAMS_PER_MINUTE, 2),
            trees_per_year: round_to(grams / TREE_GRAMS_PER_YEAR, 6),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenImpact {
    pub tokens: TokenUsage,
    pub energy_kwh: f64,
    pub energy_per_k_token: f64,
    pub time_factor: f64,
    pub carbon_grams: f64,
    pub carbon_intensity: f64,
    pub location: String,
    pub eco_grade: EcoGrade,
    pub equivalences: Equivalences,
    pub computed_at: DateTime<Utc>,
}

impl GreenImpact {
    /// All-zero record used for zero-token and non-successful responses.
    pub fn empty() -> Self {
        Self {
            tokens: TokenUsage::default(),
            energy_kwh: 0.0,
            energy_per_k_token: 0.0,
            time_factor: NORMAL_TIME_FACTOR,
            carbon_grams: 0.0,
            carbon_intensity: 0.0,
            location: "Unknown".to_string(),
            eco_grade: EcoGrade::NotApplicable,
            equivalences: Equivalences::default(),
            computed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactComparison {
    pub energy_saved_kwh: f64,
    pub co2_saved_grams: f64,
    pub percentage_saved: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TotalImpact {
    pub total_co2_grams: f64,
    pub total_energy_kwh: f64,
    pub total_tokens: u64,
    pub average_co2_per_token: f64,
    pub models_count: usize,
}

/// Where the estimator reads the hour of day for the peak-time factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HourSource {
    #[default]
    Local,
    Fixed(u32),
}

impl HourSource {
    fn hour(&self) -> u32 {
        match self {
            HourSource::Local => Local::now().hour(),
            HourSource::Fixed(hour) => *hour,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GreenEstimator {
    hours: HourSource,
}

impl GreenEstimator {
    pub fn new(hours: HourSource) -> Self {
        Self { hours }
    }

    pub fn time_factor(&self) -> f64 {
        if PEAK_HOURS.contains(&self.hours.hour()) {
            PEAK_TIME_FACTOR
        } else {
            NORMAL_TIME_FACTOR
        }
    }

    /// `energy_per_k_token` and `location` come from the provider's registry
    /// profile; missing values fall back to the default coefficient and the
    /// `Other` grid.
    pub fn calculate_impact(
        &self,
        tokens: &TokenUsage,
        energy_per_k_token: Option<f64>,
        location: Option<Jurisdiction>,
    ) -> GreenImpact {
        if tokens.total == 0 {
            return GreenImpact::empty();
        }

        let energy_per_k_token = energy_per_k_token.unwrap_or(DEFAULT_ENERGY_PER_K_TOKEN_KWH);
        let location = location.unwrap_or(Jurisdiction::Other);
        let intensity = carbon_intensity(location);
        let time_factor = self.time_factor();

        let energy_kwh = f64::from(tokens.total) / 1000.0 * energy_per_k_token;
        let carbon_grams = energy_kwh * intensity * time_factor;

        GreenImpact {
            tokens: *tokens,
            energy_kwh: round_to(energy_kwh, 6),
            energy_per_k_token,
            time_factor,
            carbon_grams: round_to(carbon_grams, 4),
            carbon_intensity: intensity,
            location: location.to_string(),
            eco_grade: EcoGrade::from_grams_per_token(carbon_grams / f64::from(tokens.total)),
            equivalences: Equivalences::from_grams(carbon_grams),
            computed_at: Utc::now(),
        }
    }

    /// Savings from choosing `second` over `first`.
    pub fn compare_impacts(&self, first: &GreenImpact, second: &GreenImpact) -> ImpactComparison {
        let energy_saved = first.energy_kwh - second.energy_kwh;
        let co2_saved = first.carbon_grams - second.carbon_grams;
        let percentage_saved = if first.carbon_grams > 0.0 {
            round_to(co2_saved / first.carbon_grams * 100.0, 2)
        } else {
            0.0
        };

        ImpactComparison {
            energy_saved_kwh: round_to(energy_saved, 6),
            co2_saved_grams: round_to(co2_saved, 4),
            percentage_saved,
            recommendation: if co2_saved > 0.0 {
                format!("Use {}-based model for better eco-score", second.location)
            } else {
                "Current model is more eco-friendly".to_string()
            },
        }
    }

    pub fn total_impact(&self, impacts: &[GreenImpact]) -> TotalImpact {
        let total_co2: f64 = impacts.iter().map(|i| i.carbon_grams).sum();
        let total_energy: f64 = impacts.iter().map(|i| i.energy_kwh).sum();
        let total_tokens: u64 = impacts.iter().map(|i| u64::from(i.tokens.total)).sum();

        TotalImpact {
            total_co2_grams: round_to(total_co2, 4),
            total_energy_kwh: round_to(total_energy, 6),
            total_tokens,
            average_co2_per_token: if total_tokens > 0 {
                round_to(total_co2 / total_tokens as f64, 6)
            } else {
                0.0
            },
            models_count: impacts.len(),
        }
    }
}
