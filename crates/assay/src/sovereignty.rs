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

//! Jurisdiction and licensing risk for a provider, scored out of 100:
//! hosting location (50), company nationality (30) and licence (20).

use crate::round_to;
use llm_contracts::{Jurisdiction, LicenseType, SovereigntyMeta};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const HOSTING_MAX: u8 = 50;
pub const COMPANY_MAX: u8 = 30;
pub const LICENSE_MAX: u8 = 20;
pub const CLOUD_ACT_THRESHOLD: u8 = 50;
const SIGNIFICANT_DIFFERENCE: i16 = 20;

fn hosting_points(location: Jurisdiction) -> u8 {
    match location {
        Jurisdiction::France => 50,
        Jurisdiction::Eu => 40,
        Jurisdiction::Usa => 20,
        Jurisdiction::China => 10,
        Jurisdiction::Other => 15,
    }
}

fn company_points(nationality: Jurisdiction) -> u8 {
    match nationality {
        Jurisdiction::France => 30,
        Jurisdiction::Eu => 25,
        Jurisdiction::Usa => 15,
        Jurisdiction::China => 5,
        Jurisdiction::Other => 10,
    }
}

fn license_points(license: LicenseType) -> u8 {
    match license {
        LicenseType::OpenSource => 20,
        LicenseType::OpenWeights => 15,
        LicenseType::Proprietary => 5,
        LicenseType::Unknown => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub score: u8,
    pub max_score: u8,
    pub percentage: f64,
    pub label: String,
}

impl ComponentScore {
    fn new(score: u8, max_score: u8, label: impl Into<String>) -> Self {
        Self {
            score,
            max_score,
            percentage: round_to(f64::from(score) / f64::from(max_score) * 100.0, 1),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SovereigntyBreakdown {
    pub hosting: ComponentScore,
    pub company: ComponentScore,
    pub license: ComponentScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RgpdCompliance {
    #[serde(rename = "Full Compliance")]
    Full,
    #[serde(rename = "Partial Compliance (Non-EU)")]
    PartialNonEu,
    #[serde(rename = "EU Location but Non-Compliant")]
    EuNonCompliant,
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgpdStatus {
    pub compliant: bool,
    pub location: String,
    pub status: RgpdCompliance,
    pub risk: RiskLevel,
}

impl RgpdStatus {
    fn evaluate(compliant: bool, jurisdiction: Jurisdiction, location: &str) -> Self {
        let status = match (compliant, jurisdiction.is_eu()) {
            (true, true) => RgpdCompliance::Full,
            (true, false) => RgpdCompliance::PartialNonEu,
            (false, true) => RgpdCompliance::EuNonCompliant,
            (false, false) => RgpdCompliance::NonCompliant,
        };
        Self {
            compliant,
            location: location.to_string(),
            status,
            risk: if compliant { RiskLevel::Low } else { RiskLevel::High },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SovereigntyLevel {
    Excellent,
    Good,
    Medium,
    Low,
    Critical,
}

impl SovereigntyLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => SovereigntyLevel::Excellent,
            60..=79 => SovereigntyLevel::Good,
            40..=59 => SovereigntyLevel::Medium,
            20..=39 => SovereigntyLevel::Low,
            _ => SovereigntyLevel::Critical,
        }
    }
}

impl fmt::Display for SovereigntyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationKind {
    Security,
    Compliance,
    Sovereignty,
    Transparency,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub message: String,
    pub action: String,
}

impl Recommendation {
    fn new(
        kind: RecommendationKind,
        priority: Priority,
        message: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            priority,
            message: message.into(),
            action: action.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SovereigntyScore {
    pub total: u8,
    pub breakdown: SovereigntyBreakdown,
    pub rgpd: RgpdStatus,
    pub cloud_act_risk: bool,
    pub level: SovereigntyLevel,
    pub recommendations: Vec<Recommendation>,
    pub metadata: SovereigntyMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonWinner {
    First,
    Second,
    Equal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SovereigntyComparison {
    pub score_difference: i16,
    pub winner: ComparisonWinner,
    pub hosting_diff: i16,
    pub company_diff: i16,
    pub license_diff: i16,
    pub significant: bool,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LevelDistribution {
    pub excellent: usize,
    pub good: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SovereigntyAverage {
    pub average_score: f64,
    pub cloud_act_risk_percentage: f64,
    pub rgpd_compliance_percentage: f64,
    pub model_count: usize,
    pub distribution: LevelDistribution,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SovereigntyScorer;

impl SovereigntyScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate_sovereignty(&self, meta: &SovereigntyMeta) -> SovereigntyScore {
        let hosting = hosting_points(meta.hosting_country);
        let company = company_points(meta.company_nationality);
        let license = license_points(meta.license_type);
        let total = hosting + company + license;
        let cloud_act_risk = total < CLOUD_ACT_THRESHOLD;

        SovereigntyScore {
            total,
            breakdown: SovereigntyBreakdown {
                hosting: ComponentScore::new(hosting, HOSTING_MAX, meta.hosting_location()),
                company: ComponentScore::new(
                    company,
                    COMPANY_MAX,
                    meta.company_location(),
                ),
                license: ComponentScore::new(license, LICENSE_MAX, meta.license_type.as_str()),
            },
            rgpd: RgpdStatus::evaluate(
                meta.rgpd_compliant,
                meta.hosting_country,
                meta.hosting_location(),
            ),
            cloud_act_risk,
            level: SovereigntyLevel::from_score(total),
            recommendations: recommendations(meta, total, cloud_act_risk),
            metadata: meta.clone(),
        }
    }

    pub fn compare_sovereignty(
        &self,
        first: &SovereigntyScore,
        second: &SovereigntyScore,
    ) -> SovereigntyComparison {
        let diff = |a: u8, b: u8| i16::from(a) - i16::from(b);
        let score_difference = diff(first.total, second.total);
        let magnitude = score_difference.abs();
        let significant = magnitude > SIGNIFICANT_DIFFERENCE;

        SovereigntyComparison {
            score_difference,
            winner: match score_difference {
                d if d > 0 => ComparisonWinner::First,
                d if d < 0 => ComparisonWinner::Second,
                _ => ComparisonWinner::Equal,
            },
            hosting_diff: diff(first.breakdown.hosting.score, second.breakdown.hosting.score),
            company_diff: diff(first.breakdown.company.score, second.breakdown.company.score),
            license_diff: diff(first.breakdown.license.score, second.breakdown.license.score),
            significant,
            recommendation: if significant {
                format!(
                    "Significant difference ({magnitude} pts). Prefer the higher-scored model for sensitive data."
                )
            } else {
                format!(
                    "Minor difference ({magnitude} pts). Both models have similar sovereignty levels."
                )
            },
        }
    }

    /// `None` for an empty slice.
    pub fn average_sovereignty(&self, scores: &[SovereigntyScore]) -> Option<SovereigntyAverage> {
        if scores.is_empty() {
            return None;
        }
        let count = scores.len() as f64;
        let total: u32 = scores.iter().map(|s| u32::from(s.total)).sum();
        let at_risk = scores.iter().filter(|s| s.cloud_act_risk).count();
        let compliant = scores.iter().filter(|s| s.rgpd.compliant).count();

        let mut distribution = LevelDistribution::default();
        for score in scores {
            match score.total {
                80.. => distribution.excellent += 1,
                60..=79 => distribution.good += 1,
                40..=59 => distribution.medium += 1,
                _ => distribution.low += 1,
            }
        }

        Some(SovereigntyAverage {
            average_score: round_to(f64::from(total) / count, 2),
            cloud_act_risk_percentage: round_to(at_risk as f64 / count * 100.0, 1),
            rgpd_compliance_percentage: round_to(compliant as f64 / count * 100.0, 1),
            model_count: scores.len(),
            distribution,
        })
    }
}

fn recommendations(meta: &SovereigntyMeta, total: u8, cloud_act_risk: bool) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if cloud_act_risk {
        recommendations.push(Recommendation::new(
            RecommendationKind::Security,
            Priority::High,
            "Cloud Act Risk detected. Consider using EU-based alternatives for sensitive data.",
            "Switch to Mistral (France) or EU-based models",
        ));
    }

    if !meta.rgpd_compliant {
        recommendations.push(Recommendation::new(
            RecommendationKind::Compliance,
            Priority::High,
            "Model is not RGPD compliant. Avoid processing personal data.",
            "Use only for non-personal data or switch to compliant model",
        ));
    }

    if matches!(meta.hosting_country, Jurisdiction::Usa | Jurisdiction::China) {
        recommendations.push(Recommendation::new(
            RecommendationKind::Sovereignty,
            Priority::Medium,
            format!(
                "Servers located in {}. Data may be subject to foreign jurisdiction.",
                meta.hosting_location()
            ),
            "Prefer EU/France-based models for data sovereignty",
        ));
    }

    if meta.license_type == LicenseType::Proprietary {
        recommendations.push(Recommendation::new(
            RecommendationKind::Transparency,
            Priority::Low,
            "Proprietary model with limited transparency.",
            "Consider Open Source alternatives for auditability",
        ));
    }

    if total >= 80 {
        recommendations.push(Recommendation::new(
            RecommendationKind::Success,
            Priority::Info,
            "Excellent sovereignty score. Model respects data sovereignty principles.",
            "No action required",
        ));
    }

    recommendations
}
