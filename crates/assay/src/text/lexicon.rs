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

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "is",
        "was", "are", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
        "will", "would", "should", "could", "may", "might", "must", "can", "this", "that",
        "these", "those", "i", "you", "he", "she", "it", "we", "they", "what", "which", "who",
        "when", "where", "why", "how",
    ]
    .into_iter()
    .collect()
});

// AFINN-111 subset, valences in -5..=5.
pub static SENTIMENT_VALENCE: Lazy<HashMap<&'static str, i8>> = Lazy::new(|| {
    [
        ("abandon", -2), ("abuse", -3), ("accept", 1), ("accepted", 1), ("accomplish", 2),
        ("accurate", 1), ("achieve", 2), ("achievement", 2), ("admire", 3), ("advantage", 2),
        ("advantages", 2), ("afraid", -2), ("agree", 1), ("alarming", -2), ("amazing", 4),
        ("angry", -3), ("annoying", -2), ("anxious", -2), ("appreciate", 2), ("awesome", 4),
        ("awful", -3), ("bad", -3), ("beautiful", 3), ("benefit", 2), ("benefits", 2),
        ("best", 3), ("better", 2), ("blame", -2), ("boring", -3), ("breakthrough", 3),
        ("brilliant", 4), ("broken", -1), ("calm", 2), ("care", 2), ("catastrophic", -4),
        ("clean", 2), ("clear", 1), ("comfortable", 2), ("confident", 2), ("confused", -2),
        ("crash", -2), ("creative", 2), ("crisis", -3), ("critical", -2), ("damage", -3),
        ("danger", -2), ("dangerous", -2), ("dead", -3), ("death", -2), ("delight", 3),
        ("difficult", -1), ("disappointed", -2), ("disaster", -2), ("easy", 1),
        ("effective", 2), ("efficient", 2), ("encourage", 2), ("enjoy", 2), ("error", -2),
        ("errors", -2), ("excellent", 3), ("excited", 3), ("fail", -2), ("failed", -2),
        ("failure", -2), ("fair", 2), ("fake", -3), ("fantastic", 4), ("fear", -2),
        ("fine", 2), ("free", 1), ("friendly", 2), ("fun", 4), ("good", 3), ("great", 3),
        ("happy", 3), ("harm", -2), ("hate", -3), ("help", 2), ("helpful", 2), ("hope", 2),
        ("horrible", -3), ("hurt", -2), ("ideal", 2), ("important", 2), ("impressive", 3),
        ("improve", 2), ("improved", 2), ("improvement", 2), ("innovative", 2),
        ("interesting", 2), ("joy", 3), ("kind", 2), ("lack", -2), ("like", 2), ("loss", -3),
        ("love", 3), ("nice", 3), ("outstanding", 5), ("pain", -2), ("perfect", 3),
        ("pleasant", 3), ("poor", -2), ("positive", 2), ("powerful", 2), ("problem", -2),
        ("problems", -2), ("progress", 2), ("protect", 1), ("reliable", 2), ("risk", -2),
        ("risks", -2), ("robust", 2), ("sad", -2), ("safe", 1), ("secure", 2),
        ("significant", 1), ("simple", 1), ("smart", 1), ("solid", 2), ("sorry", -1),
        ("strong", 2), ("stuck", -2), ("stupid", -2), ("success", 2), ("successful", 3),
        ("suffer", -2), ("super", 3), ("support", 2), ("terrible", -3), ("threat", -2),
        ("trust", 1), ("ugly", -3), ("unfortunately", -2), ("useful", 2), ("useless", -2),
        ("valuable", 2), ("vulnerable", -2), ("warning", -3), ("weak", -2), ("win", 4),
        ("wonderful", 4), ("worry", -3), ("worse", -3), ("worst", -3), ("wrong", -2),
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

pub fn valence(word: &str) -> i8 {
    SENTIMENT_VALENCE.get(word).copied().unwrap_or(0)
}
