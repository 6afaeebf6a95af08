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

pub mod lexicon;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9_]+").unwrap());
static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());
static CAPITALISED_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][A-Za-z0-9]*(?:[ \t]+[A-Z][A-Za-z0-9]*)*").unwrap());

pub const DEFAULT_KEYWORD_LIMIT: usize = 10;
pub const MAX_TOPICS: usize = 10;
const TOPIC_KEYWORDS: usize = 5;
const SENTIMENT_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub count: usize,
    /// Share of the filtered token stream taken by this word.
    pub relevance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextAnalysis {
    pub keywords: Vec<Keyword>,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub topics: Vec<String>,
    pub word_count: usize,
    pub sentence_count: usize,
    pub readability: f64,
}

/// Lexical heuristics over English text. Stateless; every method is a pure
/// function of its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAnalyzer;

impl TextAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn tokenize<'a>(&self, text: &'a str) -> impl Iterator<Item = &'a str> {
        WORD_RE.find_iter(text).map(|m| m.as_str())
    }

    /// Blank input yields the zeroed analysis.
    pub fn analyze_text(&self, text: &str) -> TextAnalysis {
        if text.trim().is_empty() {
            return TextAnalysis::default();
        }
        let sentiment = self.analyze_sentiment(text);
        TextAnalysis {
            keywords: self.extract_keywords(text, DEFAULT_KEYWORD_LIMIT),
            sentiment: sentiment.sentiment,
            sentiment_score: sentiment.score,
            topics: self.extract_topics(text),
            word_count: self.count_words(text),
            sentence_count: self.count_sentences(text),
            readability: self.calculate_readability(text),
        }
    }

    pub fn count_words(&self, text: &str) -> usize {
        self.tokenize(text).count()
    }

    pub fn count_sentences(&self, text: &str) -> usize {
        SENTENCE_SPLIT_RE
            .split(text)
            .filter(|segment| !segment.trim().is_empty())
            .count()
    }

    pub fn extract_keywords(&self, text: &str, limit: usize) -> Vec<Keyword> {
        let lowered = text.to_lowercase();
        let filtered: Vec<&str> = self
            .tokenize(&lowered)
            .filter(|token| {
                token.len() > 3
                    && !lexicon::is_stop_word(token)
                    && token.bytes().all(|b| b.is_ascii_lowercase())
            })
            .collect();

        if filtered.is_empty() {
            return Vec::new();
        }

        let mut frequency: IndexMap<&str, usize> = IndexMap::new();
        for token in &filtered {
            *frequency.entry(*token).or_insert(0) += 1;
        }

        let total = filtered.len() as f64;
        let mut ranked: Vec<(&str, usize)> = frequency.into_iter().collect();
        // Stable: ties keep first-appearance order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        ranked
            .into_iter()
            .take(limit)
            .map(|(word, count)| Keyword {
                word: word.to_string(),
                count,
                relevance: count as f64 / total,
            })
            .collect()
    }

    pub fn analyze_sentiment(&self, text: &str) -> SentimentAnalysis {
        let lowered = text.to_lowercase();
        let mut tokens = 0usize;
        let mut valence_sum = 0i64;
        for token in self.tokenize(&lowered) {
            tokens += 1;
            valence_sum += i64::from(lexicon::valence(token));
        }
        if tokens == 0 {
            return SentimentAnalysis::default();
        }

        let raw = valence_sum as f64 / tokens as f64;
        let sentiment = if raw > SENTIMENT_THRESHOLD {
            Sentiment::Positive
        } else if raw < -SENTIMENT_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };

        SentimentAnalysis {
            sentiment,
            score: raw.clamp(-1.0, 1.0),
        }
    }

    /// Proper-noun phrases first, then the leading keywords. Unique
    /// (case-insensitive) and capped at [`MAX_TOPICS`].
    pub fn extract_topics(&self, text: &str) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut topics = Vec::new();
        let mut push = |topic: String, topics: &mut Vec<String>| {
            if topics.len() < MAX_TOPICS && seen.insert(topic.to_lowercase()) {
                topics.push(topic);
            }
        };

        for phrase in CAPITALISED_RUN_RE.find_iter(text) {
            let all_words: Vec<&str> = phrase.as_str().split_whitespace().collect();
            let sentence_initial = is_sentence_start(&text[..phrase.start()]);

            let leading_stop_words = all_words
                .iter()
                .take_while(|w| lexicon::is_stop_word(&w.to_lowercase()))
                .count();
            let words = &all_words[leading_stop_words..];

            let accepted = match words.len() {
                0 => false,
                1 => !sentence_initial || leading_stop_words > 0,
                _ => true,
            };
            if accepted {
                push(words.join(" "), &mut topics);
            }
        }

        for keyword in self.extract_keywords(text, TOPIC_KEYWORDS) {
            push(keyword.word, &mut topics);
        }

        topics
    }

    /// Simplified Flesch reading ease, clamped to `0..=100`.
    pub fn calculate_readability(&self, text: &str) -> f64 {
        let sentences = self.count_sentences(text);
        if sentences == 0 {
            return 0.0;
        }
        let words_per_sentence = self.count_words(text) as f64 / sentences as f64;
        (100.0 - 1.5 * words_per_sentence).clamp(0.0, 100.0)
    }

    /// Jaccard coefficient over unique lower-cased tokens, in `0.0..=1.0`.
    pub fn calculate_similarity(&self, a: &str, b: &str) -> f64 {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        let left: HashSet<&str> = self.tokenize(&a).collect();
        let right: HashSet<&str> = self.tokenize(&b).collect();

        let union = left.union(&right).count();
        if union == 0 {
            return 0.0;
        }
        left.intersection(&right).count() as f64 / union as f64
    }
}

fn is_sentence_start(preceding: &str) -> bool {
    match preceding.trim_end().chars().last() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?' | ':' | '\n'),
    }
}
