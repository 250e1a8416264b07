//! Headline sentiment.
//!
//! Each headline is scored with a small market lexicon, squashed to [-1, 1],
//! and averaged with weights inversely proportional to its age in hours.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Words that move a headline's score, with their weight.
const LEXICON: &[(&str, i32)] = &[
    ("surge", 3),
    ("surges", 3),
    ("soar", 3),
    ("soars", 3),
    ("rally", 3),
    ("rallies", 3),
    ("bullish", 3),
    ("record", 2),
    ("breakout", 2),
    ("gain", 2),
    ("gains", 2),
    ("approval", 2),
    ("approved", 2),
    ("adoption", 2),
    ("inflows", 2),
    ("rebound", 2),
    ("recovers", 2),
    ("optimism", 2),
    ("rise", 1),
    ("rises", 1),
    ("higher", 1),
    ("upgrade", 1),
    ("crash", -3),
    ("crashes", -3),
    ("plunge", -3),
    ("plunges", -3),
    ("bearish", -3),
    ("hack", -3),
    ("hacked", -3),
    ("fraud", -3),
    ("selloff", -3),
    ("collapse", -3),
    ("ban", -2),
    ("bans", -2),
    ("lawsuit", -2),
    ("outflows", -2),
    ("liquidations", -2),
    ("fear", -2),
    ("drop", -2),
    ("drops", -2),
    ("decline", -2),
    ("slump", -2),
    ("fall", -1),
    ("falls", -1),
    ("lower", -1),
    ("warning", -1),
];

/// One headline as returned by the news service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
}

/// Sentiment of a single text in [-1, 1]: `tanh(lexicon score / 5)`.
#[must_use]
pub fn score_text(text: &str) -> f64 {
    let raw: i32 = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let word = word.to_lowercase();
            LEXICON
                .iter()
                .find(|(entry, _)| *entry == word)
                .map_or(0, |(_, weight)| *weight)
        })
        .sum();
    (f64::from(raw) / 5.0).tanh()
}

/// Aggregate sentiment of recent headlines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewsDigest {
    /// Recency-weighted sentiment, -1 bearish to +1 bullish.
    pub score: Decimal,
    /// How much fresh coverage there is, 0 to 1.
    pub impact: Decimal,
    pub titles: Vec<String>,
}

impl NewsDigest {
    /// Scores `headlines` as of `now`. Each weighs `1 / age_hours`; impact
    /// saturates once the weights sum to 3.
    #[must_use]
    pub fn from_headlines(headlines: &[Headline], now: DateTime<Utc>) -> Self {
        if headlines.is_empty() {
            return Self::default();
        }

        let mut sum = 0.0;
        let mut weights = 0.0;
        for headline in headlines {
            let age_hours = (now - headline.published_at).num_seconds() as f64 / 3600.0;
            let weight = 1.0 / age_hours.max(0.001);
            sum += score_text(&format!("{} {}", headline.title, headline.description)) * weight;
            weights += weight;
        }

        let to_decimal = |value: f64| {
            Decimal::try_from(value)
                .unwrap_or(Decimal::ZERO)
                .round_dp(3)
        };
        Self {
            score: to_decimal((sum / weights).clamp(-1.0, 1.0)),
            impact: to_decimal((weights / 3.0).min(1.0)),
            titles: headlines.iter().map(|h| h.title.clone()).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Text block appended to the decision request.
    #[must_use]
    pub fn render(&self) -> String {
        if self.is_empty() {
            return "News: no recent headlines.".to_string();
        }
        let mut text = format!(
            "News sentiment over {} headlines: {} (-1 bearish to +1 bullish), impact {}\n",
            self.titles.len(),
            self.score.normalize(),
            self.impact.normalize()
        );
        for title in &self.titles {
            text.push_str(&format!("- {title}\n"));
        }
        text
    }
}
