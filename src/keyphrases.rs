use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const DEMO_MAX_KEYPHRASES: usize = 5;
pub const UNLOCKED_MAX_KEYPHRASES: usize = 50;
pub const MAX_LABELS: usize = 3;
pub const MIN_LABELS: usize = 2;

pub const DEFAULT_LABELS: [&str; 2] = ["Transactional", "Informational"];
pub const LABEL_SUGGESTIONS: [&str; 6] = [
    "Navigational",
    "Transactional",
    "Informational",
    "Positive",
    "Negative",
    "Neutral",
];
pub const SAMPLE_KEYPHRASES: [&str; 5] = [
    "I want to buy something in this store",
    "How to ask a question about a product",
    "Request a refund through the Google Play store",
    "I have a broken screen, what should I do?",
    "Can I have the link to the product?",
];

/// Credential path used for a submission.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Shared credential with a small quota.
    #[default]
    Demo,
    /// The user's own credential.
    Unlocked,
}

impl Mode {
    pub fn max_keyphrases(&self) -> usize {
        match self {
            Mode::Demo => DEMO_MAX_KEYPHRASES,
            Mode::Unlocked => UNLOCKED_MAX_KEYPHRASES,
        }
    }

    pub fn query_value(&self) -> &'static str {
        match self {
            Mode::Demo => "demo",
            Mode::Unlocked => "unlocked",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Demo => write!(f, "Demo"),
            Mode::Unlocked => write!(f, "Unlocked Mode"),
        }
    }
}

/// Keyphrases extracted from the text box, already capped for the mode.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct KeyphraseBatch {
    pub phrases: Vec<String>,
    /// Distinct non-empty lines before the cap was applied.
    pub distinct_count: usize,
    pub limit: usize,
    pub mode: Mode,
}

impl KeyphraseBatch {
    pub fn truncated(&self) -> bool {
        self.distinct_count > self.limit
    }

    /// Informational notice shown when input lines were dropped by the cap.
    pub fn cap_notice(&self) -> Option<String> {
        if !self.truncated() {
            return None;
        }
        let tail = match self.mode {
            Mode::Demo => {
                "keyphrases will be reviewed. Unlock that limit by switching to 'Unlocked Mode'"
            }
            Mode::Unlocked => {
                "keyphrases will be reviewed. The limitation preserves performance for inference"
            }
        };
        Some(format!("Only the first {} {tail}", self.limit))
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

/// Splits newline-delimited text into unique, non-empty lines in first-seen
/// order, capped at the mode maximum. Lines are compared exactly.
pub fn collate_keyphrases(text: &str, mode: Mode) -> KeyphraseBatch {
    let mut seen = HashSet::new();
    let distinct: Vec<String> = text
        .split('\n')
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect();
    let distinct_count = distinct.len();
    let limit = mode.max_keyphrases();
    let phrases = distinct.into_iter().take(limit).collect();
    KeyphraseBatch {
        phrases,
        distinct_count,
        limit,
        mode,
    }
}

/// Parses the comma-separated tag editor value. Blank tags are dropped,
/// duplicates collapse and tags past the editor maximum are ignored.
pub fn parse_labels(raw: &str) -> Vec<String> {
    normalize_labels(raw.split(','))
}

/// Applies the tag editor rules to already separated tags.
pub fn normalize_labels<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(MAX_LABELS);
    for tag in tags.into_iter().map(str::trim).filter(|tag| !tag.is_empty()) {
        if labels.len() >= MAX_LABELS {
            break;
        }
        if !labels.iter().any(|existing| existing == tag) {
            labels.push(tag.to_string());
        }
    }
    labels
}

pub fn default_keyphrase_text() -> String {
    SAMPLE_KEYPHRASES.join("\n")
}

pub fn default_label_text() -> String {
    DEFAULT_LABELS.join(", ")
}
