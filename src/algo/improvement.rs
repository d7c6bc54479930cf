use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Closed set of improvement areas recognized by the keyword classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImprovementCategory {
    WaitingTime,
    StaffAttitude,
    ServiceSpeed,
    AtmServices,
    DigitalBanking,
    BranchEnvironment,
    FeesAndCharges,
    Communication,
    ProcessEfficiency,
}

impl ImprovementCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::WaitingTime => "Waiting Time",
            Self::StaffAttitude => "Staff Attitude",
            Self::ServiceSpeed => "Service Speed",
            Self::AtmServices => "ATM Services",
            Self::DigitalBanking => "Digital Banking",
            Self::BranchEnvironment => "Branch Environment",
            Self::FeesAndCharges => "Fees and Charges",
            Self::Communication => "Communication",
            Self::ProcessEfficiency => "Process Efficiency",
        }
    }
}

use ImprovementCategory::*;

/// Keyword table, scanned in order; first substring hit wins.
pub const IMPROVEMENT_KEYWORDS: &[(&str, ImprovementCategory)] = &[
    ("wait time", WaitingTime),
    ("waiting time", WaitingTime),
    ("queue", WaitingTime),
    ("long wait", WaitingTime),
    ("waiting", WaitingTime),
    ("staff", StaffAttitude),
    ("attitude", StaffAttitude),
    ("customer service", StaffAttitude),
    ("service", StaffAttitude),
    ("friendly", StaffAttitude),
    ("speed", ServiceSpeed),
    ("slow", ServiceSpeed),
    ("fast", ServiceSpeed),
    ("quick", ServiceSpeed),
    ("atm", AtmServices),
    ("machine", AtmServices),
    ("cash machine", AtmServices),
    ("online", DigitalBanking),
    ("app", DigitalBanking),
    ("mobile", DigitalBanking),
    ("internet", DigitalBanking),
    ("website", DigitalBanking),
    ("branch", BranchEnvironment),
    ("environment", BranchEnvironment),
    ("clean", BranchEnvironment),
    ("comfort", BranchEnvironment),
    ("seating", BranchEnvironment),
    ("fee", FeesAndCharges),
    ("charge", FeesAndCharges),
    ("cost", FeesAndCharges),
    ("expensive", FeesAndCharges),
    ("information", Communication),
    ("communication", Communication),
    ("explain", Communication),
    ("clarity", Communication),
    ("process", ProcessEfficiency),
    ("procedure", ProcessEfficiency),
    ("paperwork", ProcessEfficiency),
    ("documentation", ProcessEfficiency),
    ("bureaucracy", ProcessEfficiency),
];

/// Words in a free-text reason that flag it as an improvement mention.
pub const IMPROVEMENT_HINTS: &[&str] = &[
    "improve", "better", "should", "could", "need", "wait", "slow", "long",
];

/// Separators for improvement fields in histograms.
pub const FRAGMENT_SEPARATORS: &[char] = &[',', ';'];

/// Separators for improvement fields in the recommendation matrix, which also
/// splits on sentence ends.
pub const MATRIX_SEPARATORS: &[char] = &[',', ';', '.'];

/// Outcome of classifying one improvement phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Improvement {
    Category(ImprovementCategory),
    /// No keyword matched; the original text with its first character
    /// capitalized.
    Other(String),
}

impl Improvement {
    pub fn label(&self) -> &str {
        match self {
            Improvement::Category(c) => c.label(),
            Improvement::Other(text) => text,
        }
    }
}

/// Classify an improvement phrase by keyword containment. Total: every input,
/// including the empty string, yields a value.
pub fn categorize_improvement(text: &str) -> Improvement {
    let lower = text.to_lowercase();
    IMPROVEMENT_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, category)| Improvement::Category(*category))
        .unwrap_or_else(|| Improvement::Other(capitalize_first(text)))
}

/// Split a multi-valued improvement field, trimming and dropping empties.
pub fn split_fragments<'a>(text: &'a str, separators: &'a [char]) -> impl Iterator<Item = &'a str> {
    text.split(separators)
        .map(str::trim)
        .filter(|f| !f.is_empty())
}

pub fn mentions_improvement(reason: &str) -> bool {
    let lower = reason.to_lowercase();
    IMPROVEMENT_HINTS.iter().any(|hint| lower.contains(hint))
}

fn capitalize_first(text: &str) -> String {
    let mut graphemes = text.graphemes(true);
    match graphemes.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), graphemes.as_str()),
        None => String::new(),
    }
}
