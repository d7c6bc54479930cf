//! Branch-level aggregation over normalized survey rows.
//!
//! Every function here is a pure function of its row slice: no state carries
//! between calls and a malformed field only removes that row's contribution
//! to the affected aggregate.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use super::columns::{field_value, CanonicalField};
use super::improvement::{
    categorize_improvement, mentions_improvement, split_fragments, FRAGMENT_SEPARATORS,
    MATRIX_SEPARATORS,
};
use super::rating::parse_rating;
use super::SurveyRow;

pub const UNCLASSIFIED: &str = "Unclassified";
pub const UNKNOWN_BRANCH: &str = "Unknown";
pub const NO_SPECIFIC_IMPROVEMENTS: &str = "No specific improvements";

/// Satisfaction assumed for a branch-improvement row with no valid ratings.
pub const NEUTRAL_SATISFACTION: f64 = 3.0;

const COMMENT_MAX: usize = 100;
const TOP_IMPROVEMENTS: usize = 3;
const MATRIX_PLACEHOLDER: usize = 1;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    /// Count a whole ReasonForScore text as one extra mention when it contains
    /// an improvement hint ("improve", "wait", "slow", ...).
    pub scan_reasons: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self { scan_reasons: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRanking {
    pub branch: String,
    /// Mean satisfaction over valid ratings, 0 when there are none.
    pub satisfaction: f64,
    pub response_count: usize,
    pub advocate_score: f64,
    pub comment: String,
    pub valid_satisfaction_count: usize,
    pub valid_advocate_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementTally {
    pub category: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchImprovement {
    pub branch: String,
    pub top_improvements: Vec<CategoryCount>,
    pub satisfaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonData {
    pub branch: String,
    pub reason: String,
    pub score: f64,
    pub date: String,
    pub need_callback: String,
}

/// One branch row of the recommendation matrix. Serializes flat:
/// `{"branch": ..., "<category>": count, ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    pub branch: String,
    pub counts: Vec<(String, usize)>,
}

impl MatrixRow {
    pub fn count(&self, category: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, n)| *n)
    }
}

impl Serialize for MatrixRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len() + 1))?;
        map.serialize_entry("branch", &self.branch)?;
        for (category, count) in &self.counts {
            map.serialize_entry(category, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationMatrix {
    pub categories: Vec<String>,
    pub rows: Vec<MatrixRow>,
    /// Placeholder values, not survey data.
    pub synthetic: bool,
}

/// Rows sharing one branch, in first-seen order.
#[derive(Debug, Clone)]
pub struct BranchGroup<'a> {
    pub branch: String,
    pub rows: Vec<&'a SurveyRow>,
}

// ── Field access ─────────────────────────────────────────────────────────────

/// Branch name of a row; empty or missing is `None`.
pub fn branch_name(row: &SurveyRow) -> Option<String> {
    let text = match field_value(row, CanonicalField::Branch)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Satisfaction rating, falling back to an AS value in [0, 5].
pub fn satisfaction_of(row: &SurveyRow) -> Option<f64> {
    field_value(row, CanonicalField::SatisfactionRating)
        .and_then(parse_rating)
        .or_else(|| advocate_of(row).filter(|v| (0.0..=5.0).contains(v)))
}

pub fn advocate_of(row: &SurveyRow) -> Option<f64> {
    field_value(row, CanonicalField::AdvocateScore).and_then(parse_rating)
}

fn text_of(row: &SurveyRow, field: CanonicalField) -> Option<&str> {
    field_value(row, field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

// ── Grouping ─────────────────────────────────────────────────────────────────

/// Partition rows by branch. Rows without a branch are dropped, or bucketed
/// under `unknown` when given.
pub fn group_rows<'a>(rows: &'a [SurveyRow], unknown: Option<&str>) -> Vec<BranchGroup<'a>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<BranchGroup<'a>> = Vec::new();
    for row in rows {
        let Some(branch) = branch_name(row).or_else(|| unknown.map(str::to_string)) else {
            continue;
        };
        let slot = *index.entry(branch.clone()).or_insert_with(|| {
            groups.push(BranchGroup {
                branch,
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].rows.push(row);
    }
    groups
}

pub fn group_by_branch(rows: &[SurveyRow]) -> Vec<BranchGroup<'_>> {
    group_rows(rows, None)
}

/// Rows that carry a non-empty branch.
pub fn filter_branch_rows(rows: &[SurveyRow]) -> Vec<SurveyRow> {
    rows.iter()
        .filter(|r| branch_name(r).is_some())
        .cloned()
        .collect()
}

// ── Rankings ─────────────────────────────────────────────────────────────────

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn truncate_comment(comment: &str) -> String {
    if comment.graphemes(true).count() <= COMMENT_MAX {
        return comment.to_string();
    }
    let head: String = comment.graphemes(true).take(COMMENT_MAX - 3).collect();
    format!("{head}...")
}

/// Reason of the highest-scoring response; ties keep the earliest row.
fn representative_comment(rows: &[&SurveyRow]) -> String {
    let mut best: Option<(&str, f64)> = None;
    for row in rows {
        let Some(reason) = text_of(row, CanonicalField::ReasonForScore) else {
            continue;
        };
        let score = field_value(row, CanonicalField::SatisfactionRating)
            .and_then(parse_rating)
            .or_else(|| advocate_of(row))
            .unwrap_or(0.0);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((reason, score));
        }
    }
    best.map(|(reason, _)| truncate_comment(reason))
        .unwrap_or_default()
}

/// Per-branch satisfaction and advocate averages, best branch first.
pub fn branch_rankings(rows: &[SurveyRow]) -> Vec<BranchRanking> {
    let mut rankings: Vec<BranchRanking> = group_by_branch(rows)
        .into_iter()
        .map(|group| {
            let satisfaction: Vec<f64> = group.rows.iter().filter_map(|r| satisfaction_of(r)).collect();
            let advocate: Vec<f64> = group.rows.iter().filter_map(|r| advocate_of(r)).collect();
            BranchRanking {
                comment: representative_comment(&group.rows),
                branch: group.branch,
                satisfaction: mean(&satisfaction).unwrap_or(0.0),
                response_count: group.rows.len(),
                advocate_score: mean(&advocate).unwrap_or(0.0),
                valid_satisfaction_count: satisfaction.len(),
                valid_advocate_count: advocate.len(),
            }
        })
        .collect();

    rankings.sort_by(|a, b| b.satisfaction.total_cmp(&a.satisfaction));
    rankings
}

// ── Improvements ─────────────────────────────────────────────────────────────

/// Raw improvement mentions of a set of rows: each fragment of the
/// improvement field, plus whole reasons that hint at an improvement.
pub fn improvement_mentions<'a, I>(rows: I, opts: AggregateOptions) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a SurveyRow>,
{
    let mut mentions = Vec::new();
    for row in rows {
        if let Some(text) = text_of(row, CanonicalField::ImprovementArea) {
            mentions.extend(split_fragments(text, FRAGMENT_SEPARATORS));
        }
        if opts.scan_reasons {
            if let Some(reason) = text_of(row, CanonicalField::ReasonForScore) {
                if mentions_improvement(reason) {
                    mentions.push(reason);
                }
            }
        }
    }
    mentions
}

/// Count mentions per category label, most frequent first (stable on ties).
fn tally(mentions: &[&str]) -> Vec<CategoryCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();
    for mention in mentions {
        let category = categorize_improvement(mention).label().to_string();
        match index.get(&category) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(category.clone(), counts.len());
                counts.push(CategoryCount { category, count: 1 });
            }
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Improvement-category histogram across all rows.
pub fn improvement_histogram(rows: &[SurveyRow], opts: AggregateOptions) -> Vec<ImprovementTally> {
    let mentions = improvement_mentions(rows, opts);
    let total = mentions.len();
    tracing::debug!(total, "improvement mentions");
    tally(&mentions)
        .into_iter()
        .map(|c| ImprovementTally {
            percentage: if total > 0 {
                c.count as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            category: c.category,
            count: c.count,
        })
        .collect()
}

/// Top three improvement categories per branch, best-rated branch first.
pub fn branch_improvements(rows: &[SurveyRow], opts: AggregateOptions) -> Vec<BranchImprovement> {
    let mut out: Vec<BranchImprovement> = group_by_branch(rows)
        .into_iter()
        .map(|group| {
            let mentions = improvement_mentions(group.rows.iter().copied(), opts);
            let mut top = tally(&mentions);
            top.truncate(TOP_IMPROVEMENTS);
            if top.is_empty() {
                top.push(CategoryCount {
                    category: NO_SPECIFIC_IMPROVEMENTS.into(),
                    count: 1,
                });
            }
            let ratings: Vec<f64> = group.rows.iter().filter_map(|r| satisfaction_of(r)).collect();
            BranchImprovement {
                branch: group.branch,
                top_improvements: top,
                satisfaction: mean(&ratings).unwrap_or(NEUTRAL_SATISFACTION),
            }
        })
        .collect();

    out.sort_by(|a, b| b.satisfaction.total_cmp(&a.satisfaction));
    out
}

// ── Reasons ──────────────────────────────────────────────────────────────────

fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.with_timezone(&Utc).format("%Y-%m-%d").to_string();
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return dt.format("%Y-%m-%d").to_string();
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.format("%Y-%m-%d").to_string();
        }
    }
    raw.to_string()
}

fn callback_flag(value: Option<&Value>) -> &'static str {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_lowercase(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return "No",
    };
    if matches!(text.as_str(), "yes" | "true" | "1" | "oui") {
        "Yes"
    } else {
        "No"
    }
}

/// One entry per row with a score reason. The score is the satisfaction
/// rating, or the AS value halved when it looks like a 0–10 score.
pub fn extract_reasons(rows: &[SurveyRow]) -> Vec<ReasonData> {
    rows.iter()
        .filter_map(|row| {
            let reason = text_of(row, CanonicalField::ReasonForScore)?;
            let score = match field_value(row, CanonicalField::SatisfactionRating) {
                Some(v) => parse_rating(v).unwrap_or(0.0),
                None => advocate_of(row)
                    .map(|v| if v > 5.0 { v / 2.0 } else { v })
                    .unwrap_or(0.0),
            };
            let date = match field_value(row, CanonicalField::Date) {
                Some(Value::String(s)) if !s.is_empty() => normalize_date(s),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            Some(ReasonData {
                branch: branch_name(row).unwrap_or_else(|| UNKNOWN_BRANCH.into()),
                reason: reason.to_string(),
                score,
                date,
                need_callback: callback_flag(field_value(row, CanonicalField::NeedCallback)).into(),
            })
        })
        .collect()
}

// ── Recommendation matrix ────────────────────────────────────────────────────

/// Match one improvement fragment against the caller's categories: exact,
/// then via the keyword classifier, then by any category word longer than
/// three characters.
pub fn match_category<'c>(value: &str, categories: &'c [String]) -> &'c str {
    let normalized = value.trim().to_lowercase();
    let candidates = || {
        categories
            .iter()
            .filter(|c| c.as_str() != UNCLASSIFIED)
            .map(|c| (c.as_str(), c.trim().to_lowercase()))
    };

    if let Some((cat, _)) = candidates().find(|(_, lower)| *lower == normalized) {
        return cat;
    }

    let classified = categorize_improvement(&normalized).label().to_lowercase();
    if let Some((cat, _)) = candidates().find(|(_, lower)| *lower == classified) {
        return cat;
    }

    if let Some((cat, _)) = candidates().find(|(_, lower)| {
        lower
            .split(' ')
            .filter(|w| w.chars().count() > 3)
            .any(|w| normalized.contains(w))
    }) {
        return cat;
    }

    tracing::warn!(value, classified, "unmapped matrix category");
    UNCLASSIFIED
}

/// Branch × category counts for a caller-supplied category list.
///
/// An "Unclassified" column is appended when missing. Rows without a branch
/// are bucketed under "Unknown". If rows exist but no fragment at all was
/// counted, a placeholder matrix is returned with `synthetic` set.
pub fn recommendation_matrix(rows: &[SurveyRow], categories: &[String]) -> RecommendationMatrix {
    let mut columns: Vec<String> = Vec::with_capacity(categories.len() + 1);
    for cat in categories {
        if !columns.contains(cat) {
            columns.push(cat.clone());
        }
    }
    if !columns.iter().any(|c| c == UNCLASSIFIED) {
        columns.push(UNCLASSIFIED.into());
    }

    let mut counted = 0usize;
    let matrix_rows: Vec<MatrixRow> = group_rows(rows, Some(UNKNOWN_BRANCH))
        .into_iter()
        .map(|group| {
            let mut counts: Vec<(String, usize)> = columns.iter().map(|c| (c.clone(), 0)).collect();
            for row in &group.rows {
                let Some(text) = text_of(row, CanonicalField::ImprovementArea) else {
                    continue;
                };
                for fragment in split_fragments(text, MATRIX_SEPARATORS) {
                    let category = match_category(fragment, &columns);
                    if let Some(slot) = counts.iter_mut().find(|(c, _)| c == category) {
                        slot.1 += 1;
                        counted += 1;
                    }
                }
            }
            MatrixRow {
                branch: group.branch,
                counts,
            }
        })
        .collect();

    if counted == 0 && !rows.is_empty() {
        tracing::warn!(
            branches = matrix_rows.len(),
            "no improvement data; returning synthetic placeholder matrix"
        );
        let placeholder = matrix_rows
            .into_iter()
            .map(|r| MatrixRow {
                branch: r.branch,
                counts: columns.iter().map(|c| (c.clone(), MATRIX_PLACEHOLDER)).collect(),
            })
            .collect();
        return RecommendationMatrix {
            categories: columns,
            rows: placeholder,
            synthetic: true,
        };
    }

    RecommendationMatrix {
        categories: columns,
        rows: matrix_rows,
        synthetic: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAT: &str = "How would you rate your overall satisfaction with your branch visit";
    const IMP: &str = "What needs to be improved based on your experience";

    fn rows(values: Vec<Value>) -> Vec<SurveyRow> {
        values
            .into_iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn ranking_averages_valid_ratings() {
        let data = rows(vec![
            json!({"Branch": "A", SAT: 5}),
            json!({"Branch": "A", SAT: 3}),
        ]);
        let r = branch_rankings(&data);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].branch, "A");
        assert_eq!(r[0].satisfaction, 4.0);
        assert_eq!(r[0].response_count, 2);
        assert_eq!(r[0].valid_satisfaction_count, 2);
    }

    #[test]
    fn branch_without_ratings_tracks_zero_valid() {
        let data = rows(vec![
            json!({"Branch": "Quiet", SAT: "n/a"}),
            json!({"Branch": "Zero", SAT: 0}),
        ]);
        let r = branch_rankings(&data);
        let quiet = r.iter().find(|b| b.branch == "Quiet").unwrap();
        let zero = r.iter().find(|b| b.branch == "Zero").unwrap();
        assert_eq!(quiet.satisfaction, 0.0);
        assert_eq!(quiet.valid_satisfaction_count, 0);
        assert_eq!(zero.satisfaction, 0.0);
        assert_eq!(zero.valid_satisfaction_count, 1);
    }

    #[test]
    fn rankings_sorted_descending_and_skip_missing_branch() {
        let data = rows(vec![
            json!({"Branch": "Low", SAT: 2}),
            json!({"Branch": "High", SAT: 5}),
            json!({"Branch": "", SAT: 5}),
            json!({SAT: 1}),
            json!({"Branch": "Mid", SAT: "good"}),
        ]);
        let r = branch_rankings(&data);
        let names: Vec<&str> = r.iter().map(|b| b.branch.as_str()).collect();
        assert_eq!(names, vec!["High", "Mid", "Low"]);
        for pair in r.windows(2) {
            assert!(pair[0].satisfaction >= pair[1].satisfaction);
        }
    }

    #[test]
    fn advocate_fills_in_for_missing_satisfaction() {
        let data = rows(vec![
            json!({"Branch": "A", "AS": 4}),
            json!({"Branch": "A", "AS": 9}),
        ]);
        let r = branch_rankings(&data);
        assert_eq!(r[0].satisfaction, 4.0);
        assert_eq!(r[0].valid_satisfaction_count, 1);
        assert_eq!(r[0].advocate_score, 6.5);
    }

    #[test]
    fn comment_is_highest_scoring_reason_truncated() {
        let long = "x".repeat(150);
        let data = rows(vec![
            json!({"Branch": "A", SAT: 3, "Reasons Of Score": "fine"}),
            json!({"Branch": "A", SAT: 5, "Reasons Of Score": long}),
            json!({"Branch": "A", SAT: 5, "Reasons Of Score": "later tie"}),
        ]);
        let r = branch_rankings(&data);
        assert_eq!(r[0].comment.chars().count(), 100);
        assert!(r[0].comment.ends_with("..."));
        assert!(r[0].comment.starts_with("xxx"));
    }

    #[test]
    fn histogram_counts_fragments_and_reason_hints() {
        let data = rows(vec![
            json!({"Branch": "A", IMP: "queue, ATM; fees"}),
            json!({"Branch": "B", IMP: "long queue", "Reasons Of Score": "Too slow"}),
            json!({"Branch": "B", "Reasons Of Score": "Lovely"}),
        ]);
        let h = improvement_histogram(&data, AggregateOptions::default());
        assert_eq!(h[0].category, "Waiting Time");
        assert_eq!(h[0].count, 2);
        assert_eq!(h[0].percentage, 40.0);
        let total: usize = h.iter().map(|t| t.count).sum();
        assert_eq!(total, 5);

        let no_reasons = improvement_histogram(&data, AggregateOptions { scan_reasons: false });
        let total: usize = no_reasons.iter().map(|t| t.count).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn branch_improvements_top_three_with_placeholder() {
        let data = rows(vec![
            json!({"Branch": "A", SAT: 2, IMP: "queue, queue, fees, app, clean"}),
            json!({"Branch": "B", SAT: 5, "Reasons Of Score": "great"}),
            json!({"Branch": "C"}),
        ]);
        let b = branch_improvements(&data, AggregateOptions::default());
        assert_eq!(b[0].branch, "B");
        assert_eq!(
            b[0].top_improvements,
            vec![CategoryCount {
                category: NO_SPECIFIC_IMPROVEMENTS.into(),
                count: 1
            }]
        );
        let c = b.iter().find(|x| x.branch == "C").unwrap();
        assert_eq!(c.satisfaction, NEUTRAL_SATISFACTION);
        let a = b.iter().find(|x| x.branch == "A").unwrap();
        assert_eq!(a.top_improvements.len(), 3);
        assert_eq!(a.top_improvements[0].category, "Waiting Time");
        assert_eq!(a.top_improvements[0].count, 2);
    }

    #[test]
    fn reasons_score_date_and_callback() {
        let data = rows(vec![
            json!({"Branch": "A", "AS": 8, "Reasons Of Score": "ok", "Date": "2024-03-05T10:00:00Z", "Need Callback": "Oui"}),
            json!({"Branch": "A", SAT: "bad", "Reasons Of Score": "meh", "Date": "not a date"}),
            json!({"Branch": "A", SAT: 4}),
        ]);
        let r = extract_reasons(&data);
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].score, 4.0);
        assert_eq!(r[0].date, "2024-03-05");
        assert_eq!(r[0].need_callback, "Yes");
        assert_eq!(r[1].score, 0.0);
        assert_eq!(r[1].date, "not a date");
        assert_eq!(r[1].need_callback, "No");
    }

    #[test]
    fn matrix_matching_strategies() {
        let cats = vec![
            "Waiting Time".to_string(),
            "The ambience of the branch".to_string(),
            "Fees".to_string(),
        ];
        assert_eq!(match_category("fees", &cats), "Fees");
        assert_eq!(match_category("the queue", &cats), "Waiting Time");
        assert_eq!(match_category("nicer ambience", &cats), "The ambience of the branch");
        assert_eq!(match_category("parking", &cats), UNCLASSIFIED);
    }

    #[test]
    fn matrix_counts_per_branch() {
        let cats = vec!["Waiting Time".to_string()];
        let data = rows(vec![
            json!({"Branch": "A", IMP: "queue. parking"}),
            json!({IMP: "waiting"}),
        ]);
        let m = recommendation_matrix(&data, &cats);
        assert!(!m.synthetic);
        assert_eq!(m.categories, vec!["Waiting Time", UNCLASSIFIED]);
        assert_eq!(m.rows[0].count("Waiting Time"), Some(1));
        assert_eq!(m.rows[0].count(UNCLASSIFIED), Some(1));
        assert_eq!(m.rows[1].branch, UNKNOWN_BRANCH);

        let flat = serde_json::to_value(&m.rows[0]).unwrap();
        assert_eq!(flat, json!({"branch": "A", "Waiting Time": 1, "Unclassified": 1}));
    }

    #[test]
    fn matrix_without_improvements_is_flagged_synthetic() {
        let cats = vec!["Waiting Time".to_string()];
        let data = rows(vec![json!({"Branch": "A", SAT: 4})]);
        let m = recommendation_matrix(&data, &cats);
        assert!(m.synthetic);
        assert_eq!(m.rows.len(), 1);

        let empty = recommendation_matrix(&[], &cats);
        assert!(!empty.synthetic);
        assert!(empty.rows.is_empty());
    }
}
