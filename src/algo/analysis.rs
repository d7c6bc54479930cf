//! Typed interpretation of model responses for survey analysis.
//!
//! Each `interpret_*` function runs the response through the extractor and
//! deserializes the expected shape. When that fails it builds a
//! deterministic result from the text and the verbatims instead, and marks
//! it `degraded` so callers can tell it apart from model output.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::extract::safe_json_parse;
use super::nps::NpsSummary;

pub const GENERAL_FEEDBACK: &str = "General Feedback";
pub const GENERIC_KPI_EXPLANATION: &str =
    "These KPIs were identified based on their correlation with other metrics in the survey data.";

const FALLBACK_THEME_SAMPLE: usize = 10;
const LABEL_THRESHOLD: f64 = 0.3;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "happy", "satisfied", "like", "love", "best", "awesome",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "terrible", "unhappy", "dissatisfied", "dislike", "hate", "worst", "awful",
];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid built-in pattern")
}

static SCORE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)sentiment\s+score\s*:?\s*(-?\d+\.?\d*)",
        r"(?i)score\s*:?\s*(-?\d+\.?\d*)",
        r"(-?\d+\.?\d*)\s*/\s*1",
        r"(?i)score\s+of\s+(-?\d+\.?\d*)",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static LABEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)sentiment\s+label\s*:?\s*["']?(positive|negative|neutral)["']?"#,
        r#"(?i)sentiment\s+is\s+["']?(positive|negative|neutral)["']?"#,
        r#"(?i)sentiment\s*:?\s*["']?(positive|negative|neutral)["']?"#,
        r"(?i)(positive|negative|neutral)\s+sentiment",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static REASON_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)reason\s*:?\s*["']?([^"'\n]+)["']?"#,
        r#"(?i)reasoning\s*:?\s*["']?([^"'\n]+)["']?"#,
        r#"(?i)explanation\s*:?\s*["']?([^"'\n]+)["']?"#,
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static SCORE_OR_LABEL_LINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)sentiment\s+score|sentiment\s+label|score\s*:|label\s*:"));

static KPI_LIST: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)KPIs?:?\s*((?:(?:-|\*|\d+\.)[ \t]*[\w \t]+\s*)+)"));

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| compile(r"(?:-|\*|\d+\.)[ \t]*([\w \t]+)"));

static KPI_ARRAY: LazyLock<Regex> = LazyLock::new(|| compile(r#"(?i)kpis"?\s*:?\s*\[(.*?)\]"#));

static KPI_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)(?:key|important|significant)\s+(?:indicators?|metrics?|KPIs?|factors?)\s+(?:are|is|include)\s+([\w\s,]+)",
    )
});

static EXPLANATION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(?:explanation|reasoning|analysis):\s*([\s\S]+?)(?:\n\n|$)"));

static THEMES_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)themes\s*:?\s*(\[[\s\S]*\])"));

static THEME_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)(?:themes|categories|topics)\s+(?:include|are|identified)\s+([\w\s,]+)")
});

// ── Result shapes ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpreted<T> {
    pub value: T,
    /// Built by a fallback rather than parsed from the response.
    pub degraded: bool,
}

impl<T> Interpreted<T> {
    fn parsed(value: T) -> Self {
        Self {
            value,
            degraded: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            degraded: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kpi {
    pub name: String,
    pub importance: f64,
    pub correlation: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub theme: String,
    pub responses: Vec<String>,
    pub sentiment: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentDistribution {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizedComments {
    pub positive: Vec<String>,
    pub neutral: Vec<String>,
    pub negative: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverallSentiment {
    pub score: f64,
    pub distribution: SentimentDistribution,
    pub comment_count: usize,
    pub categorized_comments: CategorizedComments,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComprehensiveAnalysis {
    pub kpis: Vec<Kpi>,
    pub themes: Vec<Theme>,
    pub overall_sentiment: OverallSentiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nps: Option<NpsSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDetection {
    pub kpis: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentReading {
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSet {
    pub themes: Vec<Theme>,
}

// ── Comprehensive ────────────────────────────────────────────────────────────

/// Keyword polarity of one comment: +1, -1 or 0 on a tie.
pub fn keyword_polarity(comment: &str) -> i8 {
    let lower = comment.to_lowercase();
    let pos = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let neg = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    match pos.cmp(&neg) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    }
}

/// Keyword-sentiment summary used when the model gave nothing usable.
pub fn fallback_analysis(verbatims: &[String]) -> ComprehensiveAnalysis {
    let mut comments = CategorizedComments::default();
    for v in verbatims {
        match keyword_polarity(v) {
            1 => comments.positive.push(v.clone()),
            -1 => comments.negative.push(v.clone()),
            _ => comments.neutral.push(v.clone()),
        }
    }
    tracing::debug!(
        positive = comments.positive.len(),
        neutral = comments.neutral.len(),
        negative = comments.negative.len(),
        "fallback sentiment distribution"
    );

    let total = verbatims.len();
    let pct = |n: usize| {
        if total == 0 {
            0.0
        } else {
            (n as f64 / total as f64 * 100.0).round()
        }
    };
    let positive = pct(comments.positive.len());
    let negative = pct(comments.negative.len());

    ComprehensiveAnalysis {
        kpis: Vec::new(),
        themes: vec![Theme {
            theme: GENERAL_FEEDBACK.into(),
            responses: verbatims.iter().take(FALLBACK_THEME_SAMPLE).cloned().collect(),
            sentiment: 0.0,
        }],
        overall_sentiment: OverallSentiment {
            score: (positive - negative) / 100.0,
            distribution: SentimentDistribution {
                positive,
                neutral: 100.0 - positive - negative,
                negative,
            },
            comment_count: total,
            categorized_comments: comments,
        },
        nps: None,
    }
}

pub fn interpret_comprehensive(text: &str, verbatims: &[String]) -> Interpreted<ComprehensiveAnalysis> {
    let typed = safe_json_parse(text)
        .filter(|v| {
            ["kpis", "themes", "overallSentiment"]
                .iter()
                .any(|k| v.get(k).is_some())
        })
        .and_then(|v| serde_json::from_value::<ComprehensiveAnalysis>(v).ok());
    match typed {
        Some(analysis) => Interpreted::parsed(analysis),
        None => {
            tracing::warn!(
                comments = verbatims.len(),
                "unusable comprehensive analysis response, using keyword fallback"
            );
            Interpreted::fallback(fallback_analysis(verbatims))
        }
    }
}

// ── Sentiment ────────────────────────────────────────────────────────────────

fn canonical_label(label: &str) -> String {
    match label.to_ascii_lowercase().as_str() {
        "positive" => "Positive".into(),
        "negative" => "Negative".into(),
        _ => "Neutral".into(),
    }
}

fn first_capture<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|p| p.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str()))
}

fn first_paragraph(text: &str, skip: impl Fn(&str) -> bool) -> Option<String> {
    text.split("\n\n")
        .find(|p| !skip(p) && p.chars().count() > 20)
        .map(|p| p.trim().to_string())
}

fn scrape_sentiment(text: &str) -> SentimentReading {
    let score = first_capture(&SCORE_PATTERNS, text)
        .and_then(|s| s.trim_end_matches('.').parse::<f64>().ok())
        .unwrap_or(0.0);

    let mut label = first_capture(&LABEL_PATTERNS, text)
        .map(canonical_label)
        .unwrap_or_else(|| "Neutral".into());
    if label == "Neutral" {
        if score > LABEL_THRESHOLD {
            label = "Positive".into();
        } else if score < -LABEL_THRESHOLD {
            label = "Negative".into();
        }
    }

    let reason = first_capture(&REASON_PATTERNS, text)
        .map(|r| r.trim().to_string())
        .or_else(|| first_paragraph(text, |p| SCORE_OR_LABEL_LINE.is_match(p)))
        .unwrap_or_default();

    SentimentReading {
        sentiment_score: score,
        sentiment_label: label,
        reason,
    }
}

pub fn interpret_sentiment(text: &str) -> Interpreted<SentimentReading> {
    if let Some(v) = safe_json_parse(text) {
        let score = v.get("sentimentScore");
        let label = v.get("sentimentLabel").and_then(Value::as_str).filter(|s| !s.is_empty());
        if score.is_some() || label.is_some() {
            return Interpreted::parsed(SentimentReading {
                sentiment_score: score.and_then(Value::as_f64).unwrap_or(0.0),
                sentiment_label: label.unwrap_or("Neutral").to_string(),
                reason: v
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }
    }
    tracing::warn!("unusable sentiment response, scraping text");
    Interpreted::fallback(scrape_sentiment(text))
}

// ── Themes ───────────────────────────────────────────────────────────────────

/// Lenient theme object: `responses` may be a list or a single value.
fn theme_from_value(v: &Value) -> Option<Theme> {
    let name = v.get("theme")?.as_str()?.to_string();
    let responses = match v.get("responses")? {
        Value::Array(items) => items
            .iter()
            .map(|i| match i {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Value::String(s) => vec![s.clone()],
        other => vec![other.to_string()],
    };
    Some(Theme {
        theme: name,
        responses,
        sentiment: v.get("sentiment").and_then(Value::as_f64).unwrap_or(0.0),
    })
}

/// Split verbatims evenly, in order, across named themes.
fn distribute(names: &[String], verbatims: &[String]) -> Vec<Theme> {
    let per = verbatims.len().div_ceil(names.len().max(1)).max(1);
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Theme {
            theme: name.clone(),
            responses: verbatims.iter().skip(i * per).take(per).cloned().collect(),
            sentiment: 0.0,
        })
        .collect()
}

fn scrape_themes(text: &str, verbatims: &[String]) -> Vec<Theme> {
    if let Some(body) = THEMES_ARRAY.captures(text).and_then(|c| c.get(1)) {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(body.as_str()) {
            let themes: Vec<Theme> = items.iter().filter_map(theme_from_value).collect();
            if !themes.is_empty() {
                return themes;
            }
        }
    }

    if let Some(list) = THEME_SENTENCE.captures(text).and_then(|c| c.get(1)) {
        let names: Vec<String> = list
            .as_str()
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !names.is_empty() {
            return distribute(&names, verbatims);
        }
    }

    vec![Theme {
        theme: GENERAL_FEEDBACK.into(),
        responses: verbatims.to_vec(),
        sentiment: 0.0,
    }]
}

pub fn interpret_themes(text: &str, verbatims: &[String]) -> Interpreted<ThemeSet> {
    if let Some(Value::Array(items)) = safe_json_parse(text).and_then(|v| v.get("themes").cloned()) {
        return Interpreted::parsed(ThemeSet {
            themes: items.iter().filter_map(theme_from_value).collect(),
        });
    }
    tracing::warn!("unusable theme response, scraping text");
    Interpreted::fallback(ThemeSet {
        themes: scrape_themes(text, verbatims),
    })
}

// ── KPIs ─────────────────────────────────────────────────────────────────────

fn kpi_name(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => v.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(|k| k.trim().replace('"', ""))
        .filter(|k| !k.is_empty())
        .collect()
}

fn scrape_kpis(text: &str) -> KpiDetection {
    let mut kpis: Vec<String> = KPI_LIST
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|block| {
            LIST_ITEM
                .captures_iter(block.as_str())
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if kpis.is_empty() {
        if let Some(list) = KPI_ARRAY.captures(text).and_then(|c| c.get(1)) {
            kpis = split_names(list.as_str());
        }
    }
    if kpis.is_empty() {
        if let Some(list) = KPI_SENTENCE.captures(text).and_then(|c| c.get(1)) {
            kpis = split_names(list.as_str());
        }
    }

    let explanation = EXPLANATION
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .or_else(|| first_paragraph(text, |p| KPI_LIST.is_match(p)))
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| GENERIC_KPI_EXPLANATION.into());

    KpiDetection { kpis, explanation }
}

pub fn interpret_kpis(text: &str) -> Interpreted<KpiDetection> {
    if let Some(v) = safe_json_parse(text) {
        if let Some(kpis) = v.get("kpis") {
            let names = match kpis {
                Value::Array(items) => items.iter().filter_map(kpi_name).collect(),
                _ => Vec::new(),
            };
            return Interpreted::parsed(KpiDetection {
                kpis: names,
                explanation: v
                    .get("explanation")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }
    }
    tracing::warn!("unusable KPI response, scraping text");
    Interpreted::fallback(scrape_kpis(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verbatims(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| match i % 3 {
                0 => format!("great staff {i}"),
                1 => format!("terrible queue {i}"),
                _ => format!("visited on day {i}"),
            })
            .collect()
    }

    #[test]
    fn comprehensive_parses_model_json() {
        let text = r#"```json
{"kpis":[{"name":"Wait","importance":0.9,"correlation":-0.4}],
 "themes":[{"theme":"Speed","responses":["slow"],"sentiment":-0.5}],
 "overallSentiment":{"score":0.1,"distribution":{"positive":40,"neutral":30,"negative":30},
   "commentCount":3,"categorizedComments":{"positive":["a"],"neutral":["b"],"negative":["c"]}}}
```"#;
        let got = interpret_comprehensive(text, &[]);
        assert!(!got.degraded);
        assert_eq!(got.value.kpis[0].name, "Wait");
        assert_eq!(got.value.themes[0].theme, "Speed");
        assert_eq!(got.value.overall_sentiment.comment_count, 3);
        assert!(got.value.nps.is_none());
    }

    #[test]
    fn comprehensive_fallback_counts_every_comment() {
        let v = verbatims(12);
        let got = interpret_comprehensive("the model rambled", &v);
        assert!(got.degraded);
        let a = got.value;
        assert!(a.kpis.is_empty());
        assert_eq!(a.themes.len(), 1);
        assert_eq!(a.themes[0].theme, GENERAL_FEEDBACK);
        assert_eq!(a.themes[0].responses.len(), 10);
        assert_eq!(a.overall_sentiment.comment_count, 12);
        let d = &a.overall_sentiment.distribution;
        assert_eq!(d.positive, 33.0);
        assert_eq!(d.negative, 33.0);
        assert_eq!(d.positive + d.neutral + d.negative, 100.0);
        assert_eq!(a.overall_sentiment.score, 0.0);
        assert_eq!(a.overall_sentiment.categorized_comments.positive.len(), 4);
    }

    #[test]
    fn fallback_with_no_comments() {
        let a = fallback_analysis(&[]);
        assert_eq!(a.overall_sentiment.comment_count, 0);
        assert_eq!(a.overall_sentiment.distribution.neutral, 100.0);
        assert!(a.themes[0].responses.is_empty());
    }

    #[test]
    fn polarity_ties_are_neutral() {
        assert_eq!(keyword_polarity("Good staff, bad queue"), 0);
        assert_eq!(keyword_polarity("I LOVE it"), 1);
        assert_eq!(keyword_polarity("awful"), -1);
    }

    #[test]
    fn sentiment_from_json() {
        let got = interpret_sentiment(r#"{"sentimentScore": -0.6, "sentimentLabel": "Negative", "reason": "long queue"}"#);
        assert!(!got.degraded);
        assert_eq!(got.value.sentiment_score, -0.6);
        assert_eq!(got.value.sentiment_label, "Negative");
    }

    #[test]
    fn sentiment_scraped_from_prose() {
        let text = "Sentiment Score  0.7\nThe customer was pleased with the teller.";
        let got = interpret_sentiment(text);
        assert!(got.degraded);
        assert_eq!(got.value.sentiment_score, 0.7);
        assert_eq!(got.value.sentiment_label, "Positive");

        let got = interpret_sentiment("Overall a negative sentiment.\n\nReason: staff were rude");
        assert_eq!(got.value.sentiment_label, "Negative");
        assert_eq!(got.value.reason, "staff were rude");
    }

    #[test]
    fn sentiment_label_inferred_only_past_threshold() {
        let got = interpret_sentiment("score 0.2 overall");
        assert_eq!(got.value.sentiment_label, "Neutral");
        let got = interpret_sentiment("score -0.5 overall");
        assert_eq!(got.value.sentiment_label, "Negative");
    }

    #[test]
    fn themes_from_json_and_fallback() {
        let got = interpret_themes(
            r#"{"themes":[{"theme":"Queues","responses":"too long"}]}"#,
            &[],
        );
        assert!(!got.degraded);
        assert_eq!(got.value.themes[0].responses, vec!["too long"]);

        let v = verbatims(3);
        let got = interpret_themes("I could not find any themes", &v);
        assert!(got.degraded);
        assert_eq!(got.value.themes.len(), 1);
        assert_eq!(got.value.themes[0].theme, GENERAL_FEEDBACK);
        assert_eq!(got.value.themes[0].responses, v);
    }

    #[test]
    fn themes_named_in_prose_share_verbatims() {
        let v = verbatims(5);
        let got = interpret_themes("The themes identified Speed, Staff, Fees", &v);
        assert!(got.degraded);
        let names: Vec<&str> = got.value.themes.iter().map(|t| t.theme.as_str()).collect();
        assert_eq!(names, vec!["Speed", "Staff", "Fees"]);
        assert_eq!(got.value.themes[0].responses.len(), 2);
        assert_eq!(got.value.themes[2].responses.len(), 1);
    }

    #[test]
    fn kpis_from_json_accept_names_or_objects() {
        let got = interpret_kpis(r#"{"kpis": ["AS", {"name": "Satisfaction"}], "explanation": "x"}"#);
        assert!(!got.degraded);
        assert_eq!(got.value.kpis, vec!["AS", "Satisfaction"]);
    }

    #[test]
    fn kpis_scraped_from_list() {
        let text = "KPIs:\n- Waiting time\n- Staff courtesy\n\nExplanation: both drive the overall score";
        let got = interpret_kpis(text);
        assert!(got.degraded);
        assert_eq!(got.value.kpis, vec!["Waiting time", "Staff courtesy"]);
        assert_eq!(got.value.explanation, "both drive the overall score");
    }

    #[test]
    fn kpis_generic_explanation_when_nothing_found() {
        let got = interpret_kpis("nothing");
        assert!(got.value.kpis.is_empty());
        assert_eq!(got.value.explanation, GENERIC_KPI_EXPLANATION);
    }
}
