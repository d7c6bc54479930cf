use serde::{Deserialize, Serialize};

use super::branch::advocate_of;
use super::SurveyRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpsSummary {
    /// %promoters − %detractors, in [-100, 100].
    pub score: f64,
    pub promoters: f64,
    pub passives: f64,
    pub detractors: f64,
    #[serde(default)]
    pub respondents: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpsBucket {
    Promoter,
    Passive,
    Detractor,
}

/// 9–10 promoter, 7–8 passive, 0–6 detractor. Values outside 0–10 are not
/// likelihood-to-recommend scores and get no bucket.
pub fn bucket(score: f64) -> Option<NpsBucket> {
    match score {
        s if !(0.0..=10.0).contains(&s) => None,
        s if s >= 9.0 => Some(NpsBucket::Promoter),
        s if s >= 7.0 => Some(NpsBucket::Passive),
        _ => Some(NpsBucket::Detractor),
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Net Promoter Score over every row's AS value; `None` without any
/// valid score.
pub fn nps_summary(rows: &[SurveyRow]) -> Option<NpsSummary> {
    let (mut promoters, mut passives, mut detractors) = (0usize, 0usize, 0usize);
    for b in rows.iter().filter_map(advocate_of).filter_map(bucket) {
        match b {
            NpsBucket::Promoter => promoters += 1,
            NpsBucket::Passive => passives += 1,
            NpsBucket::Detractor => detractors += 1,
        }
    }

    let total = promoters + passives + detractors;
    if total == 0 {
        return None;
    }
    let pct = |n: usize| n as f64 / total as f64 * 100.0;
    Some(NpsSummary {
        score: round1(pct(promoters) - pct(detractors)),
        promoters: round1(pct(promoters)),
        passives: round1(pct(passives)),
        detractors: round1(pct(detractors)),
        respondents: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(scores: &[serde_json::Value]) -> Vec<SurveyRow> {
        scores
            .iter()
            .map(|s| json!({"AS": s}).as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn buckets_at_boundaries() {
        assert_eq!(bucket(10.0), Some(NpsBucket::Promoter));
        assert_eq!(bucket(9.0), Some(NpsBucket::Promoter));
        assert_eq!(bucket(8.5), Some(NpsBucket::Passive));
        assert_eq!(bucket(7.0), Some(NpsBucket::Passive));
        assert_eq!(bucket(6.0), Some(NpsBucket::Detractor));
        assert_eq!(bucket(0.0), Some(NpsBucket::Detractor));
        assert_eq!(bucket(11.0), None);
        assert_eq!(bucket(-1.0), None);
    }

    #[test]
    fn summary_over_mixed_values() {
        let data = rows(&[json!(10), json!("9"), json!(8), json!(3), json!("n/a"), json!(42)]);
        let nps = nps_summary(&data).unwrap();
        assert_eq!(nps.respondents, 4);
        assert_eq!(nps.promoters, 50.0);
        assert_eq!(nps.passives, 25.0);
        assert_eq!(nps.detractors, 25.0);
        assert_eq!(nps.score, 25.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        let nps = nps_summary(&rows(&[json!(10), json!(5), json!(5)])).unwrap();
        assert_eq!(nps.promoters, 33.3);
        assert_eq!(nps.score, -33.3);
    }

    #[test]
    fn no_scores_is_none() {
        assert_eq!(nps_summary(&[]), None);
        assert_eq!(nps_summary(&rows(&[json!("?")])), None);
    }
}
