use serde_json::{json, Value};
use std::io::Write;
use survey_insights::ops;

/// A raw export with mixed English/French headers.
fn sample_records() -> Vec<Value> {
    vec![
        json!({"Agence": "Downtown", "Satisfaction": 5, "AS": 10, "Comments": "Quick and friendly", "Improvements": "none"}),
        json!({"Agence": "Downtown", "Satisfaction": "bien", "AS": 9, "Comments": "Good", "Improvements": "long queue"}),
        json!({"Agence": "Uptown", "Satisfaction": 2, "AS": 3, "Comments": "Too slow", "Improvements": "queue, rude staff"}),
        json!({"Agence": "Uptown", "Satisfaction": "n/a", "AS": 7, "Comments": "ok"}),
        json!({"Satisfaction": 1, "AS": 0, "Comments": "no branch given"}),
    ]
}

#[test]
fn ops_parse_csv_text() {
    let raw = "Branch,AS,Reasons Of Score\nDowntown,9,\"Fast, polite\"\nUptown,,slow\n";
    let result = ops::op_parse(raw, "csv").unwrap();
    let rows = result.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["AS"], json!(9));
    assert_eq!(rows[0]["Reasons Of Score"], json!("Fast, polite"));
    assert_eq!(rows[1]["AS"], Value::Null);
}

#[test]
fn ops_parse_json_falls_back_to_csv() {
    let result = ops::op_parse("Branch,AS\nDowntown,9\n", "json").unwrap();
    assert_eq!(result, json!([{"Branch": "Downtown", "AS": 9}]));
}

#[test]
fn ops_parse_unknown_format() {
    assert!(ops::op_parse("a,b\n1,2", "yaml").is_err());
}

#[test]
fn ops_read_file_by_extension() {
    let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
    write!(file, "Branch\tAS\nDowntown\t8\n").unwrap();
    let result = ops::op_read_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(result, json!([{"Branch": "Downtown", "AS": 8}]));
}

#[test]
fn ops_read_file_missing_is_error() {
    assert!(ops::op_read_file("/nonexistent/survey.csv").is_err());
}

#[test]
fn ops_normalize_renames_headers() {
    let result = ops::op_normalize(&sample_records(), false);
    let rows = result.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["Branch"], json!("Downtown"));
    assert_eq!(rows[0]["Reasons Of Score"], json!("Quick and friendly"));
    assert!(rows[0].get("Agence").is_none());

    let branch_only = ops::op_normalize(&sample_records(), true);
    assert_eq!(branch_only.as_array().unwrap().len(), 4);
}

#[test]
fn ops_rank_orders_branches() {
    let result = ops::op_rank(&sample_records()).unwrap();
    let ranks = result.as_array().unwrap();
    assert_eq!(ranks.len(), 2);
    assert_eq!(ranks[0]["branch"], json!("Downtown"));
    assert_eq!(ranks[0]["satisfaction"], json!(4.5));
    assert_eq!(ranks[0]["responseCount"], json!(2));
    assert_eq!(ranks[1]["branch"], json!("Uptown"));
    assert_eq!(ranks[1]["validSatisfactionCount"], json!(1));
}

#[test]
fn ops_improvements_histogram() {
    let result = ops::op_improvements(&sample_records(), false).unwrap();
    let tallies = result.as_array().unwrap();
    assert_eq!(tallies[0]["category"], json!("Waiting Time"));
    assert_eq!(tallies[0]["count"], json!(2));
}

#[test]
fn ops_matrix_with_inline_categories() {
    let cats = vec!["Waiting Time".to_string(), "Unclassified".to_string()];
    let result = ops::op_matrix(&sample_records(), Some(&cats), None).unwrap();
    assert_eq!(result["categories"], json!(cats));
    assert_eq!(result["synthetic"], json!(false));
    let rows = result["rows"].as_array().unwrap();
    assert!(rows.iter().any(|r| r["branch"] == "Uptown"));
}

#[test]
fn ops_nps_summary_and_null() {
    let result = ops::op_nps(&sample_records()).unwrap();
    assert_eq!(result["respondents"], json!(5));
    assert_eq!(result["promoters"], json!(40.0));
    assert_eq!(result["detractors"], json!(40.0));
    assert_eq!(result["score"], json!(0.0));

    let none = ops::op_nps(&[json!({"Branch": "X"})]).unwrap();
    assert_eq!(none, Value::Null);
}

#[test]
fn ops_report_bundles_every_aggregate() {
    let result = ops::op_report(&sample_records(), None, true).unwrap();
    assert_eq!(result["totalRows"], json!(5));
    assert_eq!(result["branchRows"], json!(4));
    for key in [
        "branchRankings",
        "improvementCategories",
        "reasonsData",
        "branchImprovements",
        "recommendationMatrix",
        "nps",
        "branchData",
    ] {
        assert!(result.get(key).is_some(), "missing {key}");
    }
    assert_eq!(result["branchData"].as_array().unwrap().len(), 4);
}

#[test]
fn ops_extract_reports_stage() {
    let result = ops::op_extract("Here you go:\n```json\n{\"a\": 1}\n```").unwrap();
    assert_eq!(result["value"], json!({"a": 1}));
    assert_eq!(result["stage"], json!("fenced"));

    assert_eq!(ops::op_extract("nothing here").unwrap(), Value::Null);
}

#[test]
fn ops_interpret_sentiment_from_json() {
    let text = r#"{"sentimentScore": 0.6, "sentimentLabel": "Positive", "reason": "friendly staff"}"#;
    let result = ops::op_interpret("sentiment", text, &[]).unwrap();
    assert_eq!(result["degraded"], json!(false));
    assert_eq!(result["value"]["sentimentScore"], json!(0.6));
    assert_eq!(result["value"]["sentimentLabel"], json!("Positive"));
    assert_eq!(result["value"]["reason"], json!("friendly staff"));
}

#[test]
fn ops_interpret_sentiment_without_known_keys_is_degraded() {
    let text = r#"{"score": 0.6, "label": "positive"}"#;
    let result = ops::op_interpret("sentiment", text, &[]).unwrap();
    assert_eq!(result["degraded"], json!(true));
    assert!(result["value"]["sentimentLabel"].is_string());
}

#[test]
fn ops_column_rating_categorize() {
    let cols = ops::op_column(&["Agence".into(), "Favourite colour".into()]);
    assert_eq!(cols[0]["column"], json!("Branch"));
    assert_eq!(cols[0]["canonical"], json!(true));
    assert_eq!(cols[1]["column"], json!("Favourite colour"));
    assert_eq!(cols[1]["canonical"], json!(false));

    let ratings = ops::op_rating(&[json!("excellent"), json!("4"), json!("?")]);
    assert_eq!(ratings[0]["rating"], json!(5.0));
    assert_eq!(ratings[1]["rating"], json!(4.0));
    assert_eq!(ratings[2]["rating"], Value::Null);

    let cats = ops::op_categorize(&["Long queue".into(), "parking".into()]);
    assert_eq!(cats[0]["category"], json!("Waiting Time"));
    assert_eq!(cats[0]["known"], json!(true));
    assert_eq!(cats[1]["known"], json!(false));
}

#[test]
fn ops_categories_default_list() {
    let result = ops::op_categories(None).unwrap();
    let cats = result["categories"].as_array().unwrap();
    assert!(!cats.is_empty());
}
