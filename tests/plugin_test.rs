//! Plugin command tests, evaluated through an in-process nushell engine.

#![cfg(feature = "plugin")]

use nu_plugin_test_support::PluginTest;
use nu_protocol::{ShellError, Span};
use survey_insights::SurveyPlugin;

#[test]
fn survey_nps_over_table() -> Result<(), ShellError> {
    let value = PluginTest::new("survey", SurveyPlugin.into())?
        .eval("[[AS]; [10] [9] [7] [3]] | survey nps")?
        .into_value(Span::test_data())?;
    let record = value.as_record()?;
    assert_eq!(record.get("respondents").and_then(|v| v.as_int().ok()), Some(4));
    assert_eq!(record.get("score").and_then(|v| v.as_float().ok()), Some(25.0));
    Ok(())
}

#[test]
fn survey_rank_normalizes_headers() -> Result<(), ShellError> {
    let value = PluginTest::new("survey", SurveyPlugin.into())?
        .eval("[[Agence Satisfaction]; [Downtown 5] [Uptown 2] [Uptown 4]] | survey rank")?
        .into_value(Span::test_data())?;
    let rows = value.as_list()?;
    assert_eq!(rows.len(), 2);
    let first = rows[0].as_record()?;
    assert_eq!(
        first.get("branch").and_then(|v| v.as_str().ok()),
        Some("Downtown")
    );
    Ok(())
}

#[test]
fn survey_extract_json_returns_value() -> Result<(), ShellError> {
    let value = PluginTest::new("survey", SurveyPlugin.into())?
        .eval(r#""Result: {name: 'Accra', count: 3}" | survey extract-json --with-stage"#)?
        .into_value(Span::test_data())?;
    let record = value.as_record()?;
    assert_eq!(
        record.get("stage").and_then(|v| v.as_str().ok()),
        Some("repaired")
    );
    Ok(())
}
