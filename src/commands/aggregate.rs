//! Branch aggregate commands. Each takes a survey table (raw or normalized
//! column names) and returns one aggregate.

use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type,
};

use crate::ops;
use crate::SurveyPlugin;

use super::util;

fn table_signature(name: &str, output: Type) -> Signature {
    Signature::build(name)
        .input_output_types(vec![
            (Type::table(), output.clone()),
            (Type::list(Type::Any), output),
        ])
        .category(Category::Experimental)
}

// ── survey rank ──────────────────────────────────────────────────────────────

pub struct Rank;

impl PluginCommand for Rank {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey rank"
    }

    fn description(&self) -> &str {
        "Rank branches by average satisfaction, with advocate score and a representative comment"
    }

    fn signature(&self) -> Signature {
        table_signature(self.name(), Type::table())
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["survey", "branch", "ranking", "satisfaction", "leaderboard"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: "[[Branch Satisfaction AS]; [Downtown 5 9] [Uptown 2 4]] | survey rank",
            description: "Rank two branches",
            result: None,
        }]
    }

    fn run(
        &self,
        _plugin: &SurveyPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let records = util::input_records(input);
        util::output(ops::op_rank(&records), call.head)
    }
}

// ── survey improvements ──────────────────────────────────────────────────────

pub struct Improvements;

impl PluginCommand for Improvements {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey improvements"
    }

    fn description(&self) -> &str {
        "Histogram of improvement categories with counts and percentages"
    }

    fn signature(&self) -> Signature {
        table_signature(self.name(), Type::table())
            .switch(
                "no-reasons",
                "Do not count score reasons that hint at an improvement",
                None,
            )
            .switch(
                "by-branch",
                "Top three categories per branch instead of one histogram",
                Some('b'),
            )
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["survey", "improvement", "histogram", "categories", "feedback"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: r#"[[Branch Improvements]; [Downtown "long queue, rude staff"]] | survey improvements"#,
                description: "Count improvement categories across all rows",
                result: None,
            },
            Example {
                example: r#"[[Branch Improvements]; [Downtown "long queue"] [Uptown "fees"]] | survey improvements --by-branch"#,
                description: "Top improvement categories for each branch",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        _plugin: &SurveyPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let scan_reasons = !call.has_flag("no-reasons")?;
        let by_branch = call.has_flag("by-branch")?;
        let records = util::input_records(input);
        let result = if by_branch {
            ops::op_branch_improvements(&records, scan_reasons)
        } else {
            ops::op_improvements(&records, scan_reasons)
        };
        util::output(result, call.head)
    }
}

// ── survey reasons ───────────────────────────────────────────────────────────

pub struct Reasons;

impl PluginCommand for Reasons {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey reasons"
    }

    fn description(&self) -> &str {
        "List score reasons with branch, score, date, and callback flag"
    }

    fn signature(&self) -> Signature {
        table_signature(self.name(), Type::table())
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["survey", "reasons", "comments", "callback"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: r#"[[Branch "Reasons Of Score" "Need Callback"]; [Downtown "slow service" yes]] | survey reasons"#,
            description: "Extract score reasons",
            result: None,
        }]
    }

    fn run(
        &self,
        _plugin: &SurveyPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let records = util::input_records(input);
        util::output(ops::op_reasons(&records), call.head)
    }
}

// ── survey matrix ────────────────────────────────────────────────────────────

pub struct Matrix;

impl PluginCommand for Matrix {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey matrix"
    }

    fn description(&self) -> &str {
        "Branch × recommendation-category count matrix"
    }

    fn signature(&self) -> Signature {
        table_signature(self.name(), Type::record())
            .named(
                "categories",
                SyntaxShape::Filepath,
                "Category list JSON file (default: $SURVEY_CATEGORIES, XDG data dir, or built-in)",
                Some('c'),
            )
            .named(
                "columns",
                SyntaxShape::List(Box::new(SyntaxShape::String)),
                "Inline category names, overriding --categories",
                None,
            )
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["survey", "matrix", "recommendation", "heatmap", "categories"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: r#"[[Branch Improvements]; [Downtown "waiting time"]] | survey matrix --columns ["Waiting time" "Fees"]"#,
            description: "Matrix over two inline categories",
            result: None,
        }]
    }

    fn run(
        &self,
        _plugin: &SurveyPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let categories: Option<String> = call.get_flag("categories")?;
        let columns: Option<Vec<String>> = call.get_flag("columns")?;
        let records = util::input_records(input);
        let result = ops::op_matrix(&records, columns.as_deref(), categories.as_deref());
        util::output(result, call.head)
    }
}

// ── survey nps ───────────────────────────────────────────────────────────────

pub struct Nps;

impl PluginCommand for Nps {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey nps"
    }

    fn description(&self) -> &str {
        "Net Promoter Score from AS values (nothing when no valid score exists)"
    }

    fn signature(&self) -> Signature {
        table_signature(self.name(), Type::Any)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["survey", "nps", "promoter", "detractor", "advocate"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: "[[AS]; [10] [9] [7] [3]] | survey nps",
            description: "Two promoters, one passive, one detractor",
            result: None,
        }]
    }

    fn run(
        &self,
        _plugin: &SurveyPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let records = util::input_records(input);
        util::output(ops::op_nps(&records), call.head)
    }
}

// ── survey report ────────────────────────────────────────────────────────────

pub struct Report;

impl PluginCommand for Report {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey report"
    }

    fn description(&self) -> &str {
        "Every branch aggregate in one record"
    }

    fn signature(&self) -> Signature {
        table_signature(self.name(), Type::record())
            .named(
                "categories",
                SyntaxShape::Filepath,
                "Category list JSON file for the recommendation matrix",
                Some('c'),
            )
            .switch(
                "no-reasons",
                "Do not count score reasons that hint at an improvement",
                None,
            )
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["survey", "report", "summary", "dashboard"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: "open responses.csv | survey report",
            description: "Full branch report for a CSV export",
            result: None,
        }]
    }

    fn run(
        &self,
        _plugin: &SurveyPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let categories: Option<String> = call.get_flag("categories")?;
        let scan_reasons = !call.has_flag("no-reasons")?;
        let records = util::input_records(input);
        let result = ops::op_report(&records, categories.as_deref(), scan_reasons);
        util::output(result, call.head)
    }
}
