use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{Category, Example, LabeledError, PipelineData, Signature, Type};

use crate::ops;
use crate::SurveyPlugin;

use super::util;

pub struct Normalize;

impl PluginCommand for Normalize {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey normalize"
    }

    fn description(&self) -> &str {
        "Rename survey columns to canonical names (Branch, AS, Reasons Of Score, ...)"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![
                (Type::table(), Type::table()),
                (Type::record(), Type::table()),
            ])
            .switch(
                "branch-only",
                "Keep only rows that have a branch",
                Some('b'),
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["survey", "columns", "rename", "canonical", "headers"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: r#"[["Nom de l'agence" "Niveau de satisfaction"]; [Downtown 4]] | survey normalize"#,
            description: "French headers become their canonical column names",
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
        let branch_only = call.has_flag("branch-only")?;
        let head = call.head;
        let records = util::input_records(input);
        util::output(Ok(ops::op_normalize(&records, branch_only)), head)
    }
}
