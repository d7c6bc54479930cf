use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type,
};

use crate::ops;
use crate::SurveyPlugin;

use super::util;

pub struct ExtractJson;

impl PluginCommand for ExtractJson {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey extract-json"
    }

    fn description(&self) -> &str {
        "Recover a JSON object from model output (fences, stray prose, bare keys, single quotes)"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::String, Type::Any)
            .switch(
                "with-stage",
                "Return {value, stage} instead of just the value",
                Some('s'),
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["json", "repair", "llm", "extract", "model"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: r#""Sure! {sentiment: 'positive', score: 0.8}" | survey extract-json"#,
            description: "Repair bare keys and single quotes",
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
        let with_stage = call.has_flag("with-stage")?;
        let head = call.head;
        let text = input.into_value(head)?.coerce_into_string()?;

        let result = ops::op_extract(&text).map(|extraction| {
            if with_stage {
                extraction
            } else {
                extraction
                    .get("value")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null)
            }
        });
        util::output(result, head)
    }
}

pub struct Interpret;

impl PluginCommand for Interpret {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey interpret"
    }

    fn description(&self) -> &str {
        "Interpret a model response as comprehensive, sentiment, themes, or kpis, with heuristic fallbacks"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::String, Type::record())
            .required(
                "kind",
                SyntaxShape::String,
                "Kind: comprehensive, sentiment, themes, kpis",
            )
            .named(
                "verbatims",
                SyntaxShape::List(Box::new(SyntaxShape::String)),
                "Verbatim comments used when the response is unusable",
                Some('v'),
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["llm", "sentiment", "themes", "kpi", "analysis"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: r#""Score: 0.7\nReason: friendly staff" | survey interpret sentiment"#,
            description: "Scrape a sentiment score from prose",
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
        let kind: String = call.req(0)?;
        let verbatims: Vec<String> = call.get_flag("verbatims")?.unwrap_or_default();
        let head = call.head;
        let text = input.into_value(head)?.coerce_into_string()?;
        util::output(ops::op_interpret(&kind, &text, &verbatims), head)
    }
}
