use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type,
};
use std::path::Path;

use crate::ops;
use crate::SurveyPlugin;

use super::util;

pub struct Parse;

impl PluginCommand for Parse {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey parse"
    }

    fn description(&self) -> &str {
        "Parse a CSV/TSV/JSON survey export (or a workbook file) into a table"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![
                (Type::String, Type::table()),
                (Type::Nothing, Type::table()),
            ])
            .optional(
                "path",
                SyntaxShape::Filepath,
                "Survey file to read; format comes from the extension",
            )
            .named(
                "format",
                SyntaxShape::String,
                "Format of piped text: csv, tsv, json (default: csv)",
                Some('f'),
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["survey", "csv", "tsv", "xlsx", "import"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: r#""Branch,AS\nDowntown,9\nUptown,6" | survey parse"#,
                description: "Parse CSV text into survey rows",
                result: None,
            },
            Example {
                example: "survey parse responses.xlsx",
                description: "Read the first sheet of a workbook",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        _plugin: &SurveyPlugin,
        engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let path: Option<String> = call.opt(0)?;
        let format: String = call
            .get_flag::<String>("format")?
            .unwrap_or_else(|| "csv".into());
        let head = call.head;

        let result = match path {
            Some(p) => {
                let full = Path::new(&engine.get_current_dir()?).join(p);
                ops::op_read_file(&full.to_string_lossy())
            }
            None => {
                let raw = input.into_value(head)?.coerce_into_string()?;
                ops::op_parse(&raw, &format)
            }
        };

        util::output(result, head)
    }
}
