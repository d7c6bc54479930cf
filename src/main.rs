use nu_plugin::{serve_plugin, MsgPackSerializer};
use survey_insights::SurveyPlugin;

fn main() {
    serve_plugin(&SurveyPlugin, MsgPackSerializer {})
}
