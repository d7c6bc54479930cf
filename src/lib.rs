pub mod algo;
pub mod ops;

#[cfg(feature = "mcp")]
pub mod mcp;

#[cfg(feature = "plugin")]
pub mod commands;

#[cfg(feature = "plugin")]
use nu_plugin::{Plugin, PluginCommand};

#[cfg(feature = "plugin")]
pub struct SurveyPlugin;

#[cfg(feature = "plugin")]
impl Plugin for SurveyPlugin {
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").into()
    }

    fn commands(&self) -> Vec<Box<dyn PluginCommand<Plugin = Self>>> {
        vec![
            Box::new(commands::Parse),
            Box::new(commands::Normalize),
            Box::new(commands::Rank),
            Box::new(commands::Improvements),
            Box::new(commands::Reasons),
            Box::new(commands::Matrix),
            Box::new(commands::Nps),
            Box::new(commands::Report),
            Box::new(commands::ExtractJson),
            Box::new(commands::Interpret),
        ]
    }
}
