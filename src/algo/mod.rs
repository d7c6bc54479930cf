pub mod analysis;
pub mod branch;
pub mod categories;
pub mod columns;
pub mod extract;
pub mod improvement;
pub mod nps;
pub mod rating;
pub mod table;

/// One survey response: column name → cell value, in source column order.
pub type SurveyRow = serde_json::Map<String, serde_json::Value>;
