use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Recommendation categories compiled from `categories/default.json`.
/// Overridden by `$SURVEY_CATEGORIES`, `$XDG_DATA_HOME/survey/categories.json`,
/// or `--categories <path>`.
const EMBEDDED_DEFAULT: &str = include_str!("../../categories/default.json");

/// Caller-supplied column set for the recommendation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryList {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub categories: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryFile {
    Full(CategoryList),
    Bare(Vec<String>),
}

/// Load the category list using this resolution order:
///
/// 1. `$SURVEY_CATEGORIES` env var (path to JSON file)
/// 2. `$XDG_DATA_HOME/survey/categories.json`, or
///    `~/.local/share/survey/categories.json`
/// 3. Embedded default
///
/// A step that fails falls through to the next.
pub fn default_categories() -> CategoryList {
    if let Ok(path) = std::env::var("SURVEY_CATEGORIES") {
        match load_categories(&path) {
            Ok(list) => return list,
            Err(e) => tracing::warn!(error = %e, "ignoring SURVEY_CATEGORIES"),
        }
    }

    if let Some(path) = xdg_categories_path().filter(|p| p.exists()) {
        if let Some(list) = path.to_str().and_then(|p| load_categories(p).ok()) {
            return list;
        }
    }

    parse_categories(EMBEDDED_DEFAULT).expect("embedded default categories are valid JSON")
}

/// An explicit path must load; without one, fall back to [`default_categories`].
pub fn resolve_categories(path: Option<&str>) -> Result<CategoryList, String> {
    match path {
        Some(p) => load_categories(p),
        None => Ok(default_categories()),
    }
}

/// Parse either `{"categories": [...]}` or a bare JSON array of names.
pub fn parse_categories(json: &str) -> Result<CategoryList, String> {
    let file: CategoryFile =
        serde_json::from_str(json).map_err(|e| format!("Failed to parse categories: {e}"))?;
    Ok(match file {
        CategoryFile::Full(list) => list,
        CategoryFile::Bare(categories) => CategoryList {
            name: String::new(),
            version: String::new(),
            categories,
        },
    })
}

pub fn load_categories(path: &str) -> Result<CategoryList, String> {
    let json =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read '{path}': {e}"))?;
    parse_categories(&json)
}

fn xdg_categories_path() -> Option<PathBuf> {
    let data_home = std::env::var("XDG_DATA_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".local/share"))
        })?;
    Some(data_home.join("survey/categories.json"))
}

/// The embedded default as JSON, for seeding a user override file.
pub fn embedded_default_json() -> &'static str {
    EMBEDDED_DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_list_ends_with_unclassified() {
        let list = parse_categories(embedded_default_json()).unwrap();
        assert_eq!(list.categories.len(), 7);
        assert_eq!(list.categories[3], "The ambience of the branch");
        assert_eq!(list.categories.last().map(String::as_str), Some("Unclassified"));
    }

    #[test]
    fn bare_array_is_accepted() {
        let list = parse_categories(r#"["Speed", "Fees"]"#).unwrap();
        assert_eq!(list.categories, vec!["Speed", "Fees"]);
        assert!(list.name.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_categories("{nope").is_err());
        assert!(parse_categories(r#"{"name": "x"}"#).is_err());
    }

    #[test]
    fn explicit_path_is_loaded_or_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"categories": ["Queues"]}}"#).unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(resolve_categories(Some(path)).unwrap().categories, vec!["Queues"]);

        let err = resolve_categories(Some("/nonexistent/categories.json")).unwrap_err();
        assert!(err.contains("Failed to read"));
    }
}
