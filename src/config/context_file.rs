use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::template::{Frame, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFormat {
    Json,
    Yaml,
}

impl ContextFormat {
    /// `.json` files are JSON; anything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ContextFormat::Json,
            _ => ContextFormat::Yaml,
        }
    }
}

pub fn load(path: &Path) -> Result<Frame> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read context file {}", path.display()))?;
    parse(&contents, ContextFormat::from_path(path))
        .with_context(|| format!("Invalid context file {}", path.display()))
}

/// Parse context data; the top level must be a mapping. Empty input is an empty frame.
pub fn parse(contents: &str, format: ContextFormat) -> Result<Frame> {
    if contents.trim().is_empty() {
        return Ok(Frame::new());
    }

    let value = match format {
        ContextFormat::Json => Value::from(serde_json::from_str::<serde_json::Value>(contents)?),
        ContextFormat::Yaml => Value::from(serde_yaml::from_str::<serde_yaml::Value>(contents)?),
    };

    match value {
        Value::Map(frame) => Ok(frame),
        Value::Null => Ok(Frame::new()),
        other => bail!(
            "Context must be a mapping at the top level, found {}",
            other.type_name()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ContextFormat::from_path(Path::new("data.json")), ContextFormat::Json);
        assert_eq!(ContextFormat::from_path(Path::new("data.JSON")), ContextFormat::Json);
        assert_eq!(ContextFormat::from_path(Path::new("data.yml")), ContextFormat::Yaml);
        assert_eq!(ContextFormat::from_path(Path::new("data")), ContextFormat::Yaml);
    }

    #[test]
    fn test_parse_json() {
        let frame = parse(r#"{"name": "Kyle", "tags": ["a", "b"]}"#, ContextFormat::Json).unwrap();
        assert_eq!(frame["name"], Value::from("Kyle"));
        assert_eq!(frame["tags"], Value::from(vec!["a", "b"]));
    }

    #[test]
    fn test_parse_yaml() {
        let frame = parse("name: Kyle\nprofile:\n  github: kylef\n", ContextFormat::Yaml).unwrap();
        assert_eq!(frame["name"], Value::from("Kyle"));
        assert_eq!(
            frame["profile"].as_map().and_then(|m| m.get("github")),
            Some(&Value::from("kylef"))
        );
    }

    #[test]
    fn test_empty_input_is_empty_frame() {
        assert!(parse("", ContextFormat::Json).unwrap().is_empty());
        assert!(parse("~", ContextFormat::Yaml).unwrap().is_empty());
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        let err = parse("[1, 2]", ContextFormat::Json).unwrap_err();
        assert_eq!(err.to_string(), "Context must be a mapping at the top level, found array");
        assert!(parse("just text", ContextFormat::Yaml).is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(parse("{not json", ContextFormat::Json).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/nonexistent/context.yml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read context file"));
    }
}
