//! Command execution.

use crate::error::CliError;
use crate::formatter::{create_formatter, OutputFormat};
use crate::{Args, Command};
use serde_json::Value;
use shapestore_core::{NormalizeConfig, Record, ShapeRegistry};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Load shapes and run the selected command, returning its output.
pub fn run(args: &Args) -> Result<String, CliError> {
    let registry = load_registry(&args.shapes)?;
    execute(&registry, &args.command, args.format)
}

/// Load a shape declaration file.
pub fn load_registry(path: &Path) -> Result<ShapeRegistry, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let registry = ShapeRegistry::from_reader(BufReader::new(file))?;
    debug!(path = %path.display(), shapes = registry.entity_names().len(), "loaded shapes");
    Ok(registry)
}

/// Run one command against a loaded registry.
pub fn execute(
    registry: &ShapeRegistry,
    command: &Command,
    format: OutputFormat,
) -> Result<String, CliError> {
    let formatter = create_formatter(format);

    match command {
        Command::Normalize {
            entity,
            input,
            keep_undeclared,
            max_depth,
        } => {
            let shape = registry.shape(entity)?;
            let data = read_input(input.as_deref())?;

            let mut config = NormalizeConfig::new().keep_undeclared(*keep_undeclared);
            if let Some(depth) = max_depth {
                config = config.max_depth(*depth);
            }

            let normalized = shape.normalize_with(&data, &config)?;
            info!(
                entity = %entity,
                tables = normalized.entities.len(),
                records = normalized.record_count(),
                "normalized input"
            );
            Ok(formatter.format_normalized(&normalized))
        }
        Command::Schema { entity, many } => {
            let schema = registry.shape(entity)?.schema(*many)?;
            Ok(formatter.format_schema(&schema))
        }
        Command::Init { entity, input } => {
            let shape = registry.shape(entity)?;
            let data = match input {
                Some(path) => read_input(Some(path.as_path()))?,
                None => Value::Null,
            };
            let record = Record::from_value(shape, &data)?;
            Ok(formatter.format_record(&record))
        }
        Command::List => Ok(formatter.format_shapes(registry)),
    }
}

/// Read JSON from a file, or from stdin when no path is given.
fn read_input(path: Option<&Path>) -> Result<Value, CliError> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(serde_json::from_reader(std::io::stdin().lock())?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    const SHAPES: &str = r#"{
        "shapes": [
            {"entity": "User", "fields": {"id": {"attr": null}, "name": {"attr": ""}}},
            {
                "entity": "Post",
                "fields": {
                    "id": {"attr": null},
                    "title": {"attr": ""},
                    "author": {"belongs_to": {"target": "User", "foreign_key": "author"}}
                }
            }
        ]
    }"#;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_normalize_command() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load_registry(&write_file(&dir, "shapes.json", SHAPES)).unwrap();
        let input = write_file(
            &dir,
            "post.json",
            r#"{"id": 10, "title": "Hi", "author": {"id": 1, "name": "Ann"}}"#,
        );

        let command = Command::Normalize {
            entity: "Post".to_string(),
            input: Some(input),
            keep_undeclared: false,
            max_depth: None,
        };
        let output = execute(&registry, &command, OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["result"], serde_json::json!(10));
        assert_eq!(parsed["entities"]["Post"]["10"]["author"], serde_json::json!(1));
        assert_eq!(parsed["entities"]["User"]["1"]["name"], serde_json::json!("Ann"));
    }

    #[test]
    fn test_init_command_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load_registry(&write_file(&dir, "shapes.json", SHAPES)).unwrap();

        let command = Command::Init {
            entity: "User".to_string(),
            input: None,
        };
        let output = execute(&registry, &command, OutputFormat::Json).unwrap();

        assert_eq!(output, r#"{"id":null,"name":""}"#);
    }

    #[test]
    fn test_unknown_entity() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load_registry(&write_file(&dir, "shapes.json", SHAPES)).unwrap();

        let command = Command::Schema {
            entity: "Comment".to_string(),
            many: false,
        };
        let err = execute(&registry, &command, OutputFormat::Pretty).unwrap_err();

        assert!(matches!(
            err,
            CliError::Model(shapestore_core::Error::InvalidShapeReference { .. })
        ));
    }

    #[test]
    fn test_missing_shapes_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_registry(&dir.path().join("absent.json")).unwrap_err();

        assert!(matches!(err, CliError::Io { .. }));
    }

    #[test]
    fn test_invalid_input_json() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load_registry(&write_file(&dir, "shapes.json", SHAPES)).unwrap();
        let input = write_file(&dir, "bad.json", "{not json");

        let command = Command::Normalize {
            entity: "User".to_string(),
            input: Some(input),
            keep_undeclared: false,
            max_depth: None,
        };
        let err = execute(&registry, &command, OutputFormat::Json).unwrap_err();

        assert!(matches!(err, CliError::Json(_)));
    }
}
