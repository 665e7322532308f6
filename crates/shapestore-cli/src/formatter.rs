//! Output formatters for command results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use serde_json::{json, Value};
use shapestore_core::{Arity, EntityTable, NormalizedData, Record, Schema, ShapeRegistry};
use std::collections::BTreeSet;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON
    Pretty,
    /// Single-line JSON
    Json,
    /// ASCII tables
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format normalized entity tables and result.
    fn format_normalized(&self, data: &NormalizedData) -> String;

    /// Format a single record.
    fn format_record(&self, record: &Record) -> String;

    /// Format a derived schema.
    fn format_schema(&self, schema: &Schema) -> String;

    /// Format the declared shapes.
    fn format_shapes(&self, registry: &ShapeRegistry) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Pretty => Box::new(JsonFormatter { pretty: true }),
        OutputFormat::Json => Box::new(JsonFormatter { pretty: false }),
        OutputFormat::Table => Box::new(TableFormatter),
    }
}

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    fn render(&self, value: &Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|_| "null".to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_normalized(&self, data: &NormalizedData) -> String {
        let value = serde_json::to_value(data).unwrap_or(Value::Null);
        self.render(&value)
    }

    fn format_record(&self, record: &Record) -> String {
        self.render(&record.to_value())
    }

    fn format_schema(&self, schema: &Schema) -> String {
        let nodes: Vec<Value> = schema
            .nodes()
            .iter()
            .map(|node| {
                let relations: serde_json::Map<String, Value> = node
                    .relations()
                    .map(|(field, id)| (field.to_string(), json!(schema.node(id).entity())))
                    .collect();
                json!({
                    "entity": node.entity(),
                    "identity": node.identity().to_string(),
                    "relations": relations,
                })
            })
            .collect();

        self.render(&json!({
            "root": schema.root().entity(),
            "many": schema.arity() == Arity::Many,
            "nodes": nodes,
        }))
    }

    fn format_shapes(&self, registry: &ShapeRegistry) -> String {
        let shapes: Vec<Value> = registry
            .entity_names()
            .into_iter()
            .filter_map(|entity| registry.decl(entity))
            .map(|decl| serde_json::to_value(decl).unwrap_or(Value::Null))
            .collect();
        self.render(&Value::Array(shapes))
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_normalized(&self, data: &NormalizedData) -> String {
        let mut output = String::new();

        for (entity, records) in &data.entities {
            output.push_str(entity);
            output.push('\n');
            output.push_str(&format_entity_table(records));
            output.push_str("\n\n");
        }

        output.push_str(&format!("result: {}", data.result));
        output
    }

    fn format_record(&self, record: &Record) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Field", "Value"]);

        for (field, value) in record.values() {
            table.add_row(vec![Cell::new(field), Cell::new(format_value(value))]);
        }

        format!("{}\n{}", record.entity(), table)
    }

    fn format_schema(&self, schema: &Schema) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Entity", "Identity", "Relations"]);

        for node in schema.nodes() {
            let relations: Vec<String> = node
                .relations()
                .map(|(field, id)| format!("{} -> {}", field, schema.node(id).entity()))
                .collect();
            table.add_row(vec![
                Cell::new(node.entity()),
                Cell::new(node.identity()),
                Cell::new(relations.join("\n")),
            ]);
        }

        format!("{}\n{}", schema.to_string().trim_end(), table)
    }

    fn format_shapes(&self, registry: &ShapeRegistry) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Entity", "Identity", "Fields"]);

        for entity in registry.entity_names() {
            if let Some(decl) = registry.decl(entity) {
                let fields: Vec<&str> = decl.fields.keys().map(String::as_str).collect();
                table.add_row(vec![
                    Cell::new(entity),
                    Cell::new(&decl.identity),
                    Cell::new(fields.join(", ")),
                ]);
            }
        }

        table.to_string()
    }
}

/// Format one entity table with a column per field seen in any record.
fn format_entity_table(records: &EntityTable) -> String {
    let columns: BTreeSet<&str> = records
        .values()
        .flat_map(|record| record.keys().map(String::as_str))
        .collect();

    let mut table = Table::new();
    let mut headers: Vec<Cell> = vec![Cell::new("key")];
    headers.extend(columns.iter().map(Cell::new));
    table.set_header(headers);

    for (key, record) in records {
        let mut row: Vec<Cell> = vec![Cell::new(key)];
        row.extend(columns.iter().map(|column| {
            Cell::new(record.get(*column).map(format_value).unwrap_or_default())
        }));
        table.add_row(row);
    }

    table.to_string()
}

/// Render a JSON value for a table cell. Strings lose their quotes.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
