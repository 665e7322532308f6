//! Flattening nested records into entity tables.
//!
//! Normalization walks the input against a [`Schema`]. Every object reached
//! through the root or a relation field becomes a flat record in the table of
//! its entity, and the nested object is replaced by its identifier. Records
//! that share an entity and identifier are merged, later fields winning.

use crate::attribute::Field;
use crate::config::NormalizeConfig;
use crate::error::{kind_of, Error, Result};
use crate::schema::{NodeId, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::btree_map::{BTreeMap, Entry};
use tracing::{instrument, trace};

/// Flat records of one entity, keyed by identifier.
pub type EntityTable = BTreeMap<String, Map<String, Value>>;

/// Entity tables keyed by entity name.
pub type Entities = BTreeMap<String, EntityTable>;

/// Output of normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedData {
    /// Flat records by entity name, then identifier.
    pub entities: Entities,
    /// Identifier of the root record, identifiers of the root records, or
    /// the input itself when it was not a record.
    pub result: Value,
}

impl NormalizedData {
    /// Get a flat record.
    pub fn get(&self, entity: &str, key: &str) -> Option<&Map<String, Value>> {
        self.entities.get(entity).and_then(|table| table.get(key))
    }

    /// Total number of flat records across all tables.
    pub fn record_count(&self) -> usize {
        self.entities.values().map(BTreeMap::len).sum()
    }
}

/// Normalize `data` against `schema` with the default configuration.
pub fn normalize(data: &Value, schema: &Schema) -> Result<NormalizedData> {
    normalize_with(data, schema, &NormalizeConfig::default())
}

/// Normalize `data` against `schema`.
pub fn normalize_with(
    data: &Value,
    schema: &Schema,
    config: &NormalizeConfig,
) -> Result<NormalizedData> {
    Normalizer::new(schema, config).normalize(data)
}

/// Single-use normalization pass that accumulates entity tables.
pub struct Normalizer<'a> {
    schema: &'a Schema,
    config: &'a NormalizeConfig,
    entities: Entities,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer for `schema`.
    pub fn new(schema: &'a Schema, config: &'a NormalizeConfig) -> Self {
        Self {
            schema,
            config,
            entities: Entities::new(),
        }
    }

    /// Normalize `data`, consuming the normalizer.
    #[instrument(skip_all, fields(entity = self.schema.root().entity(), arity = ?self.schema.arity()))]
    pub fn normalize(mut self, data: &Value) -> Result<NormalizedData> {
        let root = self.schema.root_id();

        let result = if self.schema.is_many() {
            let Value::Array(items) = data else {
                return Err(Error::SchemaArityMismatch {
                    entity: self.schema.root().entity().to_string(),
                    expected: "array",
                    actual: kind_of(data),
                });
            };
            let ids = items
                .iter()
                .map(|item| self.visit(root, item, 0))
                .collect::<Result<Vec<_>>>()?;
            Value::Array(ids)
        } else {
            self.visit(root, data, 0)?
        };

        Ok(NormalizedData {
            entities: self.entities,
            result,
        })
    }

    fn visit(&mut self, id: NodeId, data: &Value, depth: usize) -> Result<Value> {
        let schema = self.schema;
        let node = schema.node(id);

        let input = match data {
            Value::Object(map) => map,
            Value::Array(_) => {
                return Err(Error::SchemaArityMismatch {
                    entity: node.entity().to_string(),
                    expected: "object",
                    actual: "array",
                });
            }
            scalar => return Ok(scalar.clone()),
        };

        if let Some(limit) = self.config.max_depth {
            if depth > limit {
                return Err(Error::DepthExceeded {
                    entity: node.entity().to_string(),
                    limit,
                });
            }
        }

        let mut flat = Map::new();
        for (key, value) in input {
            match node.fields().get(key) {
                Some(Field::Attr(_)) => {
                    flat.insert(key.clone(), value.clone());
                }
                Some(Field::BelongsTo(_)) => {
                    let value = match node.relation(key) {
                        Some(child) if !value.is_null() => self.visit(child, value, depth + 1)?,
                        _ => value.clone(),
                    };
                    flat.insert(key.clone(), value);
                }
                None if self.config.keep_undeclared => {
                    flat.insert(key.clone(), value.clone());
                }
                None => {}
            }
        }

        let identifier = node.identity().extract(node.entity(), &flat)?;
        self.insert(node.entity(), identifier.key, flat);

        Ok(identifier.value)
    }

    fn insert(&mut self, entity: &str, key: String, record: Map<String, Value>) {
        let table = self.entities.entry(entity.to_string()).or_default();
        match table.entry(key) {
            Entry::Vacant(slot) => {
                trace!(entity, key = slot.key().as_str(), "extracted entity");
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                trace!(entity, key = slot.key().as_str(), "merging duplicate entity");
                slot.get_mut().extend(record);
            }
        }
    }
}
