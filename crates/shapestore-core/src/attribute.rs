//! Field declarations for shapes.
//!
//! A shape declares its fields as a [`Fields`] map. Each entry is either a
//! plain attribute carrying a default value, or a `belongs_to` relation that
//! points at another shape through a foreign key.

use crate::shape::{Model, ShapeRef};
use serde_json::Value;
use std::collections::btree_map::{self, BTreeMap};

/// A plain attribute with a default value.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    /// Value assigned when the raw input does not supply one.
    pub value: Value,
}

/// A to-one relation to another shape.
#[derive(Debug, Clone, PartialEq)]
pub struct BelongsTo {
    /// Shape the relation points at.
    pub target: ShapeRef,
    /// Field holding the referenced record's identifier.
    pub foreign_key: String,
}

/// A field descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Plain attribute.
    Attr(Attr),
    /// Relation to another shape.
    BelongsTo(BelongsTo),
}

impl Field {
    /// Check if this is a plain attribute.
    pub fn is_attr(&self) -> bool {
        matches!(self, Field::Attr(_))
    }

    /// Check if this is a relation.
    pub fn is_relation(&self) -> bool {
        matches!(self, Field::BelongsTo(_))
    }

    /// Get the attribute, if this is one.
    pub fn as_attr(&self) -> Option<&Attr> {
        match self {
            Field::Attr(attr) => Some(attr),
            Field::BelongsTo(_) => None,
        }
    }

    /// Get the relation, if this is one.
    pub fn as_relation(&self) -> Option<&BelongsTo> {
        match self {
            Field::Attr(_) => None,
            Field::BelongsTo(relation) => Some(relation),
        }
    }

    /// Structural description used to tell shapes apart. Default values are
    /// not part of the structure.
    fn signature(&self) -> String {
        match self {
            Field::Attr(_) => "attr".to_string(),
            Field::BelongsTo(relation) => format!(
                "belongs_to:{}:{}",
                relation.target.entity(),
                relation.foreign_key
            ),
        }
    }
}

/// Create a plain attribute with the given default value.
///
/// The value is stored verbatim.
pub fn attr(value: impl Into<Value>) -> Field {
    Field::Attr(Attr {
        value: value.into(),
    })
}

/// Create a `belongs_to` relation to `target` carried by `foreign_key`.
pub fn belongs_to(target: ShapeRef, foreign_key: impl Into<String>) -> Field {
    Field::BelongsTo(BelongsTo {
        target,
        foreign_key: foreign_key.into(),
    })
}

/// The field map of a shape, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    fields: BTreeMap<String, Field>,
}

impl Fields {
    /// Create an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    pub fn with(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Add a plain attribute.
    pub fn attr(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(name, attr(value))
    }

    /// Add a relation to the model `M`.
    pub fn belongs_to<M: Model>(
        self,
        name: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.with(name, belongs_to(ShapeRef::of::<M>(), foreign_key))
    }

    /// Insert a field, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, field: Field) -> Option<Field> {
        self.fields.insert(name.into(), field)
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    /// Check if a field is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over all fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Field> {
        self.fields.iter()
    }

    /// Names of all declared fields.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate over plain attributes.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attr)> {
        self.fields
            .iter()
            .filter_map(|(name, field)| field.as_attr().map(|a| (name.as_str(), a)))
    }

    /// Iterate over relations.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &BelongsTo)> {
        self.fields
            .iter()
            .filter_map(|(name, field)| field.as_relation().map(|r| (name.as_str(), r)))
    }

    /// Field names paired with their structural kind.
    pub(crate) fn signature(&self) -> Vec<(&str, String)> {
        self.fields
            .iter()
            .map(|(name, field)| (name.as_str(), field.signature()))
            .collect()
    }
}

impl FromIterator<(String, Field)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Field)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, Field);
    type IntoIter = btree_map::IntoIter<String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Field);
    type IntoIter = btree_map::Iter<'a, String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
