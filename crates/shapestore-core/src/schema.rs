//! Normalization schemas derived from shapes.
//!
//! A schema is a graph of entity nodes kept in an arena. Each node records the
//! shape it was built from and, for every relation field, the node of the
//! related shape. Shapes that reference each other resolve to the same node,
//! so building terminates on relation cycles.

use crate::attribute::Fields;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::shape::ShapeRef;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Whether a schema describes one record or a sequence of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// A single record.
    One,
    /// An array of records.
    Many,
}

impl Arity {
    /// `Many` if `many` is set, `One` otherwise.
    pub fn from_many(many: bool) -> Self {
        if many {
            Arity::Many
        } else {
            Arity::One
        }
    }
}

/// Index of a node within its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One entity in a schema.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    entity: String,
    shape: ShapeRef,
    identity: Identity,
    fields: Fields,
    relations: BTreeMap<String, NodeId>,
}

impl SchemaNode {
    /// Entity name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Shape the node was built from.
    pub fn shape(&self) -> &ShapeRef {
        &self.shape
    }

    /// Identity rule of the shape.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Fields of the shape at build time.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Node of the related shape for a relation field.
    pub fn relation(&self, field: &str) -> Option<NodeId> {
        self.relations.get(field).copied()
    }

    /// Relation fields and their nodes.
    pub fn relations(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.relations.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// A schema for one shape and arity.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<SchemaNode>,
    root: NodeId,
    arity: Arity,
}

impl Schema {
    /// Build the schema for a single record of `shape`.
    pub fn one(shape: &ShapeRef) -> Result<Self> {
        Self::build(shape, Arity::One)
    }

    /// Build the schema for an array of records of `shape`.
    pub fn many(shape: &ShapeRef) -> Result<Self> {
        Self::build(shape, Arity::Many)
    }

    /// Build the schema for `shape` with the given arity.
    pub fn build(shape: &ShapeRef, arity: Arity) -> Result<Self> {
        SchemaBuilder::new().build(shape, arity)
    }

    /// Arity of the root.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Check if the schema describes an array of records.
    pub fn is_many(&self) -> bool {
        self.arity == Arity::Many
    }

    /// Id of the root node.
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// The root node.
    pub fn root(&self) -> &SchemaNode {
        self.node(self.root)
    }

    /// Get a node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to a different schema and is out of range.
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Find the node of an entity.
    pub fn find(&self, entity: &str) -> Option<&SchemaNode> {
        self.nodes.iter().find(|n| n.entity == entity)
    }

    /// All nodes, in build order.
    pub fn nodes(&self) -> &[SchemaNode] {
        &self.nodes
    }

    /// Entity names reachable from the root, in build order.
    pub fn entity_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.entity.as_str()).collect()
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        depth: usize,
        expanded: &mut HashSet<NodeId>,
    ) -> fmt::Result {
        let node = self.node(id);
        for (field, child) in node.relations() {
            let target = self.node(child);
            let indent = "  ".repeat(depth + 1);
            if expanded.insert(child) {
                writeln!(f, "{indent}{field} -> {}", target.entity)?;
                self.fmt_node(f, child, depth + 1, expanded)?;
            } else {
                writeln!(f, "{indent}{field} -> {} (see above)", target.entity)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.root();
        match self.arity {
            Arity::One => writeln!(f, "{} [id: {}]", root.entity, root.identity)?,
            Arity::Many => writeln!(f, "[{}] [id: {}]", root.entity, root.identity)?,
        }
        let mut expanded = HashSet::from([self.root]);
        self.fmt_node(f, self.root, 0, &mut expanded)
    }
}

/// Builds a [`Schema`] by walking relation fields.
///
/// Each entity is visited once; a node is registered before its relations
/// are followed, so a relation back to an entity under construction resolves
/// to that node.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    nodes: Vec<SchemaNode>,
    seen: HashMap<String, NodeId>,
}

impl SchemaBuilder {
    /// Create a builder with no visited entities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the schema rooted at `shape`.
    pub fn build(mut self, shape: &ShapeRef, arity: Arity) -> Result<Schema> {
        let root = self.visit(shape)?;
        debug!(
            entity = shape.entity(),
            ?arity,
            nodes = self.nodes.len(),
            "built schema"
        );
        Ok(Schema {
            nodes: self.nodes,
            root,
            arity,
        })
    }

    fn visit(&mut self, shape: &ShapeRef) -> Result<NodeId> {
        let entity = shape.entity();
        if entity.is_empty() {
            return Err(Error::AmbiguousEntityName {
                entity: String::new(),
                reason: "entity name is empty".to_string(),
            });
        }

        let fields = shape.fields();

        if let Some(&id) = self.seen.get(entity) {
            // Same name, different structure: two shapes collide in one table.
            if self.nodes[id.0].fields.signature() != fields.signature() {
                return Err(Error::AmbiguousEntityName {
                    entity: entity.to_string(),
                    reason: "declared by shapes with different fields".to_string(),
                });
            }
            debug!(entity, "reusing schema node");
            return Ok(id);
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(SchemaNode {
            entity: entity.to_string(),
            shape: shape.clone(),
            identity: shape.identity(),
            fields: fields.clone(),
            relations: BTreeMap::new(),
        });
        self.seen.insert(entity.to_string(), id);
        debug!(entity, node = id.0, "created schema node");

        for (name, relation) in fields.relations() {
            let child = self.visit(&relation.target)?;
            self.nodes[id.0].relations.insert(name.to_string(), child);
        }

        Ok(id)
    }
}
