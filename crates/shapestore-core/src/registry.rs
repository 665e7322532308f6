//! Shapes declared as data.
//!
//! A [`ShapeRegistry`] is built once from a set of [`ShapeDecl`]s, typically
//! loaded from JSON. Relations name their target by entity; every target is
//! checked when the registry is built, so shapes handed out by the registry
//! never point at an unknown entity.

use crate::attribute::{self, Field, Fields};
use crate::error::{Error, Result};
use crate::identity::{Identity, DEFAULT_IDENTITY_FIELD};
use crate::shape::{Shape, ShapeRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

/// Declaration of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDecl {
    /// Plain attribute with a default value.
    Attr(Value),
    /// Relation to another declared entity.
    BelongsTo {
        /// Target entity name.
        target: String,
        /// Field holding the target's identifier.
        foreign_key: String,
    },
}

/// Declaration of one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDecl {
    /// Entity name.
    pub entity: String,
    /// Name of the identity field.
    #[serde(default = "default_identity")]
    pub identity: String,
    /// Declared fields.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDecl>,
}

fn default_identity() -> String {
    DEFAULT_IDENTITY_FIELD.to_string()
}

impl ShapeDecl {
    /// Create a declaration with no fields and the default identity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            identity: default_identity(),
            fields: BTreeMap::new(),
        }
    }

    /// Set the identity field.
    pub fn with_identity(mut self, field: impl Into<String>) -> Self {
        self.identity = field.into();
        self
    }

    /// Add a plain attribute.
    pub fn with_attr(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), FieldDecl::Attr(default.into()));
        self
    }

    /// Add a relation.
    pub fn with_belongs_to(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.fields.insert(
            name.into(),
            FieldDecl::BelongsTo {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        );
        self
    }
}

/// On-disk layout of a declaration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeFile {
    /// Declared shapes.
    pub shapes: Vec<ShapeDecl>,
}

type Decls = Arc<BTreeMap<String, ShapeDecl>>;

/// Name-based lookup of declared shapes.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    decls: Decls,
}

impl ShapeRegistry {
    /// Build a registry, validating entity names, relation targets and
    /// identity fields.
    pub fn from_decls(decls: impl IntoIterator<Item = ShapeDecl>) -> Result<Self> {
        let mut by_entity = BTreeMap::new();
        for decl in decls {
            if decl.entity.is_empty() {
                return Err(Error::AmbiguousEntityName {
                    entity: String::new(),
                    reason: "entity name is empty".to_string(),
                });
            }
            if by_entity.contains_key(&decl.entity) {
                return Err(Error::DuplicateShape(decl.entity));
            }
            by_entity.insert(decl.entity.clone(), decl);
        }

        for decl in by_entity.values() {
            for field in decl.fields.values() {
                if let FieldDecl::BelongsTo { target, .. } = field {
                    if !by_entity.contains_key(target) {
                        return Err(Error::InvalidShapeReference {
                            target: target.clone(),
                        });
                    }
                }
            }
            if !decl.fields.contains_key(&decl.identity) {
                return Err(Error::MissingIdentifier {
                    entity: decl.entity.clone(),
                    reason: format!("identity field `{}` is not declared", decl.identity),
                });
            }
        }

        debug!(shapes = by_entity.len(), "built shape registry");
        Ok(Self {
            decls: Arc::new(by_entity),
        })
    }

    /// Parse a [`ShapeFile`] from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ShapeFile = serde_json::from_str(json)?;
        Self::from_decls(file.shapes)
    }

    /// Parse a [`ShapeFile`] from a reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let file: ShapeFile = serde_json::from_reader(reader)?;
        Self::from_decls(file.shapes)
    }

    /// Check if an entity is registered.
    pub fn contains(&self, entity: &str) -> bool {
        self.decls.contains_key(entity)
    }

    /// Registered entity names, sorted.
    pub fn entity_names(&self) -> Vec<&str> {
        self.decls.keys().map(String::as_str).collect()
    }

    /// Get the declaration of an entity.
    pub fn decl(&self, entity: &str) -> Option<&ShapeDecl> {
        self.decls.get(entity)
    }

    /// Look up a shape by entity name.
    pub fn shape(&self, entity: &str) -> Result<ShapeRef> {
        if !self.contains(entity) {
            return Err(Error::InvalidShapeReference {
                target: entity.to_string(),
            });
        }
        Ok(ShapeRef::new(RegisteredShape {
            decls: Arc::clone(&self.decls),
            entity: entity.to_string(),
        }))
    }

    /// A relation to a registered entity.
    pub fn relation(&self, target: &str, foreign_key: impl Into<String>) -> Result<Field> {
        Ok(attribute::belongs_to(self.shape(target)?, foreign_key))
    }
}

/// A shape backed by a registry declaration.
struct RegisteredShape {
    decls: Decls,
    entity: String,
}

impl RegisteredShape {
    fn decl(&self) -> Option<&ShapeDecl> {
        self.decls.get(&self.entity)
    }
}

impl Shape for RegisteredShape {
    fn entity(&self) -> &str {
        &self.entity
    }

    fn fields(&self) -> Fields {
        let Some(decl) = self.decl() else {
            return Fields::new();
        };

        decl.fields
            .iter()
            .map(|(name, field)| {
                let field = match field {
                    FieldDecl::Attr(value) => attribute::attr(value.clone()),
                    FieldDecl::BelongsTo {
                        target,
                        foreign_key,
                    } => attribute::belongs_to(
                        ShapeRef::new(RegisteredShape {
                            decls: Arc::clone(&self.decls),
                            entity: target.clone(),
                        }),
                        foreign_key.clone(),
                    ),
                };
                (name.clone(), field)
            })
            .collect()
    }

    fn identity(&self) -> Identity {
        self.decl()
            .map(|d| Identity::field(d.identity.clone()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BLOG: &str = r#"{
        "shapes": [
            {
                "entity": "User",
                "fields": {
                    "id": {"attr": null},
                    "name": {"attr": ""}
                }
            },
            {
                "entity": "Post",
                "identity": "slug",
                "fields": {
                    "slug": {"attr": null},
                    "title": {"attr": "untitled"},
                    "author": {"belongs_to": {"target": "User", "foreign_key": "author"}}
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_declarations() {
        let registry = ShapeRegistry::from_json(BLOG).unwrap();

        assert_eq!(registry.entity_names(), ["Post", "User"]);
        assert_eq!(registry.decl("User").unwrap().identity, "id");
        assert_eq!(registry.decl("Post").unwrap().identity, "slug");
    }

    #[test]
    fn test_registered_fields() {
        let registry = ShapeRegistry::from_json(BLOG).unwrap();
        let post = registry.shape("Post").unwrap();
        let fields = post.fields();

        assert_eq!(fields.get("title"), Some(&attribute::attr("untitled")));
        let author = fields.get("author").unwrap().as_relation().unwrap();
        assert_eq!(author.target.entity(), "User");
        assert_eq!(author.foreign_key, "author");
        assert!(matches!(post.identity(), Identity::Field(ref f) if f == "slug"));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let decls = [ShapeDecl::new("Post")
            .with_attr("id", Value::Null)
            .with_belongs_to("author", "User", "author")];
        let err = ShapeRegistry::from_decls(decls).unwrap_err();

        assert!(matches!(err, Error::InvalidShapeReference { ref target } if target == "User"));
    }

    #[test]
    fn test_undeclared_identity_rejected() {
        let decls = [ShapeDecl::new("Post")
            .with_identity("slug")
            .with_attr("title", "")];
        let err = ShapeRegistry::from_decls(decls).unwrap_err();

        assert!(matches!(
            err,
            Error::MissingIdentifier { ref entity, ref reason }
                if entity == "Post" && reason.contains("slug")
        ));

        let defaulted = [ShapeDecl::new("Tag").with_attr("name", "")];
        assert!(matches!(
            ShapeRegistry::from_decls(defaulted),
            Err(Error::MissingIdentifier { ref entity, .. }) if entity == "Tag"
        ));
    }

    #[test]
    fn test_declared_identity_normalizes() {
        let decls = [ShapeDecl::new("Post")
            .with_identity("slug")
            .with_attr("slug", Value::Null)
            .with_attr("title", "")];
        let registry = ShapeRegistry::from_decls(decls).unwrap();

        let out = registry
            .shape("Post")
            .unwrap()
            .normalize(&json!({"slug": "x", "title": "t"}))
            .unwrap();

        assert_eq!(out.result, json!("x"));
        assert_eq!(out.get("Post", "x").unwrap()["title"], json!("t"));
    }

    #[test]
    fn test_lookup_and_relation() {
        let registry = ShapeRegistry::from_json(BLOG).unwrap();

        assert!(registry.relation("User", "owner").is_ok());
        assert!(matches!(
            registry.relation("Account", "owner"),
            Err(Error::InvalidShapeReference { .. })
        ));
        assert!(registry.shape("Account").is_err());
    }

    #[test]
    fn test_duplicate_and_empty_entities() {
        let dup = [ShapeDecl::new("User"), ShapeDecl::new("User")];
        assert!(matches!(
            ShapeRegistry::from_decls(dup),
            Err(Error::DuplicateShape(ref e)) if e == "User"
        ));

        let empty = [ShapeDecl::new("")];
        assert!(matches!(
            ShapeRegistry::from_decls(empty),
            Err(Error::AmbiguousEntityName { .. })
        ));
    }

    #[test]
    fn test_self_referencing_declaration() {
        let decls = [ShapeDecl::new("Node")
            .with_attr("id", Value::Null)
            .with_belongs_to("parent", "Node", "parent_id")];
        let registry = ShapeRegistry::from_decls(decls).unwrap();

        let out = registry
            .shape("Node")
            .unwrap()
            .normalize(&json!({"id": 2, "parent": {"id": 1, "parent": null}}))
            .unwrap();

        assert_eq!(out.result, json!(2));
        assert_eq!(out.get("Node", "2").unwrap()["parent"], json!(1));
        assert_eq!(out.get("Node", "1").unwrap()["parent"], Value::Null);
    }
}
