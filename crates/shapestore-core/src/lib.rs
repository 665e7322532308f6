//! shapestore core - record shapes, field merging, and entity normalization.
//!
//! Shapes declare plain attributes and `belongs_to` relations. Records are
//! created from a shape by merging raw input over the declared defaults.
//! Nested record graphs are normalized into flat entity tables keyed by
//! entity name and identifier, ready to be installed into a keyed-table
//! state container.
//!
//! ```
//! use shapestore_core::{Fields, Model};
//! use serde_json::{json, Value};
//!
//! struct User;
//! struct Post;
//!
//! impl Model for User {
//!     const ENTITY: &'static str = "User";
//!
//!     fn fields() -> Fields {
//!         Fields::new().attr("id", Value::Null).attr("name", "")
//!     }
//! }
//!
//! impl Model for Post {
//!     const ENTITY: &'static str = "Post";
//!
//!     fn fields() -> Fields {
//!         Fields::new()
//!             .attr("id", Value::Null)
//!             .attr("title", "")
//!             .belongs_to::<User>("author", "author")
//!     }
//! }
//!
//! let data = Post::normalize(&json!({
//!     "id": 10,
//!     "title": "Hi",
//!     "author": {"id": 1, "name": "Ann"}
//! }))
//! .unwrap();
//!
//! assert_eq!(data.result, json!(10));
//! assert_eq!(data.get("Post", "10").unwrap()["author"], json!(1));
//! assert_eq!(data.get("User", "1").unwrap()["name"], json!("Ann"));
//! ```

pub mod attribute;
pub mod config;
pub mod error;
pub mod identity;
pub mod merge;
pub mod normalize;
pub mod record;
pub mod registry;
pub mod schema;
pub mod shape;

pub use attribute::{attr, belongs_to, Attr, BelongsTo, Field, Fields};
pub use config::NormalizeConfig;
pub use error::{Error, Result};
pub use identity::{Identifier, Identity, DEFAULT_IDENTITY_FIELD};
pub use merge::merge_fields;
pub use normalize::{normalize, normalize_with, Entities, EntityTable, NormalizedData, Normalizer};
pub use record::Record;
pub use registry::{FieldDecl, ShapeDecl, ShapeFile, ShapeRegistry};
pub use schema::{Arity, NodeId, Schema, SchemaBuilder, SchemaNode};
pub use shape::{Model, Shape, ShapeRef};
