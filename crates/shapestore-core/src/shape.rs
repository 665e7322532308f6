//! Record shapes.
//!
//! A shape names an entity, declares its fields, and says how its records are
//! identified. Shapes written in Rust implement [`Model`]; shapes declared as
//! data live in a [`ShapeRegistry`](crate::ShapeRegistry). Both are handled
//! uniformly through [`ShapeRef`].

use crate::attribute::{self, Field, Fields};
use crate::config::NormalizeConfig;
use crate::error::Result;
use crate::identity::Identity;
use crate::normalize::{self, NormalizedData};
use crate::record::Record;
use crate::schema::{Arity, Schema};
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Object-safe description of a record shape.
pub trait Shape: Send + Sync + 'static {
    /// Entity name, used as the key of the shape's entity table.
    fn entity(&self) -> &str;

    /// Declared fields. Must not depend on any instance state.
    fn fields(&self) -> Fields;

    /// How records of this shape are identified.
    fn identity(&self) -> Identity {
        Identity::default()
    }
}

/// A shape declared in Rust.
///
/// ```
/// use shapestore_core::{Fields, Model};
/// use serde_json::{json, Value};
///
/// struct User;
///
/// impl Model for User {
///     const ENTITY: &'static str = "User";
///
///     fn fields() -> Fields {
///         Fields::new().attr("id", Value::Null).attr("name", "")
///     }
/// }
///
/// let data = User::normalize(&json!({"id": 1, "name": "Ann"})).unwrap();
/// assert_eq!(data.result, json!(1));
/// ```
pub trait Model: Sized + 'static {
    /// Entity name.
    const ENTITY: &'static str;

    /// Declared fields.
    fn fields() -> Fields;

    /// How records are identified. Defaults to the `id` field.
    fn identity() -> Identity {
        Identity::default()
    }

    /// A plain attribute with the given default.
    fn attr(value: impl Into<Value>) -> Field {
        attribute::attr(value)
    }

    /// A relation to `M` carried by `foreign_key`.
    fn belongs_to<M: Model>(foreign_key: impl Into<String>) -> Field {
        attribute::belongs_to(ShapeRef::of::<M>(), foreign_key)
    }

    /// Handle to this shape.
    fn shape() -> ShapeRef {
        ShapeRef::of::<Self>()
    }

    /// Schema for one record, or for a sequence of records if `many`.
    fn schema(many: bool) -> Result<Schema> {
        Self::shape().schema(many)
    }

    /// Normalize a record or an array of records.
    fn normalize(data: &Value) -> Result<NormalizedData> {
        Self::shape().normalize(data)
    }

    /// Create a record from optional raw data.
    fn new(data: Option<&Map<String, Value>>) -> Record {
        Record::new(Self::shape(), data)
    }
}

/// Adapter exposing a [`Model`] as a [`Shape`].
struct ModelShape<M>(PhantomData<fn() -> M>);

impl<M: Model> Shape for ModelShape<M> {
    fn entity(&self) -> &str {
        M::ENTITY
    }

    fn fields(&self) -> Fields {
        M::fields()
    }

    fn identity(&self) -> Identity {
        M::identity()
    }
}

/// Shared handle to a shape.
///
/// Two handles compare equal when they name the same entity.
#[derive(Clone)]
pub struct ShapeRef(Arc<dyn Shape>);

impl ShapeRef {
    /// Wrap a shape.
    pub fn new(shape: impl Shape) -> Self {
        Self(Arc::new(shape))
    }

    /// Handle to the model `M`.
    pub fn of<M: Model>() -> Self {
        Self::new(ModelShape::<M>(PhantomData))
    }

    /// Entity name.
    pub fn entity(&self) -> &str {
        self.0.entity()
    }

    /// Declared fields.
    pub fn fields(&self) -> Fields {
        self.0.fields()
    }

    /// Identity rule.
    pub fn identity(&self) -> Identity {
        self.0.identity()
    }

    /// Build the schema for one record, or for a sequence if `many`.
    pub fn schema(&self, many: bool) -> Result<Schema> {
        Schema::build(self, Arity::from_many(many))
    }

    /// Normalize with the default configuration.
    pub fn normalize(&self, data: &Value) -> Result<NormalizedData> {
        self.normalize_with(data, &NormalizeConfig::default())
    }

    /// Normalize a record or an array of records. The schema arity follows
    /// whether `data` is an array.
    pub fn normalize_with(&self, data: &Value, config: &NormalizeConfig) -> Result<NormalizedData> {
        let schema = self.schema(data.is_array())?;
        normalize::normalize_with(data, &schema, config)
    }

    /// Create a record from optional raw data.
    pub fn record(&self, data: Option<&Map<String, Value>>) -> Record {
        Record::new(self.clone(), data)
    }
}

impl PartialEq for ShapeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.entity() == other.entity()
    }
}

impl fmt::Debug for ShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShapeRef").field(&self.entity()).finish()
    }
}
