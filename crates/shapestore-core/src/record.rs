//! Materialized records.

use crate::attribute::Field;
use crate::error::{kind_of, Error, Result};
use crate::merge::merge_fields;
use crate::shape::ShapeRef;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// One record of a shape.
///
/// Holds values only for fields the shape declares. Initialization assigns
/// every plain attribute; relation fields stay unset until written with
/// [`Record::set`].
#[derive(Debug, Clone)]
pub struct Record {
    shape: ShapeRef,
    values: Map<String, Value>,
}

impl Record {
    /// Create a record of `shape` from optional raw data.
    pub fn new(shape: ShapeRef, data: Option<&Map<String, Value>>) -> Self {
        let mut record = Self {
            shape,
            values: Map::new(),
        };
        record.initialize(data);
        record
    }

    /// Create a record from a JSON value, which must be an object or null.
    pub fn from_value(shape: ShapeRef, data: &Value) -> Result<Self> {
        match data {
            Value::Null => Ok(Self::new(shape, None)),
            Value::Object(map) => Ok(Self::new(shape, Some(map))),
            other => Err(Error::InvalidData {
                entity: shape.entity().to_string(),
                expected: "object or null",
                actual: kind_of(other),
            }),
        }
    }

    /// Assign every attribute from the merge of the declared defaults and
    /// `data`. Values previously written to relation fields are kept.
    pub fn initialize(&mut self, data: Option<&Map<String, Value>>) {
        let fields = merge_fields(&self.shape.fields(), data);

        for (name, field) in fields {
            if let Field::Attr(attr) = field {
                self.values.insert(name, attr.value);
            }
        }
    }

    /// Shape of this record.
    pub fn shape(&self) -> &ShapeRef {
        &self.shape
    }

    /// Entity name of this record's shape.
    pub fn entity(&self) -> &str {
        self.shape.entity()
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Write a field value, returning the previous one.
    ///
    /// Fails if the shape does not declare `field`.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        if !self.shape.fields().contains(field) {
            return Err(Error::UnknownField {
                entity: self.entity().to_string(),
                field: field.to_string(),
            });
        }
        Ok(self.values.insert(field.to_string(), value.into()))
    }

    /// All assigned values.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// The record as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Convert the record into a typed struct.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Fields;
    use crate::shape::Model;
    use serde::Deserialize;
    use serde_json::json;

    struct User;
    struct Post;

    impl Model for User {
        const ENTITY: &'static str = "User";

        fn fields() -> Fields {
            Fields::new().attr("id", Value::Null).attr("name", "")
        }
    }

    impl Model for Post {
        const ENTITY: &'static str = "Post";

        fn fields() -> Fields {
            Fields::new()
                .attr("id", Value::Null)
                .attr("title", "")
                .belongs_to::<User>("author", "author")
        }
    }

    #[test]
    fn test_defaults_without_data() {
        let user = User::new(None);

        assert_eq!(user.get("id"), Some(&Value::Null));
        assert_eq!(user.get("name"), Some(&json!("")));
        assert_eq!(user.values().len(), 2);
    }

    #[test]
    fn test_data_overrides_and_extras_dropped() {
        let data = json!({"name": "Bob", "extra": "ignored"});
        let user = User::new(data.as_object());

        assert_eq!(user.get("id"), Some(&Value::Null));
        assert_eq!(user.get("name"), Some(&json!("Bob")));
        assert!(user.get("extra").is_none());
    }

    #[test]
    fn test_relations_not_assigned() {
        let data = json!({"id": 10, "author": 1});
        let post = Post::new(data.as_object());

        assert_eq!(post.get("id"), Some(&json!(10)));
        assert!(post.get("author").is_none());
    }

    #[test]
    fn test_set_declared_and_unknown() {
        let mut post = Post::new(None);

        assert_eq!(post.set("author", 1).unwrap(), None);
        assert_eq!(post.get("author"), Some(&json!(1)));

        let err = post.set("body", "text").unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "body"));
    }

    #[test]
    fn test_initialize_in_place() {
        let mut post = Post::new(json!({"title": "first"}).as_object());
        post.set("author", 7).unwrap();

        post.initialize(json!({"title": "second"}).as_object());

        assert_eq!(post.get("title"), Some(&json!("second")));
        assert_eq!(post.get("author"), Some(&json!(7)));
    }

    #[test]
    fn test_from_value() {
        let user = Record::from_value(User::shape(), &json!({"id": 2})).unwrap();
        assert_eq!(user.get("id"), Some(&json!(2)));

        let empty = Record::from_value(User::shape(), &Value::Null).unwrap();
        assert_eq!(empty.get("name"), Some(&json!("")));

        let err = Record::from_value(User::shape(), &json!([1])).unwrap_err();
        assert!(matches!(err, Error::InvalidData { actual: "array", .. }));

        let err = Record::from_value(User::shape(), &json!("Ann")).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidData { expected: "object or null", actual: "string", .. }
        ));
    }

    #[test]
    fn test_typed_conversion() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct UserRow {
            id: Option<i64>,
            name: String,
        }

        let user = User::new(json!({"id": 4, "name": "Ann"}).as_object());
        let row: UserRow = user.deserialize_into().unwrap();

        assert_eq!(
            row,
            UserRow {
                id: Some(4),
                name: "Ann".to_string()
            }
        );
        assert_eq!(serde_json::to_value(&user).unwrap(), json!({"id": 4, "name": "Ann"}));
    }
}
