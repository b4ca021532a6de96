//! Compiled-type metadata and conversions between Rust values and [`Value`].
//!
//! [`CompiledType`] is what the compiler sees for a type that already exists as Rust code: names, property types
//! and access flags, but no method bodies. It is produced by `#[derive(Reflect)]` or read from JSON.

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::value::{Record, Value};

pub use mapforge_core::naming::qualify;

/// Metadata for a compiled type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledType {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub properties: Vec<CompiledProperty>,
    #[serde(default)]
    pub methods: Vec<CompiledMethod>,
}

impl CompiledType {
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledProperty {
    pub name: String,
    /// Written type, e.g. `str`, `List[int]`, `app::entities::Address`.
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default = "yes")]
    pub readable: bool,
    #[serde(default = "yes")]
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledMethod {
    pub name: String,
    #[serde(default, rename = "returns")]
    pub return_type: Option<String>,
    #[serde(default)]
    pub parameters: Vec<CompiledParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub default: Option<String>,
}

fn yes() -> bool {
    true
}

/// Namespace of a Rust module path: the crate name is dropped, the rest is kept.
pub fn namespace_of(module_path: &str) -> &str {
    module_path.split_once("::").map(|(_, rest)| rest).unwrap_or("")
}

/// A Rust type that can travel as a [`Value`].
pub trait FieldValue: Sized {
    /// The mapping-language spelling of this type.
    fn type_name() -> String;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ConvertError>;
}

/// A Rust struct that mappers can read from and build.
pub trait Reflect: FieldValue {
    fn compiled_type() -> CompiledType;

    fn to_record(&self) -> Record;

    fn from_record(record: Record) -> Result<Self, ConvertError>;
}

/// Take a named field out of a record and convert it (used by derived impls).
pub fn take_field<T: FieldValue>(record: &mut Record, field: &str) -> Result<T, ConvertError> {
    let index = record
        .fields
        .iter()
        .position(|(n, _)| n == field)
        .ok_or_else(|| ConvertError::MissingField {
            type_name: record.type_name.clone(),
            field: field.to_string(),
        })?;
    let (_, value) = record.fields.swap_remove(index);
    T::from_value(value)
}

fn mismatch(expected: String, found: &Value) -> ConvertError {
    ConvertError::Mismatch {
        expected,
        found: found.kind(),
    }
}

impl FieldValue for String {
    fn type_name() -> String {
        "str".to_string()
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch(Self::type_name(), &other)),
        }
    }
}

impl FieldValue for i64 {
    fn type_name() -> String {
        "int".to_string()
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(mismatch(Self::type_name(), &other)),
        }
    }
}

impl FieldValue for i32 {
    fn type_name() -> String {
        "int".to_string()
    }

    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Int(i) => i32::try_from(i).map_err(|_| ConvertError::Mismatch {
                expected: "int (32-bit)".to_string(),
                found: "int",
            }),
            other => Err(mismatch(Self::type_name(), &other)),
        }
    }
}

impl FieldValue for f64 {
    fn type_name() -> String {
        "float".to_string()
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch(Self::type_name(), &other)),
        }
    }
}

impl FieldValue for bool {
    fn type_name() -> String {
        "bool".to_string()
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(Self::type_name(), &other)),
        }
    }
}

impl FieldValue for Value {
    fn type_name() -> String {
        mapforge_core::lang::conventions::ANY_TYPE_NAME.to_string()
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        Ok(value)
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn type_name() -> String {
        format!("Option[{}]", T::type_name())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn type_name() -> String {
        format!("List[{}]", T::type_name())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch(Self::type_name(), &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reflect;

    #[derive(Debug, Clone, PartialEq, Reflect)]
    #[reflect(namespace = "app::entities")]
    struct User {
        name: String,
        username: String,
        #[reflect(readonly)]
        id: i64,
        nickname: Option<String>,
    }

    fn user() -> User {
        User {
            name: "Foo".to_string(),
            username: "x_foo_x".to_string(),
            id: 7,
            nickname: None,
        }
    }

    #[test]
    fn test_derived_metadata() {
        let ty = User::compiled_type();
        assert_eq!(ty.qualified_name(), "app::entities::User");
        let props: Vec<_> = ty.properties.iter().map(|p| (p.name.as_str(), p.ty.as_str())).collect();
        assert_eq!(
            props,
            vec![("name", "str"), ("username", "str"), ("id", "int"), ("nickname", "Option[str]")]
        );
        assert!(!ty.properties[2].writable);
        assert!(ty.properties[2].readable);
        assert_eq!(User::type_name(), "app::entities::User");
    }

    #[test]
    fn test_record_conversion_both_ways() {
        let record = user().to_record();
        assert_eq!(record.type_name, "app::entities::User");
        assert_eq!(record.get("nickname"), Some(&Value::Null));
        let back = User::from_record(record).unwrap();
        assert_eq!(back, user());
    }

    #[test]
    fn test_missing_field_reported() {
        let record = Record::new("User").with("name", "Foo");
        let err = User::from_record(record).unwrap_err();
        assert_eq!(
            err,
            ConvertError::MissingField {
                type_name: "User".to_string(),
                field: "username".to_string()
            }
        );
    }

    #[test]
    fn test_namespace_of_module_path() {
        assert_eq!(namespace_of("my_app::entities::users"), "entities::users");
        assert_eq!(namespace_of("my_app"), "");
    }

    #[test]
    fn test_json_metadata_defaults() {
        let json = r#"{"name": "User", "namespace": "app", "properties": [{"name": "id", "type": "int", "writable": false}]}"#;
        let ty: CompiledType = serde_json::from_str(json).unwrap();
        assert!(ty.properties[0].readable);
        assert!(!ty.properties[0].writable);
        assert!(ty.methods.is_empty());
    }
}
