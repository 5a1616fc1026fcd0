//! Schema declarations for document trees.
//!
//! A schema type is a zero-sized marker struct carrying a static
//! [`NodeSpec`]: its JSON name and its shape (parameter, object, or list).
//! Schemas are declared once with the [`parameter!`](crate::parameter),
//! [`object!`](crate::object) and [`list!`](crate::list) macros; the
//! [`Document`](super::Document) arena and the serializer are driven
//! entirely by these specs.

use std::fmt;

use serde_json::Value;

/// The scalar types a parameter leaf can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Float,
    Bool,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::String => "string",
            ScalarType::Integer => "integer",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// A single typed value stored in a parameter leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::String(_) => ScalarType::String,
            Scalar::Integer(_) => ScalarType::Integer,
            Scalar::Float(_) => ScalarType::Float,
            Scalar::Bool(_) => ScalarType::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Scalar::String(s) = self { Some(s) } else { None }
    }

    pub fn as_i64(&self) -> Option<i64> {
        if let Scalar::Integer(n) = self { Some(*n) } else { None }
    }

    pub fn as_f64(&self) -> Option<f64> {
        if let Scalar::Float(n) = self { Some(*n) } else { None }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Scalar::Bool(b) = self { Some(*b) } else { None }
    }

    pub(crate) fn to_json(&self) -> Value {
        match self {
            Scalar::String(s) => Value::from(s.clone()),
            Scalar::Integer(n) => Value::from(*n),
            Scalar::Float(n) => Value::from(*n),
            Scalar::Bool(b) => Value::from(*b),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Integer(n) => write!(f, "{n}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Integer(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Static description of one node kind: its JSON name and shape.
///
/// Specs are compared by `name`, never by address: the same schema constant
/// may be promoted to more than one static.
#[derive(Debug)]
pub struct NodeSpec {
    /// The JSON key this node serializes under when it is an object member.
    pub name: &'static str,
    pub kind: Kind,
}

/// The shape of a node: leaf, closed field set, or ordered item sequence.
#[derive(Debug)]
pub enum Kind {
    Parameter {
        ty: ScalarType,
        /// Value stored into the leaf the moment it is materialized.
        /// Used for fixed discriminators such as `"type": "text"`.
        preset: Option<&'static str>,
    },
    Object {
        /// Declared members, in serialization order.
        fields: &'static [FieldSpec],
    },
    List {
        /// The closed set of node kinds this list accepts.
        items: &'static [&'static NodeSpec],
        /// Whether serializing an empty list is an error.
        non_empty: bool,
    },
}

impl Kind {
    pub(crate) fn word(&self) -> &'static str {
        match self {
            Kind::Parameter { .. } => "parameter",
            Kind::Object { .. } => "object",
            Kind::List { .. } => "list",
        }
    }
}

/// One declared member of an object schema.
#[derive(Debug)]
pub struct FieldSpec {
    pub spec: &'static NodeSpec,
    pub required: bool,
}

impl FieldSpec {
    pub fn name(&self) -> &'static str {
        self.spec.name
    }
}

/// Implemented by every schema marker type.
pub trait Schema: 'static {
    const SPEC: &'static NodeSpec;
}

/// A schema whose nodes hold a single typed value.
pub trait ParameterSchema: Schema {
    type Value: ParameterValue;
}

/// A schema whose nodes hold a closed set of named members.
pub trait ObjectSchema: Schema {}

/// A schema whose nodes hold an ordered sequence of items.
pub trait ListSchema: Schema {}

/// Marks `Self` as a declared member of object schema `P`.
pub trait Member<P: ObjectSchema>: Schema {}

/// Marks `Self` as an allowed item of list schema `L`.
pub trait Item<L: ListSchema>: Schema {}

/// A Rust type usable as a parameter value: it knows its declared scalar
/// type and converts into a [`Scalar`].
pub trait ParameterValue: Into<Scalar> {
    const TYPE: ScalarType;
}

impl ParameterValue for String {
    const TYPE: ScalarType = ScalarType::String;
}

impl ParameterValue for i64 {
    const TYPE: ScalarType = ScalarType::Integer;
}

impl ParameterValue for u32 {
    const TYPE: ScalarType = ScalarType::Integer;
}

impl ParameterValue for f64 {
    const TYPE: ScalarType = ScalarType::Float;
}

impl ParameterValue for bool {
    const TYPE: ScalarType = ScalarType::Bool;
}

/// Declares a parameter leaf schema: a marker type pairing a JSON key with
/// a value type, optionally preset with a fixed string.
///
/// ```
/// use claude_wire::parameter;
///
/// parameter!(pub Title = "title": String);
/// parameter!(pub BlockType = "type": String, preset = "text");
/// ```
#[macro_export]
macro_rules! parameter {
    ($(#[$meta:meta])* $vis:vis $name:ident = $key:literal : $value:ty $(, preset = $preset:literal)? $(,)?) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        $vis struct $name;

        impl $crate::document::Schema for $name {
            const SPEC: &'static $crate::document::NodeSpec = &$crate::document::NodeSpec {
                name: $key,
                kind: $crate::document::Kind::Parameter {
                    ty: <$value as $crate::document::ParameterValue>::TYPE,
                    preset: $crate::parameter!(@preset $($preset)?),
                },
            };
        }

        impl $crate::document::ParameterSchema for $name {
            type Value = $value;
        }
    };
    (@preset) => { None };
    (@preset $preset:literal) => { Some($preset) };
}

/// Declares an object schema: a closed, ordered set of member fields, each
/// `required` or `optional`. Serialization emits the members in the order
/// they are declared here.
///
/// ```
/// use claude_wire::{object, parameter};
///
/// parameter!(pub Name = "name": String);
/// parameter!(pub Age = "age": i64);
/// object!(pub Person = "person" {
///     required Name,
///     optional Age,
/// });
/// ```
#[macro_export]
macro_rules! object {
    ($(#[$meta:meta])* $vis:vis $name:ident = $key:literal { $($req:ident $field:ty,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        $vis struct $name;

        impl $crate::document::Schema for $name {
            const SPEC: &'static $crate::document::NodeSpec = &$crate::document::NodeSpec {
                name: $key,
                kind: $crate::document::Kind::Object {
                    fields: &[$(
                        $crate::document::FieldSpec {
                            spec: <$field as $crate::document::Schema>::SPEC,
                            required: $crate::object!(@required $req),
                        }
                    ),+],
                },
            };
        }

        impl $crate::document::ObjectSchema for $name {}

        $(impl $crate::document::Member<$name> for $field {})+
    };
    (@required required) => { true };
    (@required optional) => { false };
}

/// Declares a list schema: an appendable sequence whose items are limited
/// to the declared allow-set, written as a `|`-separated union. A trailing
/// `non_empty` makes serializing an empty list an error.
///
/// ```
/// use claude_wire::{list, object, parameter};
///
/// parameter!(pub Name = "name": String);
/// parameter!(pub Url = "url": String);
/// object!(pub Person = "person" { required Name, });
/// object!(pub Link = "link" { required Url, });
/// list!(pub Contacts = "contacts": Person | Link, non_empty);
/// ```
#[macro_export]
macro_rules! list {
    ($(#[$meta:meta])* $vis:vis $name:ident = $key:literal : $($item:ty)|+ $(, $non_empty:ident)? $(,)?) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        $vis struct $name;

        impl $crate::document::Schema for $name {
            const SPEC: &'static $crate::document::NodeSpec = &$crate::document::NodeSpec {
                name: $key,
                kind: $crate::document::Kind::List {
                    items: &[$(<$item as $crate::document::Schema>::SPEC),+],
                    non_empty: $crate::list!(@non_empty $($non_empty)?),
                },
            };
        }

        impl $crate::document::ListSchema for $name {}

        $(impl $crate::document::Item<$name> for $item {})+
    };
    (@non_empty) => { false };
    (@non_empty non_empty) => { true };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_types_match_values() {
        assert_eq!(Scalar::from("hi").scalar_type(), ScalarType::String);
        assert_eq!(Scalar::from(7_i64).scalar_type(), ScalarType::Integer);
        assert_eq!(Scalar::from(7_u32).scalar_type(), ScalarType::Integer);
        assert_eq!(Scalar::from(0.5).scalar_type(), ScalarType::Float);
        assert_eq!(Scalar::from(true).scalar_type(), ScalarType::Bool);
    }

    #[test]
    fn scalar_accessors() {
        assert_eq!(Scalar::from("hi").as_str(), Some("hi"));
        assert_eq!(Scalar::from("hi").as_i64(), None);
        assert_eq!(Scalar::from(7_u32).as_i64(), Some(7));
        assert_eq!(Scalar::from(0.5).as_f64(), Some(0.5));
        assert_eq!(Scalar::from(false).as_bool(), Some(false));
    }

    #[test]
    fn scalar_to_json() {
        assert_eq!(Scalar::from("hi").to_json(), serde_json::json!("hi"));
        assert_eq!(Scalar::from(7_i64).to_json(), serde_json::json!(7));
        assert_eq!(Scalar::from(true).to_json(), serde_json::json!(true));
    }
}
