//! A generic typed document-tree framework.
//!
//! Schemas (named parameter leaves, objects with closed field sets, lists
//! with closed item allow-sets) are declared once as marker types via the
//! [`parameter!`](crate::parameter), [`object!`](crate::object) and
//! [`list!`](crate::list) macros. Instances live in a [`Document`] arena
//! that exclusively owns the whole tree and hands out `Copy` handles;
//! [`to_value`]/[`to_string`] walk a tree into deterministic JSON.
//! Nothing in this module knows about the completion API: any JSON-backed
//! request shape can be declared on top of it.

mod arena;
mod schema;
mod serialize;

pub use arena::{Document, NodeId, NodeRef};
pub use schema::{
    FieldSpec, Item, Kind, ListSchema, Member, NodeSpec, ObjectSchema, ParameterSchema,
    ParameterValue, Scalar, ScalarType, Schema,
};
pub use serialize::{to_string, to_value};
