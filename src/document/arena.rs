//! The document arena.
//!
//! A [`Document`] is the exclusive owner of every node in one request tree.
//! Creating a node hands back a [`NodeRef`]: a `Copy` handle carrying the
//! node's index, the document's stamp, and the node's schema type. Handles
//! never own anything; dropping the `Document` drops the whole tree at
//! once, and a handle presented to a different `Document` is rejected with
//! a panic rather than resolving to the wrong node.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;

use super::schema::{Kind, NodeSpec, ParameterSchema, Scalar, Schema};
use super::schema::{Item, ListSchema, Member, ObjectSchema};

static NEXT_STAMP: AtomicU64 = AtomicU64::new(0);

/// Index of a node within its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A non-owning, schema-typed handle to a node in a [`Document`].
pub struct NodeRef<T> {
    id: NodeId,
    stamp: u64,
    _schema: PhantomData<fn() -> T>,
}

impl<T> NodeRef<T> {
    fn new(id: NodeId, stamp: u64) -> Self {
        Self {
            id,
            stamp,
            _schema: PhantomData,
        }
    }

    /// The untyped node index, usable with the dynamic `Document` API.
    pub fn id(self) -> NodeId {
        self.id
    }

    /// Panics if this handle belongs to a different document.
    fn guard(self, document: &Document) {
        assert_eq!(
            self.stamp, document.stamp,
            "node handle used with a document it does not belong to"
        );
    }
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<T> {}

impl<T> PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.stamp == other.stamp
    }
}

impl<T> Eq for NodeRef<T> {}

impl<T: Schema> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("schema", &T::SPEC.name)
            .field("id", &self.id)
            .finish()
    }
}

pub(crate) struct Node {
    pub(crate) spec: &'static NodeSpec,
    pub(crate) payload: Payload,
}

pub(crate) enum Payload {
    /// A leaf and its value, `None` while unset.
    Parameter(Option<Scalar>),
    /// One slot per declared field, in declaration order.
    Object(Vec<Option<NodeId>>),
    /// Items in append order.
    List(Vec<NodeId>),
}

/// Exclusive owner of one document tree.
pub struct Document {
    stamp: u64,
    nodes: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            stamp: NEXT_STAMP.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
        }
    }

    /// Number of nodes this document owns, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a detached node of schema `T` and returns its handle.
    ///
    /// This is how a root is made; children are created through the handle
    /// methods, which delegate back to this same document.
    pub fn create<T: Schema>(&mut self) -> NodeRef<T> {
        let id = self.alloc(T::SPEC);
        NodeRef::new(id, self.stamp)
    }

    fn alloc(&mut self, spec: &'static NodeSpec) -> NodeId {
        let payload = match &spec.kind {
            Kind::Parameter { preset, .. } => Payload::Parameter(preset.map(Scalar::from)),
            Kind::Object { fields } => Payload::Object(vec![None; fields.len()]),
            Kind::List { .. } => Payload::List(Vec::new()),
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { spec, payload });
        // Preset fields (discriminators) exist from birth, like any other
        // declaration-time default.
        if let Kind::Object { fields } = &spec.kind {
            for (position, field) in fields.iter().enumerate() {
                if matches!(
                    field.spec.kind,
                    Kind::Parameter { preset: Some(_), .. }
                ) {
                    self.install(id, position, field.spec);
                }
            }
        }
        id
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// The schema spec of a node.
    pub fn spec(&self, id: NodeId) -> &'static NodeSpec {
        self.node(id).spec
    }

    /// The stored value of a parameter node, `None` while unset (or when
    /// `id` is not a parameter).
    pub fn value(&self, id: NodeId) -> Option<&Scalar> {
        match &self.node(id).payload {
            Payload::Parameter(value) => value.as_ref(),
            _ => None,
        }
    }

    /// The populated child of an object node under the declared field
    /// `name`, if any.
    pub fn field(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let node = self.node(parent);
        let Kind::Object { fields } = &node.spec.kind else {
            return None;
        };
        let Payload::Object(slots) = &node.payload else {
            return None;
        };
        let position = fields.iter().position(|f| f.name() == name)?;
        slots[position]
    }

    /// The items of a list node, in append order (empty when `id` is not a
    /// list).
    pub fn items(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).payload {
            Payload::List(items) => items,
            _ => &[],
        }
    }

    /// Runtime-checked child creation: installs a new node in the slot of
    /// the declared field `name` of `parent`.
    ///
    /// Fails with a schema violation if `parent` is not an object, `name`
    /// is not one of its declared fields, or the slot is already populated
    /// (a singular field is created at most once; re-creating it would
    /// orphan the previous child).
    pub fn create_field(&mut self, parent: NodeId, name: &str) -> Result<NodeId, Error> {
        let spec = self.node(parent).spec;
        let Kind::Object { fields } = &spec.kind else {
            return Err(Error::KindMismatch {
                node: spec.name,
                expected: "object",
                found: spec.kind.word(),
            });
        };
        let Some(position) = fields.iter().position(|f| f.name() == name) else {
            return Err(Error::UnknownField {
                object: spec.name,
                field: name.to_owned(),
            });
        };
        if let Payload::Object(slots) = &self.node(parent).payload {
            if slots[position].is_some() {
                return Err(Error::DuplicateField {
                    object: spec.name,
                    field: fields[position].name(),
                });
            }
        }
        Ok(self.install(parent, position, fields[position].spec))
    }

    /// Runtime-checked append: pushes a new node of kind `item` onto the
    /// list, failing with a schema violation if `list` is not a list node
    /// or `item` is outside its declared allow-set. On failure the list is
    /// unchanged.
    pub fn append_item(&mut self, list: NodeId, item: &'static NodeSpec) -> Result<NodeId, Error> {
        let spec = self.node(list).spec;
        let Kind::List { items, .. } = &spec.kind else {
            return Err(Error::KindMismatch {
                node: spec.name,
                expected: "list",
                found: spec.kind.word(),
            });
        };
        if !items.iter().any(|allowed| allowed.name == item.name) {
            return Err(Error::ForeignItem {
                list: spec.name,
                item: item.name,
            });
        }
        Ok(self.push_item(list, item))
    }

    /// Runtime-checked store: writes `value` into a parameter node,
    /// failing with a schema violation if `node` is not a parameter or the
    /// value's scalar type differs from the declared one.
    pub fn set_value(&mut self, node: NodeId, value: impl Into<Scalar>) -> Result<(), Error> {
        let spec = self.node(node).spec;
        let Kind::Parameter { ty, .. } = &spec.kind else {
            return Err(Error::KindMismatch {
                node: spec.name,
                expected: "parameter",
                found: spec.kind.word(),
            });
        };
        let value = value.into();
        if value.scalar_type() != *ty {
            return Err(Error::ValueType {
                parameter: spec.name,
                expected: *ty,
                found: value.scalar_type(),
            });
        }
        self.store(node, value);
        Ok(())
    }

    /// Serializes the tree under `root` into canonical JSON text.
    pub fn serialize<T: Schema>(&self, root: NodeRef<T>) -> Result<String, Error> {
        root.guard(self);
        super::serialize::to_string(self, root.id)
    }

    fn install(&mut self, parent: NodeId, position: usize, spec: &'static NodeSpec) -> NodeId {
        let child = self.alloc(spec);
        match &mut self.node_mut(parent).payload {
            Payload::Object(slots) => slots[position] = Some(child),
            _ => unreachable!("caller verified the object kind"),
        }
        child
    }

    fn slot_get_or_create(&mut self, parent: NodeId, name: &'static str) -> NodeId {
        let spec = self.node(parent).spec;
        let Kind::Object { fields } = &spec.kind else {
            unreachable!("caller verified the object kind")
        };
        let position = fields
            .iter()
            .position(|f| f.name() == name)
            .expect("member schema is declared on its parent object");
        if let Payload::Object(slots) = &self.node(parent).payload {
            if let Some(existing) = slots[position] {
                return existing;
            }
        }
        self.install(parent, position, fields[position].spec)
    }

    fn push_item(&mut self, list: NodeId, spec: &'static NodeSpec) -> NodeId {
        let item = self.alloc(spec);
        match &mut self.node_mut(list).payload {
            Payload::List(items) => items.push(item),
            _ => unreachable!("caller verified the list kind"),
        }
        item
    }

    fn store(&mut self, leaf: NodeId, value: Scalar) {
        match &mut self.node_mut(leaf).payload {
            Payload::Parameter(slot) => *slot = Some(value),
            _ => unreachable!("caller verified the parameter kind"),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl<T: ObjectSchema> NodeRef<T> {
    /// Creates the child for the declared member `F`, installing it into
    /// `F`'s field slot.
    ///
    /// Membership is checked at compile time; the only runtime failure is
    /// creating the same singular field twice, which is rejected rather
    /// than orphaning the previous child.
    pub fn create<F>(self, document: &mut Document) -> Result<NodeRef<F>, Error>
    where
        F: Schema + Member<T>,
    {
        self.guard(document);
        let id = document.create_field(self.id, F::SPEC.name)?;
        Ok(NodeRef::new(id, self.stamp))
    }

    /// Returns the child for the declared member `F`, materializing it on
    /// first access.
    pub fn get_or_create<F>(self, document: &mut Document) -> NodeRef<F>
    where
        F: Schema + Member<T>,
    {
        self.guard(document);
        let id = document.slot_get_or_create(self.id, F::SPEC.name);
        NodeRef::new(id, self.stamp)
    }

    /// Stores a value into the parameter member `F`, materializing the
    /// leaf on first set. Re-setting replaces the previous value.
    pub fn set<F>(self, document: &mut Document, value: impl Into<F::Value>)
    where
        F: ParameterSchema + Member<T>,
    {
        let leaf = self.get_or_create::<F>(document);
        let value: F::Value = value.into();
        document.store(leaf.id, value.into());
    }

    /// Reads the value of the parameter member `F`, `None` while unset.
    pub fn get<F>(self, document: &Document) -> Option<&Scalar>
    where
        F: ParameterSchema + Member<T>,
    {
        self.guard(document);
        document
            .field(self.id, F::SPEC.name)
            .and_then(|id| document.value(id))
    }
}

impl<L: ListSchema> NodeRef<L> {
    /// Appends a new node of the allowed item kind `I` and returns its
    /// handle. Append order is the serialization order.
    pub fn append<I>(self, document: &mut Document) -> NodeRef<I>
    where
        I: Schema + Item<L>,
    {
        self.guard(document);
        let id = document.push_item(self.id, I::SPEC);
        NodeRef::new(id, self.stamp)
    }

    pub fn len(self, document: &Document) -> usize {
        self.guard(document);
        document.items(self.id).len()
    }

    pub fn is_empty(self, document: &Document) -> bool {
        self.len(document) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::{list, object, parameter};

    parameter!(Label = "label": String);
    parameter!(Count = "count": i64);
    parameter!(Tag = "tag": String, preset = "entry");
    object!(Entry = "entry" {
        required Tag,
        required Label,
        optional Count,
    });
    list!(Entries = "entries": Entry, non_empty);
    object!(Ledger = "ledger" {
        required Entries,
        optional Label,
    });

    #[test]
    fn set_then_get_round_trips() {
        let mut document = Document::new();
        let entry = document.create::<Entry>();
        entry.set::<Label>(&mut document, "first");
        assert_eq!(
            entry.get::<Label>(&document).and_then(Scalar::as_str),
            Some("first")
        );
        entry.set::<Label>(&mut document, "second");
        assert_eq!(
            entry.get::<Label>(&document).and_then(Scalar::as_str),
            Some("second")
        );
    }

    #[test]
    fn preset_is_stored_on_materialization() {
        let mut document = Document::new();
        let entry = document.create::<Entry>();
        let tag = entry.get_or_create::<Tag>(&mut document);
        assert_eq!(
            document.value(tag.id()).and_then(Scalar::as_str),
            Some("entry")
        );
    }

    #[test]
    fn get_or_create_returns_the_same_child() {
        let mut document = Document::new();
        let ledger = document.create::<Ledger>();
        let first = ledger.get_or_create::<Entries>(&mut document);
        let second = ledger.get_or_create::<Entries>(&mut document);
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let mut document = Document::new();
        let ledger = document.create::<Ledger>();
        ledger
            .create::<Entries>(&mut document)
            .expect("first create succeeds");
        let error = ledger
            .create::<Entries>(&mut document)
            .expect_err("second create is a violation");
        assert_eq!(error.kind(), ErrorKind::SchemaViolation);
    }

    #[test]
    fn append_preserves_order() {
        let mut document = Document::new();
        let ledger = document.create::<Ledger>();
        let entries = ledger.get_or_create::<Entries>(&mut document);
        let a = entries.append::<Entry>(&mut document);
        let b = entries.append::<Entry>(&mut document);
        assert_eq!(document.items(entries.id()), &[a.id(), b.id()]);
        assert_eq!(entries.len(&document), 2);
    }

    #[test]
    fn foreign_item_is_rejected_and_list_unchanged() {
        let mut document = Document::new();
        let ledger = document.create::<Ledger>();
        let entries = ledger.get_or_create::<Entries>(&mut document);
        let error = document
            .append_item(entries.id(), Ledger::SPEC)
            .expect_err("ledger is not in the allow-set");
        assert_eq!(error.kind(), ErrorKind::SchemaViolation);
        assert!(entries.is_empty(&document));
    }

    #[test]
    fn dynamic_set_checks_the_scalar_type() {
        let mut document = Document::new();
        let entry = document.create::<Entry>();
        let label = entry.get_or_create::<Label>(&mut document);
        let error = document
            .set_value(label.id(), 3_i64)
            .expect_err("label is a string parameter");
        assert_eq!(error.kind(), ErrorKind::SchemaViolation);
        assert!(document.set_value(label.id(), "ok").is_ok());
    }

    #[test]
    fn dynamic_kind_mismatch_is_a_violation() {
        let mut document = Document::new();
        let entry = document.create::<Entry>();
        let error = document
            .set_value(entry.id(), "not a parameter")
            .expect_err("entry is an object");
        assert_eq!(error.kind(), ErrorKind::SchemaViolation);
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn cross_document_handles_are_rejected() {
        let mut first = Document::new();
        let mut second = Document::new();
        let entry = first.create::<Entry>();
        entry.set::<Label>(&mut second, "nope");
    }
}
