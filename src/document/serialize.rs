//! Recursive serialization of a document tree into JSON.
//!
//! The walk is pure: it never mutates the tree, and a failure produces no
//! partial output. Object keys are emitted in schema declaration order, so
//! the same tree always serializes to byte-identical text regardless of
//! the order the caller populated it in.

use serde_json::{Map, Value};

use crate::error::Error;

use super::arena::{Document, NodeId, Payload};
use super::schema::Kind;

/// Serializes the tree under `root` into a JSON value.
///
/// Fails with an incomplete-document error when a required field is unset
/// or a non-empty-required list is empty.
pub fn to_value(document: &Document, root: NodeId) -> Result<Value, Error> {
    match node_value(document, root)? {
        Some(value) => Ok(value),
        None => Err(Error::UnsetParameter {
            parameter: document.spec(root).name,
        }),
    }
}

/// Serializes the tree under `root` into canonical JSON text.
pub fn to_string(document: &Document, root: NodeId) -> Result<String, Error> {
    Ok(to_value(document, root)?.to_string())
}

/// The JSON value of one node; `None` for an unset parameter, which the
/// parent omits (optional) or reports (required).
fn node_value(document: &Document, id: NodeId) -> Result<Option<Value>, Error> {
    let node = document.node(id);
    match (&node.spec.kind, &node.payload) {
        (Kind::Parameter { .. }, Payload::Parameter(value)) => {
            Ok(value.as_ref().map(super::schema::Scalar::to_json))
        }
        (Kind::Object { fields }, Payload::Object(slots)) => {
            let mut map = Map::with_capacity(fields.len());
            for (field, slot) in fields.iter().zip(slots) {
                let value = match slot {
                    Some(child) => node_value(document, *child)?,
                    None => None,
                };
                match value {
                    Some(value) => {
                        map.insert(field.name().to_owned(), value);
                    }
                    None if field.required => {
                        return Err(Error::MissingField {
                            object: node.spec.name,
                            field: field.name(),
                        });
                    }
                    None => {}
                }
            }
            Ok(Some(Value::Object(map)))
        }
        (Kind::List { non_empty, .. }, Payload::List(items)) => {
            if *non_empty && items.is_empty() {
                return Err(Error::EmptyList {
                    list: node.spec.name,
                });
            }
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                match node_value(document, *item)? {
                    Some(value) => array.push(value),
                    None => {
                        return Err(Error::UnsetParameter {
                            parameter: document.spec(*item).name,
                        });
                    }
                }
            }
            Ok(Some(Value::Array(array)))
        }
        _ => unreachable!("payload always matches the spec kind"),
    }
}

#[cfg(test)]
mod tests {
    use super::super::arena::{Document, NodeRef};
    use crate::error::ErrorKind;
    use crate::{list, object, parameter};

    parameter!(NoteKind = "kind": String, preset = "note");
    parameter!(Body = "body": String);
    parameter!(Pinned = "pinned": bool);
    object!(Note = "note" {
        required NoteKind,
        required Body,
        optional Pinned,
    });
    list!(Notes = "notes": Note, non_empty);
    object!(Board = "board" {
        optional Pinned,
        required Notes,
    });

    fn one_note_board(document: &mut Document) -> NodeRef<Board> {
        let board = document.create::<Board>();
        let notes = board.get_or_create::<Notes>(document);
        let note = notes.append::<Note>(document);
        note.set::<Body>(document, "remember");
        board
    }

    #[test]
    fn serializes_in_declaration_order() {
        let mut document = Document::new();
        let board = one_note_board(&mut document);
        // `pinned` is declared before `notes`; setting it afterwards must
        // not move it after `notes` in the output.
        board.set::<Pinned>(&mut document, true);
        assert_eq!(
            document.serialize(board).expect("complete"),
            r#"{"pinned":true,"notes":[{"kind":"note","body":"remember"}]}"#
        );
    }

    #[test]
    fn optional_fields_are_omitted_not_null() {
        let mut document = Document::new();
        let board = one_note_board(&mut document);
        let text = document.serialize(board).expect("complete");
        assert!(!text.contains("pinned"));
        assert!(!text.contains("null"));
    }

    #[test]
    fn unset_required_field_is_incomplete() {
        let mut document = Document::new();
        let board = document.create::<Board>();
        let notes = board.get_or_create::<Notes>(&mut document);
        notes.append::<Note>(&mut document);
        let error = document.serialize(board).expect_err("body is unset");
        assert_eq!(error.kind(), ErrorKind::IncompleteDocument);
    }

    #[test]
    fn empty_required_list_is_incomplete() {
        let mut document = Document::new();
        let board = document.create::<Board>();
        board.get_or_create::<Notes>(&mut document);
        let error = document.serialize(board).expect_err("notes is empty");
        assert_eq!(error.kind(), ErrorKind::IncompleteDocument);
    }

    #[test]
    fn missing_required_list_is_incomplete() {
        let mut document = Document::new();
        let board = document.create::<Board>();
        let error = document.serialize(board).expect_err("notes never created");
        assert_eq!(error.kind(), ErrorKind::IncompleteDocument);
    }

    #[test]
    fn serialization_is_deterministic() {
        let mut document = Document::new();
        let board = one_note_board(&mut document);
        let first = document.serialize(board).expect("complete");
        let second = document.serialize(board).expect("complete");
        assert_eq!(first, second);
    }
}
