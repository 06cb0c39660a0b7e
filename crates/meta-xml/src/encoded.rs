//! The two object shapes the canonicalizer produces.
//!
//! Every element becomes exactly one of:
//!
//! - a [`LeafNode`]: `{"@type", "@value", ...attributes}`
//! - a [`CompositeNode`]: `{"@type", ...attributes, ...child fields, ["@value"]}`
//!
//! Child fields are a single link when the child name occurs once, and an
//! ordered list of links when it repeats. Composite text follows the same
//! rule: one run is a string, several runs separated by child elements are
//! an ordered list of strings.

use std::collections::BTreeMap;

use meta_store::{Node, Object, TYPE_FIELD, VALUE_FIELD};
use meta_types::Address;

use crate::error::{EncodeError, EncodeResult};

/// An element with no child elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafNode {
    pub type_id: String,
    pub value: String,
    pub attributes: BTreeMap<String, String>,
}

/// A child field of a composite node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// The only child with this name.
    Link(Address),
    /// Every child with this name, in document order.
    Links(Vec<Address>),
}

/// An element with child elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeNode {
    pub type_id: String,
    pub attributes: BTreeMap<String, String>,
    pub fields: BTreeMap<String, Field>,
    /// Text runs directly inside the element, in document order.
    /// Whitespace-only runs are not kept.
    pub text: Vec<String>,
}

/// A canonicalized element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodedNode {
    Leaf(LeafNode),
    Composite(CompositeNode),
}

impl EncodedNode {
    pub fn type_id(&self) -> &str {
        match self {
            Self::Leaf(leaf) => &leaf.type_id,
            Self::Composite(composite) => &composite.type_id,
        }
    }

    /// Build the node tree stored in the object.
    pub fn into_node(self) -> Node {
        let mut map = BTreeMap::new();
        match self {
            Self::Leaf(leaf) => {
                insert_attributes(&mut map, leaf.attributes);
                map.insert(VALUE_FIELD.to_owned(), Node::String(leaf.value));
                map.insert(TYPE_FIELD.to_owned(), Node::String(leaf.type_id));
            }
            Self::Composite(composite) => {
                insert_attributes(&mut map, composite.attributes);
                for (name, field) in composite.fields {
                    let node = match field {
                        Field::Link(address) => Node::Link(address),
                        Field::Links(addresses) => {
                            Node::List(addresses.into_iter().map(Node::Link).collect())
                        }
                    };
                    map.insert(name, node);
                }
                let mut text = composite.text;
                match text.len() {
                    0 => {}
                    1 => {
                        map.insert(VALUE_FIELD.to_owned(), Node::String(text.remove(0)));
                    }
                    _ => {
                        let runs = text.into_iter().map(Node::String).collect();
                        map.insert(VALUE_FIELD.to_owned(), Node::List(runs));
                    }
                }
                map.insert(TYPE_FIELD.to_owned(), Node::String(composite.type_id));
            }
        }
        Node::Map(map)
    }

    /// Read an object produced by the canonicalizer back into its shape.
    ///
    /// Objects holding at least one link field are composites; objects whose
    /// fields are all strings and include `@value` are leaves. Anything else
    /// fails with [`EncodeError::UnexpectedShape`].
    pub fn decode(object: &Object) -> EncodeResult<Self> {
        let unexpected = |reason: &str| {
            EncodeError::UnexpectedShape(format!("{}: {reason}", object.address()))
        };
        let map = object.node().as_map().ok_or_else(|| unexpected("not a map"))?;
        let type_id = object
            .declared_type()
            .ok_or_else(|| unexpected("no @type"))?
            .to_owned();

        let mut attributes = BTreeMap::new();
        let mut fields = BTreeMap::new();
        let mut value = None;
        let mut text = Vec::new();
        for (name, node) in map {
            match (name.as_str(), node) {
                (TYPE_FIELD, _) => {}
                (VALUE_FIELD, Node::String(s)) => {
                    value = Some(s.clone());
                    text.push(s.clone());
                }
                (VALUE_FIELD, Node::List(items)) => {
                    text = items
                        .iter()
                        .map(|item| item.as_str().map(str::to_owned))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| unexpected("@value list holds a non-string"))?;
                }
                (_, Node::String(s)) => {
                    attributes.insert(name.clone(), s.clone());
                }
                (_, Node::Link(address)) => {
                    fields.insert(name.clone(), Field::Link(*address));
                }
                (_, Node::List(items)) => {
                    let addresses = items
                        .iter()
                        .map(|item| item.as_link().copied())
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| unexpected("list field holds a non-link"))?;
                    fields.insert(name.clone(), Field::Links(addresses));
                }
                (_, other) => {
                    return Err(unexpected(&format!("field {name} is a {}", other.kind())));
                }
            }
        }

        if fields.is_empty() {
            let value = value.ok_or_else(|| unexpected("leaf without @value"))?;
            Ok(Self::Leaf(LeafNode {
                type_id,
                value,
                attributes,
            }))
        } else {
            Ok(Self::Composite(CompositeNode {
                type_id,
                attributes,
                fields,
                text,
            }))
        }
    }
}

fn insert_attributes(map: &mut BTreeMap<String, Node>, attributes: BTreeMap<String, String>) {
    for (name, value) in attributes {
        map.insert(name, Node::String(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meta_store::Object;

    fn leaf() -> EncodedNode {
        let mut attributes = BTreeMap::new();
        attributes.insert("lang".to_string(), "en".to_string());
        EncodedNode::Leaf(LeafNode {
            type_id: "ResourceName".into(),
            value: "Song Title".into(),
            attributes,
        })
    }

    #[test]
    fn leaf_roundtrips_through_object() {
        let obj = Object::from_node(leaf().into_node()).unwrap();
        assert_eq!(obj.type_name(), "ResourceName");
        assert_eq!(EncodedNode::decode(&obj).unwrap(), leaf());
    }

    #[test]
    fn composite_roundtrips_through_object() {
        let child = Object::from_node(leaf().into_node()).unwrap();
        let mut fields = BTreeMap::new();
        fields.insert("Title".to_string(), Field::Link(*child.address()));
        fields.insert(
            "Artist".to_string(),
            Field::Links(vec![*child.address(), *child.address()]),
        );
        let composite = EncodedNode::Composite(CompositeNode {
            type_id: "Release".into(),
            attributes: BTreeMap::new(),
            fields,
            text: Vec::new(),
        });
        let obj = Object::from_node(composite.clone().into_node()).unwrap();
        let decoded = EncodedNode::decode(&obj).unwrap();
        assert_eq!(decoded, composite);
        assert_eq!(decoded.type_id(), "Release");
        let EncodedNode::Composite(c) = decoded else {
            panic!("expected composite");
        };
        assert_eq!(c.fields["Artist"], Field::Links(vec![*child.address(); 2]));
    }

    #[test]
    fn mixed_content_runs_kept_apart() {
        let child = Object::from_node(leaf().into_node()).unwrap();
        let composite = EncodedNode::Composite(CompositeNode {
            type_id: "Note".into(),
            attributes: BTreeMap::new(),
            fields: BTreeMap::from([("Ref".to_string(), Field::Link(*child.address()))]),
            text: vec!["a".into(), "b".into()],
        });
        let obj = Object::from_node(composite.clone().into_node()).unwrap();
        assert_eq!(
            obj.get(VALUE_FIELD),
            Some(&Node::List(vec![Node::from("a"), Node::from("b")]))
        );
        assert_eq!(EncodedNode::decode(&obj).unwrap(), composite);
    }

    #[test]
    fn leaf_with_value_list_rejected() {
        let mut map = BTreeMap::new();
        map.insert(TYPE_FIELD.to_string(), Node::from("T"));
        map.insert(VALUE_FIELD.to_string(), Node::List(vec![Node::from("a")]));
        let obj = Object::from_node(Node::Map(map)).unwrap();
        assert!(matches!(
            EncodedNode::decode(&obj),
            Err(EncodeError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn untyped_object_rejected() {
        let obj = Object::from_node(Node::Map(BTreeMap::new())).unwrap();
        assert!(matches!(
            EncodedNode::decode(&obj),
            Err(EncodeError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn leaf_without_value_rejected() {
        let mut map = BTreeMap::new();
        map.insert(TYPE_FIELD.to_string(), Node::from("T"));
        let obj = Object::from_node(Node::Map(map)).unwrap();
        assert!(EncodedNode::decode(&obj).is_err());
    }
}
