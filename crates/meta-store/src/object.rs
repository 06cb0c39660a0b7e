use std::fmt;

use meta_types::{Address, Codec};

use crate::block::Block;
use crate::error::{StoreError, StoreResult};
use crate::node::Node;

/// Field holding an object's declared semantic type.
pub const TYPE_FIELD: &str = "@type";

/// Field holding a leaf object's scalar value.
pub const VALUE_FIELD: &str = "@value";

/// A decoded, typed, navigable view over a block's bytes.
///
/// Objects are immutable. "Updating" a document means encoding a new tree
/// and obtaining a new address.
#[derive(Clone, PartialEq)]
pub struct Object {
    block: Block,
    node: Node,
    typ: Option<String>,
}

impl Object {
    /// Validate `data` against `address` and decode it.
    ///
    /// Fails with the block errors ([`StoreError::InvalidVersion`],
    /// [`StoreError::AddressMismatch`]), then [`StoreError::InvalidCodec`] if
    /// the address does not use the node codec, [`StoreError::Decode`] on
    /// malformed content and [`StoreError::InvalidType`] if a top-level
    /// `@type` field is present but is not a string.
    pub fn new(address: Address, data: Vec<u8>) -> StoreResult<Self> {
        Self::from_block(Block::new(address, data)?)
    }

    /// Decode an already validated block.
    pub fn from_block(block: Block) -> StoreResult<Self> {
        if block.codec() != Codec::Node {
            return Err(StoreError::InvalidCodec(block.codec()));
        }
        let node = Node::decode(block.raw_data())?;
        let typ = declared_type(&node)?;
        Ok(Self { block, node, typ })
    }

    /// Encode a node tree, derive its address and wrap it.
    pub fn from_node(node: Node) -> StoreResult<Self> {
        let data = node.encode()?;
        let typ = declared_type(&node)?;
        let block = Block::from_data(data, Codec::Node);
        Ok(Self { block, node, typ })
    }

    pub fn address(&self) -> &Address {
        self.block.address()
    }

    pub fn raw_data(&self) -> &[u8] {
        self.block.raw_data()
    }

    /// The declared `@type`, or the empty string for untyped objects.
    pub fn type_name(&self) -> &str {
        self.typ.as_deref().unwrap_or("")
    }

    /// The declared `@type`, if any.
    pub fn declared_type(&self) -> Option<&str> {
        self.typ.as_deref()
    }

    /// The decoded tree.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Walk `path` inside this object.
    ///
    /// Descends maps by key and lists by index. Returns the value reached and
    /// the part of the path not consumed: resolution stops early at the first
    /// link (the rest must be resolved in the linked object) or terminal
    /// value (the caller decides whether leftover segments are an error).
    /// A segment missing from a map or list fails with
    /// [`StoreError::PathNotFound`].
    pub fn resolve<'p, S: AsRef<str>>(&self, path: &'p [S]) -> StoreResult<(&Node, &'p [S])> {
        let mut current = &self.node;
        let mut rest = path;
        while let Some((segment, tail)) = rest.split_first() {
            if current.is_terminal() {
                break;
            }
            current = current
                .child(segment.as_ref())
                .ok_or_else(|| StoreError::PathNotFound {
                    path: path.iter().map(|s| s.as_ref().to_owned()).collect(),
                })?;
            rest = tail;
        }
        Ok((current, rest))
    }

    /// A top-level field, if present.
    pub fn get(&self, field: &str) -> Option<&Node> {
        self.node.child(field)
    }

    /// A top-level string field.
    pub fn get_string(&self, field: &str) -> StoreResult<&str> {
        let value = self.get(field).ok_or_else(|| StoreError::PathNotFound {
            path: vec![field.to_owned()],
        })?;
        value.as_str().ok_or_else(|| {
            StoreError::Decode(format!("field {field} is a {}, not a string", value.kind()))
        })
    }

    /// Render the tree as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.node.to_json()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("address", self.address())
            .field("type", &self.type_name())
            .field("size", &self.raw_data().len())
            .finish()
    }
}

fn declared_type(node: &Node) -> StoreResult<Option<String>> {
    match node.child(TYPE_FIELD) {
        None => Ok(None),
        Some(Node::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(StoreError::InvalidType(other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use meta_crypto::derive_address;

    fn leaf(typ: &str, value: &str) -> Object {
        let mut map = BTreeMap::new();
        map.insert(TYPE_FIELD.to_string(), Node::from(typ));
        map.insert(VALUE_FIELD.to_string(), Node::from(value));
        Object::from_node(Node::Map(map)).unwrap()
    }

    #[test]
    fn new_accepts_valid_bytes() {
        let obj = leaf("ResourceName", "Song Title");
        let again = Object::new(*obj.address(), obj.raw_data().to_vec()).unwrap();
        assert_eq!(again, obj);
        assert_eq!(again.type_name(), "ResourceName");
    }

    #[test]
    fn untyped_object_has_empty_type() {
        let obj = Object::from_node(Node::Map(BTreeMap::new())).unwrap();
        assert_eq!(obj.type_name(), "");
        assert!(obj.declared_type().is_none());
    }

    #[test]
    fn non_string_type_rejected() {
        let mut map = BTreeMap::new();
        map.insert(TYPE_FIELD.to_string(), Node::Integer(5));
        let data = Node::Map(map).encode().unwrap();
        let addr = derive_address(&data, Codec::Node);
        let err = Object::new(addr, data).unwrap_err();
        assert!(matches!(err, StoreError::InvalidType("integer")));
    }

    #[test]
    fn raw_codec_rejected() {
        let data = Node::from("x").encode().unwrap();
        let addr = derive_address(&data, Codec::Raw);
        let err = Object::new(addr, data).unwrap_err();
        assert!(matches!(err, StoreError::InvalidCodec(Codec::Raw)));
    }

    #[test]
    fn malformed_content_rejected() {
        let data = vec![9, 9, 9];
        let addr = derive_address(&data, Codec::Node);
        let err = Object::new(addr, data).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn deeply_nested_content_rejected() {
        let mut data = Vec::new();
        for _ in 0..200_000 {
            data.extend_from_slice(&7u32.to_le_bytes());
            data.extend_from_slice(&1u64.to_le_bytes());
        }
        data.extend_from_slice(&0u32.to_le_bytes());
        let addr = derive_address(&data, Codec::Node);
        let err = Object::new(addr, data).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn resolve_scalar_field() {
        let obj = leaf("ResourceName", "Song Title");
        let path = ["@value"];
        let (value, rest) = obj.resolve(&path).unwrap();
        assert_eq!(value, &Node::from("Song Title"));
        assert!(rest.is_empty());
    }

    #[test]
    fn resolve_stops_at_link() {
        let target = derive_address(b"elsewhere", Codec::Node);
        let mut map = BTreeMap::new();
        map.insert("A".to_string(), Node::Link(target));
        let obj = Object::from_node(Node::Map(map)).unwrap();

        let path = ["A", "B", "C"];
        let (value, rest) = obj.resolve(&path).unwrap();
        assert_eq!(value.as_link(), Some(&target));
        assert_eq!(rest, &["B", "C"]);
    }

    #[test]
    fn resolve_stops_at_terminal_with_leftover() {
        let obj = leaf("T", "v");
        let path = ["@value", "deeper"];
        let (value, rest) = obj.resolve(&path).unwrap();
        assert_eq!(value, &Node::from("v"));
        assert_eq!(rest, &["deeper"]);
    }

    #[test]
    fn resolve_missing_field() {
        let obj = leaf("T", "v");
        let err = obj.resolve(&["nope"]).unwrap_err();
        assert!(err.is_path_not_found());
    }

    #[test]
    fn get_string_helpers() {
        let obj = leaf("T", "v");
        assert_eq!(obj.get_string("@value").unwrap(), "v");
        assert!(obj.get_string("lang").unwrap_err().is_path_not_found());
    }

    #[test]
    fn debug_shows_type() {
        let obj = leaf("ResourceName", "x");
        let debug = format!("{obj:?}");
        assert!(debug.contains("ResourceName"));
    }
}
