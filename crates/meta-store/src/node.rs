//! Canonical value tree stored inside every META object.
//!
//! A [`Node`] tree is encoded with bincode. Maps are `BTreeMap`s, so field
//! order is fixed by key and the same tree always encodes to the same bytes.
//! Decoding re-encodes the result and rejects any input that is not exactly
//! that canonical encoding (trailing bytes, duplicate or unsorted map keys).
//! Nesting is checked on the raw bytes before any tree is built, so hostile
//! input fails with a decode error instead of exhausting the stack.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use meta_types::Address;

use crate::error::{StoreError, StoreResult};

/// Deepest list or map nesting accepted when decoding.
pub const MAX_NODE_DEPTH: usize = 128;

// bincode variant tags of `Node`, in declaration order.
const TAG_NULL: u32 = 0;
const TAG_BOOL: u32 = 1;
const TAG_INTEGER: u32 = 2;
const TAG_FLOAT: u32 = 3;
const TAG_STRING: u32 = 4;
const TAG_BYTES: u32 = 5;
const TAG_LINK: u32 = 6;
const TAG_LIST: u32 = 7;
const TAG_MAP: u32 = 8;

/// A value in a META object's tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Reference to another object, fetched from the store on demand.
    Link(Address),
    List(Vec<Node>),
    Map(BTreeMap<String, Node>),
}

impl Node {
    /// Encode the tree into its canonical bytes.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StoreError::Encode(e.to_string()))
    }

    /// Decode canonical bytes into a tree.
    pub fn decode(data: &[u8]) -> StoreResult<Self> {
        check_depth(data, MAX_NODE_DEPTH)?;
        let node: Node =
            bincode::deserialize(data).map_err(|e| StoreError::Decode(e.to_string()))?;
        let canonical = node.encode()?;
        if canonical != data {
            return Err(StoreError::Decode(format!(
                "non-canonical encoding ({} bytes, canonical form is {})",
                data.len(),
                canonical.len()
            )));
        }
        Ok(node)
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Link(_) => "link",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Address> {
        match self {
            Self::Link(addr) => Some(addr),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a direct child by path segment: map key, or decimal list
    /// index.
    pub fn child(&self, segment: &str) -> Option<&Node> {
        match self {
            Self::Map(map) => map.get(segment),
            Self::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Returns `true` for variants that cannot be descended into.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Map(_) | Self::List(_))
    }

    /// Render as JSON. Links render as `{"/": "<address>"}`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::Bytes(b) => Value::Array(b.iter().map(|x| Value::from(*x)).collect()),
            Self::Link(addr) => {
                let mut link = serde_json::Map::new();
                link.insert("/".into(), Value::String(addr.to_string()));
                Value::Object(link)
            }
            Self::List(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Walk the encoded tree without recursing and reject nesting beyond `limit`.
///
/// Only structure is read here: tags, lengths and skipped payloads. Trailing
/// bytes and map key order are left to the canonical re-encode check.
fn check_depth(data: &[u8], limit: usize) -> StoreResult<()> {
    struct Frame {
        is_map: bool,
        remaining: u64,
    }

    let mut reader = Reader { data, pos: 0 };
    let mut open: Vec<Frame> = Vec::new();
    loop {
        match reader.u32()? {
            TAG_NULL => {}
            TAG_BOOL => reader.skip(1)?,
            TAG_INTEGER | TAG_FLOAT => reader.skip(8)?,
            TAG_STRING | TAG_BYTES | TAG_LINK => reader.skip_prefixed()?,
            tag @ (TAG_LIST | TAG_MAP) => {
                let len = reader.u64()?;
                if len > 0 {
                    if open.len() >= limit {
                        return Err(StoreError::Decode(format!(
                            "nesting deeper than {limit} levels"
                        )));
                    }
                    let is_map = tag == TAG_MAP;
                    if is_map {
                        reader.skip_prefixed()?;
                    }
                    open.push(Frame { is_map, remaining: len });
                    continue;
                }
            }
            other => return Err(StoreError::Decode(format!("unknown node tag {other}"))),
        }

        // One value is complete; close every container it finished.
        loop {
            let Some(frame) = open.last_mut() else {
                return Ok(());
            };
            frame.remaining -= 1;
            if frame.remaining > 0 {
                if frame.is_map {
                    reader.skip_prefixed()?;
                }
                break;
            }
            open.pop();
        }
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> StoreResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| StoreError::Decode("unexpected end of node bytes".into()))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn skip(&mut self, n: usize) -> StoreResult<()> {
        self.take(n).map(|_| ())
    }

    fn u32(&mut self) -> StoreResult<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64(&mut self) -> StoreResult<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    /// Skip a length-prefixed string or byte string.
    fn skip_prefixed(&mut self) -> StoreResult<()> {
        let len = usize::try_from(self.u64()?)
            .map_err(|_| StoreError::Decode("length overflows usize".into()))?;
        self.skip(len)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Address> for Node {
    fn from(addr: Address) -> Self {
        Self::Link(addr)
    }
}

impl From<BTreeMap<String, Node>> for Node {
    fn from(map: BTreeMap<String, Node>) -> Self {
        Self::Map(map)
    }
}
