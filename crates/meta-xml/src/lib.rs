//! Canonicalization of XML metadata documents into META objects.
//!
//! The [`Encoder`] walks a parsed document bottom-up. Every element becomes
//! its own object: elements without child elements become leaf objects
//! carrying their text as `@value`, elements with children become composite
//! objects whose fields link to the children's addresses. Each object is
//! handed to the caller's `put` before its parent is built, so a store never
//! receives a link to an object it does not hold.
//!
//! Element names are classified into semantic type identifiers by context
//! documents, consulted through the [`ContextResolver`] trait.
//!
//! # Example
//!
//! ```no_run
//! use meta_store::{InMemoryDatastore, Store};
//! use meta_xml::{encode_xml, ContextDocument};
//!
//! let store = Store::new(InMemoryDatastore::new());
//! let context = ContextDocument::from_terms([("Title", "http://example.com/Title")])
//!     .to_object()
//!     .unwrap();
//! store.put(&context).unwrap();
//!
//! let xml = "<Title lang=\"en\">Song Title</Title>";
//! let root = encode_xml(xml.as_bytes(), &[*context.address()], &store, |o| store.put(o)).unwrap();
//! println!("{root}");
//! ```

pub mod config;
pub mod context;
pub mod document;
pub mod encoded;
pub mod encoder;
pub mod error;

pub use config::EncoderConfig;
pub use context::{
    qualified_name, ContextDocument, ContextResolver, OrderedContexts, CONTEXT_FIELD, CONTEXT_TYPE,
};
pub use document::{parse_document, Attribute, Element};
pub use encoded::{CompositeNode, EncodedNode, Field, LeafNode};
pub use encoder::{encode_xml, Encoder};
pub use error::{EncodeError, EncodeResult};
