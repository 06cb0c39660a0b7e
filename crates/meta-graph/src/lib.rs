//! Path resolution across the META object graph.
//!
//! A [`Graph`] starts from a root object and follows field paths through it.
//! Whenever a path continues past a link, the linked object is fetched from
//! the store and resolution carries on there, so callers can address a whole
//! linked document as if it were a single tree. Only objects the path
//! actually touches are fetched.

pub mod config;
pub mod error;
pub mod graph;

pub use config::GraphConfig;
pub use error::{GraphError, GraphResult};
pub use graph::{Graph, Resolved};
