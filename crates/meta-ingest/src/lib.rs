//! Asynchronous ingestion for META.
//!
//! Producers canonicalize documents into a [`Store`](meta_store::Store) and
//! publish the root addresses on an address stream; consumers drain the
//! stream and hand each root object to an [`Indexer`].
//!
//! ```text
//!  XmlConverter ──put──▶ Store
//!       │                  ▲
//!       └─ root address ─▶ AddressStream ──▶ run_indexer ──▶ Indexer
//! ```
//!
//! # Design Rules
//!
//! 1. A root address is published only after every object below it is stored.
//! 2. Every wait on the stream also waits on the [`CancelSignal`]; a fired
//!    signal wins over queued addresses.
//! 3. Dropping every [`AddressSender`] ends the stream cleanly.
//! 4. The first indexer error stops consumption and is returned.

pub mod cancel;
pub mod converter;
pub mod dispatch;
pub mod error;
pub mod indexer;
pub mod stream;

pub use cancel::{cancellation, CancelHandle, CancelSignal};
pub use converter::XmlConverter;
pub use dispatch::{DispatchConfig, Handler, TypeDispatch};
pub use error::{IngestError, IngestResult};
pub use indexer::{run_indexer, Indexer};
pub use stream::{address_channel, AddressSender, AddressStream};
