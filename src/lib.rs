//! RustySelect - Tree adapter for CSS selector matching
//!
//! Layers:
//! - reader: zero-copy markup reader (memchr scanning)
//! - dom: arena document model the adapter navigates
//! - adapter: `TreeAdapter` contract, `Index`, and the DOM binding
//! - parallel: rayon batch helpers (feature `parallel`)
//!
//! ```
//! use rustyselect::{Document, DomAdapter, TreeAdapter};
//!
//! let doc = Document::parse(b"<!DOCTYPE html><html><p/>text<p/></html>");
//! let adapter = DomAdapter::new(&doc, doc.document_node_id()).unwrap();
//! let html = adapter.root();
//! let second = adapter.children(html)[1];
//! assert_eq!(adapter.index_in_parent(second, false).nth(), Some(2));
//! ```

pub mod adapter;
pub mod dom;
pub mod error;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod reader;

pub use adapter::{AdapterOptions, DomAdapter, Index, TreeAdapter, UNIVERSAL_TAG};
pub use dom::{DetachedNode, Document, DocumentAccess, DocumentMode, NodeId, NodeKind};
pub use error::{AdapterError, Result};
