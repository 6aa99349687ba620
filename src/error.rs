//! Error types
//!
//! Absent parents and absent siblings are not errors; they are reported
//! through sentinels (`Index::detached()`, `None`).

use crate::dom::{NodeId, NodeKind};

/// Errors surfaced by the adapter and the host document model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Adapter root is unknown, of the wrong kind, or a document without an element
    #[error("cannot construct adapter: {0}")]
    Construction(String),
    /// Descendant enumeration on something other than a document or element
    #[error("only document and element nodes allowed, node {node} is {kind:?}")]
    UnsupportedNodeKind { node: NodeId, kind: NodeKind },
    /// Handle that does not name a node of the document
    #[error("node {node} does not exist")]
    UnknownNode { node: NodeId },
    /// Attribute value requested for a name the node does not carry
    #[error("node {node} has no attribute named {name:?}")]
    MissingAttribute { node: NodeId, name: String },
    /// Textual value requested from a node that has none
    #[error("node {node} carries no textual value")]
    NoValue { node: NodeId },
    /// Builder asked to append under a node that cannot hold that child
    #[error("node {parent} cannot take a {child:?} child")]
    InvalidParent { parent: NodeId, child: NodeKind },
    /// Arena has run out of addressable node ids
    #[error("document holds more nodes than a NodeId can address")]
    ArenaFull,
    /// Strict markup reading failed
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AdapterError>;
