//! Tree adapter for selector matching
//!
//! A selector engine walks documents only through [`TreeAdapter`]. Node
//! handles it receives are opaque and go back through the same adapter for
//! any further navigation.

pub mod dom;
pub mod index;

pub use dom::{AdapterOptions, DomAdapter};
pub use index::Index;

use crate::error::Result;

/// Name that matches every element
pub const UNIVERSAL_TAG: &str = "*";

/// Operations a selector engine needs from a tree
pub trait TreeAdapter {
    /// Opaque node handle
    type Node: Copy + Eq;

    /// Textual value of the node, trimmed
    fn value(&self, node: Self::Node) -> Result<&str>;

    fn has_attribute(&self, node: Self::Node, name: &str) -> bool;

    /// Attribute value, trimmed. Guard with [`has_attribute`](Self::has_attribute).
    fn attribute(&self, node: Self::Node, name: &str) -> Result<&str>;

    /// Own name of the node (tag name for elements)
    fn name(&self, node: Self::Node) -> &str;

    /// Compare the node's name with `name`; [`UNIVERSAL_TAG`] always matches
    fn name_matches(&self, node: Self::Node, name: &str) -> bool;

    /// Element children in document order
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Element descendants in document order; fails unless the node is a
    /// document or an element
    fn descendants(&self, node: Self::Node) -> Result<Vec<Self::Node>>;

    /// True when the node has no children of any kind
    fn is_empty(&self, node: Self::Node) -> bool;

    /// Position among the parent's element children, or only among those
    /// sharing the node's name when `by_type` is set
    fn index_in_parent(&self, node: Self::Node, by_type: bool) -> Index;

    /// Next element sibling in document order
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Element the query is rooted at (`:root`)
    fn root(&self) -> Self::Node;
}
