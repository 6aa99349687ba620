//! DOM Module - Arena-based Document
//!
//! Implements the host document model the adapter navigates:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for names and values

pub mod document;
pub mod node;
pub mod strings;

pub use document::{ChildIter, DescendantIter, Document, DocumentMode};
pub use node::{DetachedNode, NodeId, NodeKind, XmlNode};
pub use strings::StringPool;

/// Read access to a host document - everything the adapter consumes
///
/// Implementations only need the primitive relations; parent and kind
/// lookups are derived from [`get_node`](Self::get_node).
pub trait DocumentAccess {
    /// Get a node by ID
    fn get_node(&self, id: NodeId) -> Option<&XmlNode>;

    /// Get node name (`#text`, `#comment`, ... for unnamed kinds)
    fn node_name(&self, id: NodeId) -> Option<&str>;

    /// Get the textual value of text, comment, attribute and PI nodes
    fn node_value(&self, id: NodeId) -> Option<&str>;

    /// Find an attribute node of an element by name
    fn attribute_node(&self, id: NodeId, name: &str) -> Option<NodeId>;

    /// Children of any kind in document order - collected Vec for trait object compatibility
    fn children_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// Element descendants matching `pattern` in document order, `"*"` matching all
    fn elements_by_tag_name(&self, id: NodeId, pattern: &str) -> Vec<NodeId>;

    /// Create an element outside the tree
    fn create_element(&self, name: &str) -> DetachedNode;

    /// Structural equality of two detached nodes
    fn is_equal_node(&self, a: &DetachedNode, b: &DetachedNode) -> bool {
        a == b
    }

    /// Whether element names are case-sensitive, if the model knows it
    fn case_sensitive_names(&self) -> Option<bool> {
        None
    }

    /// Get the kind of a node
    fn node_kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    /// Get the parent of a node
    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }
}
