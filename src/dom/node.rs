//! Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Attribute owned by an element (never part of a child list)
    Attribute,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
    /// DOCTYPE declaration
    DocumentType,
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the document node, attributes and detached nodes)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for the name (elements, attributes, PI targets, doctypes)
    pub name_id: u32,
    /// Index into string pool for the value (text, comments, attributes, PI data)
    pub value_id: u32,
    /// Start of this element's attribute ids in the attribute arena
    pub attr_start: u32,
    /// Number of attributes
    pub attr_count: u32,
    /// Depth in document tree
    pub depth: u16,
}

impl XmlNode {
    fn with_kind(kind: NodeKind, parent: Option<NodeId>, depth: u16) -> Self {
        XmlNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            value_id: 0,
            attr_start: 0,
            attr_count: 0,
            depth,
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document, None, 0)
    }

    /// Create a new element node
    pub fn element(name_id: u32, parent: Option<NodeId>, depth: u16) -> Self {
        XmlNode {
            name_id,
            ..Self::with_kind(NodeKind::Element, parent, depth)
        }
    }

    /// Create an attribute node; attributes have no parent
    pub fn attribute(name_id: u32, value_id: u32, depth: u16) -> Self {
        XmlNode {
            name_id,
            value_id,
            ..Self::with_kind(NodeKind::Attribute, None, depth)
        }
    }

    /// Create a character data node (text, CDATA or comment)
    pub fn character_data(kind: NodeKind, value_id: u32, parent: Option<NodeId>, depth: u16) -> Self {
        debug_assert!(matches!(kind, NodeKind::Text | NodeKind::CData | NodeKind::Comment));
        XmlNode {
            value_id,
            ..Self::with_kind(kind, parent, depth)
        }
    }

    /// Create a processing instruction node
    pub fn processing_instruction(name_id: u32, value_id: u32, parent: Option<NodeId>, depth: u16) -> Self {
        XmlNode {
            name_id,
            value_id,
            ..Self::with_kind(NodeKind::ProcessingInstruction, parent, depth)
        }
    }

    /// Create a DOCTYPE node
    pub fn doctype(name_id: u32, parent: Option<NodeId>, depth: u16) -> Self {
        XmlNode {
            name_id,
            ..Self::with_kind(NodeKind::DocumentType, parent, depth)
        }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Check if this node has attributes
    #[inline]
    pub fn has_attributes(&self) -> bool {
        self.attr_count > 0
    }
}

/// An element that was created but never linked into a tree.
///
/// Produced by [`Document::create_element`](super::Document::create_element)
/// and compared structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedNode {
    pub kind: NodeKind,
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = XmlNode::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert_eq!(doc.depth, 0);
    }

    #[test]
    fn test_element_node() {
        let elem = XmlNode::element(1, Some(0), 1);
        assert_eq!(elem.kind, NodeKind::Element);
        assert_eq!(elem.parent, Some(0));
        assert_eq!(elem.name_id, 1);
        assert_eq!(elem.depth, 1);
        assert!(!elem.has_children());
    }

    #[test]
    fn test_attribute_has_no_parent() {
        let attr = XmlNode::attribute(2, 3, 2);
        assert_eq!(attr.kind, NodeKind::Attribute);
        assert!(attr.parent.is_none());
        assert_eq!(attr.value_id, 3);
    }
}
