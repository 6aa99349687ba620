//! Document - Arena-based DOM representation
//!
//! Efficient DOM storage with:
//! - Arena allocation for nodes
//! - NodeId indices for traversal
//! - String interning for names and values
//!
//! Node 0 is always the document node. Attributes are arena nodes too, so
//! they can be handed out as handles, but they have no parent and never
//! appear in a child list.

use super::node::{DetachedNode, NodeId, NodeKind, XmlNode};
use super::strings::StringPool;
use super::DocumentAccess;
use crate::error::{AdapterError, Result};
use crate::reader::events::XmlEvent;
use crate::reader::slice::SliceReader;
use std::collections::HashSet;

/// HTML elements that never have content
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// How a document treats element names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentMode {
    /// Names are kept verbatim and compared exactly
    #[default]
    Xml,
    /// Element and attribute names are ASCII-lowercased on creation
    Html,
}

/// An owned document stored in arena format
#[derive(Debug)]
pub struct Document {
    mode: DocumentMode,
    /// Arena of nodes
    nodes: Vec<XmlNode>,
    /// Attribute node ids, sliced per element by `attr_start`/`attr_count`
    attributes: Vec<NodeId>,
    /// Interned strings
    pub strings: StringPool,
    /// Root element node ID (not document node)
    root_element: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DocumentMode::Xml)
    }
}

impl Document {
    /// Create an empty document holding only the document node
    pub fn new(mode: DocumentMode) -> Self {
        let mut nodes = Vec::with_capacity(256);
        nodes.push(XmlNode::document());
        Document {
            mode,
            nodes,
            attributes: Vec::with_capacity(128),
            strings: StringPool::new(),
            root_element: None,
        }
    }

    /// Parse an XML document (lenient mode)
    pub fn parse(input: &[u8]) -> Self {
        let text = String::from_utf8_lossy(input);
        let mut doc = Document::new(DocumentMode::Xml);
        // Lenient mode never fails
        let _ = doc.build_from_events(SliceReader::new(&text), false);
        doc
    }

    /// Parse an HTML-flavoured document (lenient mode)
    ///
    /// Names are lowercased and void elements such as `<meta>` close themselves.
    pub fn parse_html(input: &[u8]) -> Self {
        let text = String::from_utf8_lossy(input);
        let mut doc = Document::new(DocumentMode::Html);
        let _ = doc.build_from_events(SliceReader::html(&text), false);
        doc
    }

    /// Parse an XML document in strict mode
    ///
    /// Returns Err on mismatched, unexpected or unclosed tags, text or
    /// several elements at document level, and unterminated markup.
    pub fn parse_strict(input: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(input).map_err(|e| AdapterError::Parse(e.to_string()))?;
        let mut doc = Document::new(DocumentMode::Xml);
        doc.build_from_events(SliceReader::new(text), true)?;
        Ok(doc)
    }

    /// Build the tree from reader events
    fn build_from_events(&mut self, mut reader: SliceReader<'_>, strict: bool) -> Result<()> {
        // Open elements with the name as written in the source
        let mut stack: Vec<(NodeId, &str)> = Vec::new();
        let mut root_count = 0u32;

        while let Some(event) = reader.next_event() {
            let parent = stack.last().map_or(0, |&(id, _)| id);

            if strict && stack.is_empty() {
                if let XmlEvent::StartElement(elem) | XmlEvent::EmptyElement(elem) = &event {
                    root_count += 1;
                    if root_count > 1 {
                        return Err(AdapterError::Parse(format!(
                            "Document has multiple root elements, second is <{}>",
                            elem.name
                        )));
                    }
                }
            }

            match event {
                XmlEvent::StartElement(elem) => {
                    let id = self.append_element(parent, elem.name, attribute_pairs(&elem.attributes))?;
                    if !self.is_void(elem.name) {
                        stack.push((id, elem.name));
                    }
                }

                XmlEvent::EmptyElement(elem) => {
                    self.append_element(parent, elem.name, attribute_pairs(&elem.attributes))?;
                }

                XmlEvent::EndElement(end) => {
                    let open = stack.iter().rposition(|&(_, name)| self.names_equal(name, end.name));
                    match open {
                        Some(pos) if !strict || pos + 1 == stack.len() => stack.truncate(pos),
                        Some(_) => {
                            let (_, name) = stack[stack.len() - 1];
                            return Err(AdapterError::Parse(format!(
                                "Tag mismatch: <{}> closed with </{}>",
                                name, end.name
                            )));
                        }
                        None if strict => {
                            return Err(AdapterError::Parse(format!(
                                "Unexpected end tag: </{}> without matching start tag",
                                end.name
                            )));
                        }
                        // Lenient: stray end tags are dropped, void end tags included
                        None => {}
                    }
                }

                XmlEvent::Text(content) => {
                    if stack.is_empty() {
                        if strict && !content.trim().is_empty() {
                            return Err(AdapterError::Parse(
                                "Text content not allowed at document level".to_string(),
                            ));
                        }
                        continue;
                    }
                    self.append_text(parent, &content)?;
                }

                XmlEvent::CData(content) => {
                    if stack.is_empty() {
                        if strict {
                            return Err(AdapterError::Parse(
                                "CDATA section not allowed at document level".to_string(),
                            ));
                        }
                        continue;
                    }
                    self.append_cdata(parent, content)?;
                }

                XmlEvent::Comment(content) => {
                    self.append_comment(parent, content)?;
                }

                XmlEvent::ProcessingInstruction { target, data } => {
                    self.append_processing_instruction(parent, target, data.unwrap_or(""))?;
                }

                XmlEvent::DocType(name) => {
                    if stack.is_empty() && self.root_element.is_none() {
                        self.append_doctype(name)?;
                    } else if strict {
                        return Err(AdapterError::Parse(
                            "DOCTYPE must come before root element".to_string(),
                        ));
                    }
                }

                XmlEvent::XmlDeclaration => {}
            }

            if strict {
                if let Some(msg) = reader.error() {
                    return Err(AdapterError::Parse(msg.to_string()));
                }
            }
        }

        if strict {
            if let Some(msg) = reader.error() {
                return Err(AdapterError::Parse(msg.to_string()));
            }
            if let Some(&(_, name)) = stack.first() {
                return Err(AdapterError::Parse(format!("Unclosed tag: <{}>", name)));
            }
        }

        Ok(())
    }

    // =========================================================================
    // Builder
    // =========================================================================

    fn normalize<'n>(&self, name: &'n str) -> std::borrow::Cow<'n, str> {
        match self.mode {
            DocumentMode::Html if name.bytes().any(|b| b.is_ascii_uppercase()) => {
                std::borrow::Cow::Owned(name.to_ascii_lowercase())
            }
            _ => std::borrow::Cow::Borrowed(name),
        }
    }

    fn is_void(&self, name: &str) -> bool {
        self.mode == DocumentMode::Html && VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
    }

    /// Name comparison as this document's mode defines it
    #[inline]
    pub fn names_equal(&self, a: &str, b: &str) -> bool {
        match self.mode {
            DocumentMode::Xml => a == b,
            DocumentMode::Html => a.eq_ignore_ascii_case(b),
        }
    }

    /// Check that `parent` may take a child of `child` kind and return its depth
    fn child_depth(&self, parent: NodeId, child: NodeKind) -> Result<u16> {
        let node = self
            .get_node(parent)
            .ok_or(AdapterError::InvalidParent { parent, child })?;
        let allowed = match node.kind {
            NodeKind::Element => child != NodeKind::DocumentType,
            NodeKind::Document => matches!(
                child,
                NodeKind::Element | NodeKind::Comment | NodeKind::ProcessingInstruction | NodeKind::DocumentType
            ),
            _ => false,
        };
        if !allowed {
            return Err(AdapterError::InvalidParent { parent, child });
        }
        Ok(node.depth.saturating_add(1))
    }

    /// Append a new element with its attributes as the last child of `parent`
    ///
    /// Attribute names are unique per element; the first occurrence wins.
    pub fn append_element<I, N, V>(&mut self, parent: NodeId, name: &str, attributes: I) -> Result<NodeId>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let depth = self.child_depth(parent, NodeKind::Element)?;
        let name = self.normalize(name);
        let name_id = self.strings.intern(&name);
        let mut node = XmlNode::element(name_id, Some(parent), depth);

        let attr_start = self.attributes.len();
        let mut seen = HashSet::new();
        for (attr_name, attr_value) in attributes {
            let attr_name = self.normalize(attr_name.as_ref());
            let attr_name_id = self.strings.intern(&attr_name);
            if !seen.insert(attr_name_id) {
                continue;
            }
            let value_id = self.strings.intern(attr_value.as_ref());
            let attr_id = self.next_node_id()?;
            self.nodes.push(XmlNode::attribute(attr_name_id, value_id, depth));
            self.attributes.push(attr_id);
        }
        node.attr_start = u32::try_from(attr_start).map_err(|_| AdapterError::ArenaFull)?;
        node.attr_count = u32::try_from(self.attributes.len() - attr_start).map_err(|_| AdapterError::ArenaFull)?;

        let node_id = self.push_child(parent, node)?;
        if self.root_element.is_none() && parent == 0 {
            self.root_element = Some(node_id);
        }
        Ok(node_id)
    }

    /// Append a text node
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        self.append_character_data(parent, NodeKind::Text, text)
    }

    /// Append a CDATA section
    pub fn append_cdata(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        self.append_character_data(parent, NodeKind::CData, text)
    }

    /// Append a comment
    pub fn append_comment(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        self.append_character_data(parent, NodeKind::Comment, text)
    }

    fn append_character_data(&mut self, parent: NodeId, kind: NodeKind, text: &str) -> Result<NodeId> {
        let depth = self.child_depth(parent, kind)?;
        let value_id = self.strings.intern(text);
        self.push_child(parent, XmlNode::character_data(kind, value_id, Some(parent), depth))
    }

    /// Append a processing instruction
    pub fn append_processing_instruction(&mut self, parent: NodeId, target: &str, data: &str) -> Result<NodeId> {
        let depth = self.child_depth(parent, NodeKind::ProcessingInstruction)?;
        let name_id = self.strings.intern(target);
        let value_id = self.strings.intern(data);
        let node = XmlNode::processing_instruction(name_id, value_id, Some(parent), depth);
        self.push_child(parent, node)
    }

    /// Append a DOCTYPE declaration to the document node
    pub fn append_doctype(&mut self, name: &str) -> Result<NodeId> {
        let depth = self.child_depth(0, NodeKind::DocumentType)?;
        let name_id = self.strings.intern(name);
        self.push_child(0, XmlNode::doctype(name_id, Some(0), depth))
    }

    /// Add a node to the arena and link it as the last child of `parent`
    fn push_child(&mut self, parent: NodeId, node: XmlNode) -> Result<NodeId> {
        let child_id = self.next_node_id()?;
        self.nodes.push(node);

        // Get parent's last_child first to avoid borrow issues
        let last_child_opt = self.nodes[parent as usize].last_child;

        if let Some(last_child_id) = last_child_opt {
            self.nodes[child_id as usize].prev_sibling = Some(last_child_id);
            self.nodes[last_child_id as usize].next_sibling = Some(child_id);
        } else {
            self.nodes[parent as usize].first_child = Some(child_id);
        }
        self.nodes[parent as usize].last_child = Some(child_id);
        Ok(child_id)
    }

    /// Id the next arena node will get
    fn next_node_id(&self) -> Result<NodeId> {
        NodeId::try_from(self.nodes.len()).map_err(|_| AdapterError::ArenaFull)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Document mode
    pub fn mode(&self) -> DocumentMode {
        self.mode
    }

    /// Get the document node ID (always 0)
    pub fn document_node_id(&self) -> NodeId {
        0
    }

    /// Get root element ID (first element child of the document node)
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    /// Get the node's name following DOM `nodeName` conventions
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element
            | NodeKind::Attribute
            | NodeKind::ProcessingInstruction
            | NodeKind::DocumentType => self.strings.get_str(node.name_id),
            NodeKind::Document => Some("#document"),
            NodeKind::Text => Some("#text"),
            NodeKind::CData => Some("#cdata-section"),
            NodeKind::Comment => Some("#comment"),
        }
    }

    /// Get the node's textual value, if its kind carries one
    pub fn node_value(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Text
            | NodeKind::CData
            | NodeKind::Comment
            | NodeKind::Attribute
            | NodeKind::ProcessingInstruction => self.strings.get_str(node.value_id),
            NodeKind::Document | NodeKind::Element | NodeKind::DocumentType => None,
        }
    }

    /// Get the parent of a node
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    /// Attribute node ids of an element, in source order
    pub fn attribute_nodes(&self, id: NodeId) -> &[NodeId] {
        match self.get_node(id) {
            Some(node) if node.is_element() && node.has_attributes() => {
                let start = node.attr_start as usize;
                let end = start + node.attr_count as usize;
                self.attributes.get(start..end).unwrap_or(&[])
            }
            _ => &[],
        }
    }

    /// Find an attribute node by name
    ///
    /// Attribute names are normalized on creation, so a name that was never
    /// interned cannot be present.
    pub fn attribute_node(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let name_id = self.strings.lookup(&self.normalize(name))?;
        self.attribute_nodes(id)
            .iter()
            .copied()
            .find(|&attr| self.nodes[attr as usize].name_id == name_id)
    }

    /// Get attribute value by name
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attribute_node(id, name).and_then(|attr| self.node_value(attr))
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over all descendants of a node in document order
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        // Initialize stack with all children in reverse order (so first is processed first)
        let mut stack = Vec::new();
        if let Some(node) = self.get_node(id) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                stack.push(cid);
                child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
            }
        }
        DescendantIter { doc: self, stack }
    }

    /// Element descendants whose name matches `pattern` (`"*"` matches all)
    pub fn elements_by_tag_name(&self, id: NodeId, pattern: &str) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|&d| {
                self.get_node(d).is_some_and(XmlNode::is_element)
                    && (pattern == "*" || self.node_name(d).is_some_and(|n| self.names_equal(n, pattern)))
            })
            .collect()
    }

    /// Create an element that is not linked into the tree
    pub fn create_element(&self, name: &str) -> DetachedNode {
        DetachedNode {
            kind: NodeKind::Element,
            name: self.normalize(name).into_owned(),
            attributes: Vec::new(),
        }
    }

    /// Structural equality of two detached nodes
    pub fn is_equal_node(&self, a: &DetachedNode, b: &DetachedNode) -> bool {
        a == b
    }

    /// Get total number of nodes, attributes included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn attribute_pairs<'e>(attrs: &'e [crate::reader::events::Attribute<'_>]) -> impl Iterator<Item = (&'e str, &'e str)> {
    attrs.iter().map(|a| (a.name, a.value.as_ref()))
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d Document,
    next: Option<NodeId>,
}

impl<'d> Iterator for ChildIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes (depth-first)
pub struct DescendantIter<'d> {
    doc: &'d Document,
    stack: Vec<NodeId>,
}

impl<'d> Iterator for DescendantIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Add children to stack in reverse order (so first child is processed first)
        if let Some(node) = self.doc.get_node(current) {
            let mut child_id = node.last_child;
            while let Some(id) = child_id {
                self.stack.push(id);
                child_id = self.doc.get_node(id).and_then(|n| n.prev_sibling);
            }
        }

        Some(current)
    }
}

// =============================================================================
// DocumentAccess trait implementation
// =============================================================================

impl DocumentAccess for Document {
    fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    fn node_name(&self, id: NodeId) -> Option<&str> {
        Document::node_name(self, id)
    }

    fn node_value(&self, id: NodeId) -> Option<&str> {
        Document::node_value(self, id)
    }

    fn attribute_node(&self, id: NodeId, name: &str) -> Option<NodeId> {
        Document::attribute_node(self, id, name)
    }

    fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    fn elements_by_tag_name(&self, id: NodeId, pattern: &str) -> Vec<NodeId> {
        Document::elements_by_tag_name(self, id, pattern)
    }

    fn create_element(&self, name: &str) -> DetachedNode {
        Document::create_element(self, name)
    }

    fn is_equal_node(&self, a: &DetachedNode, b: &DetachedNode) -> bool {
        Document::is_equal_node(self, a, b)
    }

    fn case_sensitive_names(&self) -> Option<bool> {
        Some(self.mode == DocumentMode::Xml)
    }
}
