//! Adapter over an arena document
//!
//! Binds [`TreeAdapter`] to any host model implementing [`DocumentAccess`].
//! Sibling positions are derived by re-filtering the parent's children, so
//! non-element siblings never shift an index.

use super::{Index, TreeAdapter, UNIVERSAL_TAG};
use crate::dom::{DocumentAccess, NodeId, NodeKind};
use crate::error::{AdapterError, Result};
use log::{debug, trace};
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Construction-time settings for [`DomAdapter`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Capacity of the per-adapter cache of filtered sibling sequences,
    /// keyed by (parent, filter name). Disabled when `None`.
    pub sibling_cache: Option<NonZeroUsize>,
}

impl AdapterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache up to `capacity` sibling sequences; 0 disables the cache
    pub fn sibling_cache(mut self, capacity: usize) -> Self {
        self.sibling_cache = NonZeroUsize::new(capacity);
        self
    }
}

type SiblingCache = LruCache<(NodeId, Box<str>), Arc<[NodeId]>>;

/// [`TreeAdapter`] over a [`DocumentAccess`] host model
pub struct DomAdapter<'d, D: DocumentAccess> {
    doc: &'d D,
    /// Resolved root element
    root: NodeId,
    /// Fixed at construction
    case_sensitive: bool,
    sibling_cache: Option<Mutex<SiblingCache>>,
}

impl<'d, D: DocumentAccess> DomAdapter<'d, D> {
    /// Create an adapter rooted at a document or element node
    pub fn new(doc: &'d D, root: NodeId) -> Result<Self> {
        Self::with_options(doc, root, AdapterOptions::default())
    }

    /// Create an adapter with explicit options
    ///
    /// # Errors
    ///
    /// [`AdapterError::Construction`] if `root` does not exist, is neither a
    /// document nor an element, or is a document without an element child.
    pub fn with_options(doc: &'d D, root: NodeId, options: AdapterOptions) -> Result<Self> {
        let resolved = resolve_root(doc, root)?;

        let case_sensitive = match doc.case_sensitive_names() {
            Some(flag) => {
                debug!("root {} resolved to {}, case sensitive: {} (reported)", root, resolved, flag);
                flag
            }
            None => {
                let flag = probe_case_sensitivity(doc);
                debug!("root {} resolved to {}, case sensitive: {} (probed)", root, resolved, flag);
                flag
            }
        };

        Ok(DomAdapter {
            doc,
            root: resolved,
            case_sensitive,
            sibling_cache: options.sibling_cache.map(|cap| Mutex::new(LruCache::new(cap))),
        })
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Element children of `node`, restricted to those whose name matches
    /// `with_name` unless it is [`UNIVERSAL_TAG`]
    pub fn children_named(&self, node: NodeId, with_name: &str) -> Vec<NodeId> {
        let children = self.doc.children_vec(node);

        if with_name == UNIVERSAL_TAG {
            return children.into_iter().filter(|&c| self.is_element(c)).collect();
        }

        children
            .into_iter()
            .filter(|&c| self.is_element(c) && self.name_matches(c, with_name))
            .collect()
    }

    #[inline]
    fn is_element(&self, node: NodeId) -> bool {
        self.doc.node_kind_of(node) == Some(NodeKind::Element)
    }

    /// Filtered children of `parent`, served from the cache when enabled
    fn sibling_set(&self, parent: NodeId, with_name: &str) -> Arc<[NodeId]> {
        let Some(cache) = &self.sibling_cache else {
            return self.children_named(parent, with_name).into();
        };

        let key = (parent, Box::<str>::from(with_name));
        if let Ok(mut cache) = cache.lock() {
            if let Some(hit) = cache.get(&key) {
                trace!("sibling cache hit for ({}, {:?})", parent, with_name);
                return Arc::clone(hit);
            }
        }

        trace!("sibling cache miss for ({}, {:?})", parent, with_name);
        let siblings: Arc<[NodeId]> = self.children_named(parent, with_name).into();
        if let Ok(mut cache) = cache.lock() {
            cache.put(key, Arc::clone(&siblings));
        }
        siblings
    }
}

/// The element a query rooted at `root` treats as `:root`
fn resolve_root<D: DocumentAccess + ?Sized>(doc: &D, root: NodeId) -> Result<NodeId> {
    let kind = doc
        .node_kind_of(root)
        .ok_or_else(|| AdapterError::Construction(format!("root node {} does not exist", root)))?;

    match kind {
        // Skip doctype, comment and PI children to reach the single element
        NodeKind::Document => doc
            .children_vec(root)
            .into_iter()
            .find(|&c| doc.node_kind_of(c) == Some(NodeKind::Element))
            .ok_or_else(|| AdapterError::Construction("there should be a root element".to_string())),
        NodeKind::Element => Ok(root),
        other => Err(AdapterError::Construction(format!(
            "root must be a document or element node, node {} is {:?}",
            root, other
        ))),
    }
}

/// Detect case handling by creating `a` and `A` and comparing them
///
/// Compatibility path for host models that cannot report
/// [`DocumentAccess::case_sensitive_names`] directly.
pub fn probe_case_sensitivity<D: DocumentAccess + ?Sized>(doc: &D) -> bool {
    let lower = doc.create_element("a");
    let upper = doc.create_element("A");
    !doc.is_equal_node(&lower, &upper)
}

impl<'d, D: DocumentAccess> TreeAdapter for DomAdapter<'d, D> {
    type Node = NodeId;

    fn value(&self, node: NodeId) -> Result<&str> {
        self.doc
            .node_value(node)
            .map(str::trim)
            .ok_or(AdapterError::NoValue { node })
    }

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.doc.attribute_node(node, name).is_some()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<&str> {
        self.doc
            .attribute_node(node, name)
            .and_then(|attr| self.doc.node_value(attr))
            .map(str::trim)
            .ok_or_else(|| AdapterError::MissingAttribute {
                node,
                name: name.to_string(),
            })
    }

    fn name(&self, node: NodeId) -> &str {
        self.doc.node_name(node).unwrap_or("")
    }

    /// Case-insensitive comparison folds ASCII letters only
    fn name_matches(&self, node: NodeId, name: &str) -> bool {
        if name == UNIVERSAL_TAG {
            return true;
        }

        let own = self.name(node);
        if self.case_sensitive {
            own == name
        } else {
            own.eq_ignore_ascii_case(name)
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.children_named(node, UNIVERSAL_TAG)
    }

    fn descendants(&self, node: NodeId) -> Result<Vec<NodeId>> {
        match self.doc.node_kind_of(node) {
            Some(NodeKind::Document | NodeKind::Element) => {
                Ok(self.doc.elements_by_tag_name(node, UNIVERSAL_TAG))
            }
            Some(kind) => Err(AdapterError::UnsupportedNodeKind { node, kind }),
            None => Err(AdapterError::UnknownNode { node }),
        }
    }

    fn is_empty(&self, node: NodeId) -> bool {
        self.doc.get_node(node).map_or(true, |n| !n.has_children())
    }

    fn index_in_parent(&self, node: NodeId, by_type: bool) -> Index {
        let with_name = if by_type { self.name(node) } else { UNIVERSAL_TAG };

        let Some(parent) = self.doc.parent_of(node) else {
            return Index::detached();
        };

        let siblings = self.sibling_set(parent, with_name);
        let position = siblings.iter().position(|&s| s == node);
        if position.is_none() {
            debug!("node {} not among the {:?} children of {}", node, with_name, parent);
        }
        Index::new(position, siblings.len())
    }

    /// A node outside its parent's element set (text, comment) counts as
    /// standing before the first element child
    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let index = self.index_in_parent(node, false);
        let next = index.position().map_or(0, |p| p + 1);
        if next >= index.size() {
            return None;
        }
        let parent = self.doc.parent_of(node)?;
        self.sibling_set(parent, UNIVERSAL_TAG).get(next).copied()
    }

    fn root(&self) -> NodeId {
        self.root
    }
}

impl<'d, D: DocumentAccess> fmt::Debug for DomAdapter<'d, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomAdapter")
            .field("root", &self.root)
            .field("case_sensitive", &self.case_sensitive)
            .field("sibling_cache", &self.sibling_cache.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DetachedNode, Document, DocumentMode, XmlNode};

    const PLAY: &[u8] = br#"<!DOCTYPE html>
<!-- generated -->
<html>
  <head>
    <meta charset="utf-8"/>
    <title>Play</title>
    <script src="a.js"></script>
    <script src="b.js"></script>
  </head>
  <body>
    <div id="scene1" class=" scene ">
      <div class="character">ROMEO</div>
      <div class="dialog" id="speech1">
        <div>But soft!</div>
        <div>What light</div>
      </div>
      between
      <span/>
      <div class="dialog"><!-- empty --></div>
    </div>
  </body>
</html>"#;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn element_by_id(doc: &Document, id: &str) -> NodeId {
        doc.descendants(0)
            .find(|&n| doc.get_attribute(n, "id") == Some(id))
            .unwrap()
    }

    /// Hides the document's own case capability so the probe runs
    struct ProbeOnly<'a>(&'a Document);

    impl DocumentAccess for ProbeOnly<'_> {
        fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
            self.0.get_node(id)
        }
        fn node_name(&self, id: NodeId) -> Option<&str> {
            self.0.node_name(id)
        }
        fn node_value(&self, id: NodeId) -> Option<&str> {
            self.0.node_value(id)
        }
        fn attribute_node(&self, id: NodeId, name: &str) -> Option<NodeId> {
            self.0.attribute_node(id, name)
        }
        fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
            self.0.children(id).collect()
        }
        fn elements_by_tag_name(&self, id: NodeId, pattern: &str) -> Vec<NodeId> {
            self.0.elements_by_tag_name(id, pattern)
        }
        fn create_element(&self, name: &str) -> DetachedNode {
            self.0.create_element(name)
        }
    }

    #[test]
    fn test_root_skips_doctype_and_comment() {
        init_logging();
        let doc = Document::parse(PLAY);
        let kinds: Vec<_> = doc.children(0).map(|c| doc.get_node(c).unwrap().kind).collect();
        assert_eq!(kinds, [NodeKind::DocumentType, NodeKind::Comment, NodeKind::Element]);

        let adapter = DomAdapter::new(&doc, 0).unwrap();
        let root = adapter.root();
        assert_eq!(doc.get_node(root).unwrap().kind, NodeKind::Element);
        assert_eq!(adapter.name(root), "html");
    }

    #[test]
    fn test_scoped_root() {
        let mut doc = Document::new(DocumentMode::Xml);
        let html = doc.append_element(0, "html", [("lang", "en")]).unwrap();
        let body = doc.append_element(html, "body", None::<(&str, &str)>).unwrap();
        let list = doc.append_element(body, "ol", None::<(&str, &str)>).unwrap();
        let items: Vec<_> = (0..10)
            .map(|_| doc.append_element(list, "li", None::<(&str, &str)>).unwrap())
            .collect();
        let fifth = items[4];

        let adapter = DomAdapter::new(&doc, fifth).unwrap();
        assert_eq!(adapter.root(), fifth);
        // Position still comes from the host tree
        assert_eq!(adapter.index_in_parent(fifth, false), Index::new(Some(4), 10));

        let whole = DomAdapter::new(&doc, 0).unwrap();
        assert_eq!(whole.root(), html);
    }

    #[test]
    fn test_construction_errors() {
        let doc = Document::parse(PLAY);
        let text = doc
            .descendants(0)
            .find(|&n| doc.get_node(n).unwrap().kind == NodeKind::Text)
            .unwrap();
        assert!(matches!(DomAdapter::new(&doc, text), Err(AdapterError::Construction(_))));
        assert!(matches!(DomAdapter::new(&doc, 99_999), Err(AdapterError::Construction(_))));

        let mut empty = Document::new(DocumentMode::Xml);
        empty.append_comment(0, "nothing here").unwrap();
        assert!(matches!(DomAdapter::new(&empty, 0), Err(AdapterError::Construction(_))));
    }

    #[test]
    fn test_index_is_rank_among_element_children() {
        let doc = Document::parse(PLAY);
        let adapter = DomAdapter::new(&doc, 0).unwrap();
        let scene = element_by_id(&doc, "scene1");

        let children = adapter.children(scene);
        let names: Vec<_> = children.iter().map(|&c| adapter.name(c)).collect();
        assert_eq!(names, ["div", "div", "span", "div"]);

        for (rank, &child) in children.iter().enumerate() {
            let index = adapter.index_in_parent(child, false);
            assert_eq!(index.position(), Some(rank));
            assert_eq!(index.size(), children.len());
        }
    }

    #[test]
    fn test_index_by_type() {
        let doc = Document::parse(PLAY);
        let adapter = DomAdapter::new(&doc, 0).unwrap();
        let scene = element_by_id(&doc, "scene1");
        let children = adapter.children(scene);

        let span = children[2];
        assert_eq!(adapter.index_in_parent(span, true), Index::new(Some(0), 1));
        assert!(adapter.index_in_parent(span, true).is_only());

        let last_div = children[3];
        assert_eq!(adapter.index_in_parent(last_div, true), Index::new(Some(2), 3));
        assert!(adapter.index_in_parent(last_div, false).is_last());

        for &child in &children {
            let typed = adapter.index_in_parent(child, true);
            let untyped = adapter.index_in_parent(child, false);
            assert!(typed.size() < untyped.size());
        }

        // All siblings share the name: sizes agree
        let speech = element_by_id(&doc, "speech1");
        for child in adapter.children(speech) {
            assert_eq!(
                adapter.index_in_parent(child, true),
                adapter.index_in_parent(child, false)
            );
        }
    }

    #[test]
    fn test_nth_child_odd() {
        let doc = Document::parse(b"<ul>x<li/><li/>y<li/><!-- c --><li/><li/></ul>");
        let adapter = DomAdapter::new(&doc, 0).unwrap();
        let ul = adapter.root();

        let odd: Vec<_> = adapter
            .children(ul)
            .into_iter()
            .filter(|&li| adapter.index_in_parent(li, false).nth().is_some_and(|n| n % 2 == 1))
            .map(|li| adapter.index_in_parent(li, false).position().unwrap())
            .collect();
        assert_eq!(odd, [0, 2, 4]);
    }

    #[test]
    fn test_detached_and_unlisted_handles_are_permissive() {
        let doc = Document::parse(PLAY);
        let adapter = DomAdapter::new(&doc, 0).unwrap();

        // Document node and attribute nodes have no parent
        assert_eq!(adapter.index_in_parent(0, false), Index::detached());
        let scene = element_by_id(&doc, "scene1");
        let class = doc.attribute_node(scene, "class").unwrap();
        assert_eq!(adapter.index_in_parent(class, true), Index::detached());
        assert_eq!(adapter.index_in_parent(99_999, false), Index::detached());

        // Permissive: a node with a parent but outside the element set is
        // reported as not found rather than as an error
        let text = doc
            .children(scene)
            .find(|&c| doc.node_value(c).is_some_and(|v| v.trim() == "between"))
            .unwrap();
        let index = adapter.index_in_parent(text, false);
        assert_eq!(index.position(), None);
        assert_eq!(index.as_signed(), (-1, 4));
        // Not found still yields the first element child
        assert_eq!(adapter.next_sibling(text), Some(adapter.children(scene)[0]));

        assert_eq!(adapter.next_sibling(0), None);
        assert_eq!(adapter.next_sibling(class), None);
        assert_eq!(adapter.next_sibling(99_999), None);
    }

    #[test]
    fn test_next_sibling_of_text_before_elements() {
        let doc = Document::parse(b"<r>lead<a/><b/></r>");
        let adapter = DomAdapter::new(&doc, 0).unwrap();
        let r = adapter.root();
        let lead = doc.children(r).next().unwrap();

        assert_eq!(adapter.index_in_parent(lead, false).as_signed(), (-1, 2));
        assert_eq!(adapter.next_sibling(lead), Some(adapter.children(r)[0]));

        // No element children: nothing to return
        let only_text = Document::parse(b"<r>alone</r>");
        let adapter = DomAdapter::new(&only_text, 0).unwrap();
        let text = only_text.children(adapter.root()).next().unwrap();
        assert_eq!(adapter.next_sibling(text), None);
    }

    #[test]
    fn test_next_sibling_skips_non_elements() {
        let doc = Document::parse(PLAY);
        let adapter = DomAdapter::new(&doc, 0).unwrap();
        let scene = element_by_id(&doc, "scene1");
        let children = adapter.children(scene);

        for pair in children.windows(2) {
            assert_eq!(adapter.next_sibling(pair[0]), Some(pair[1]));
        }

        let last = *children.last().unwrap();
        let index = adapter.index_in_parent(last, false);
        assert_eq!(index.position(), Some(index.size() - 1));
        assert_eq!(adapter.next_sibling(last), None);
        assert_eq!(adapter.next_sibling(adapter.root()), None);
    }

    #[test]
    fn test_children_len_matches_index_size() {
        let doc = Document::parse(PLAY);
        let adapter = DomAdapter::new(&doc, 0).unwrap();

        for node in adapter.descendants(0).unwrap() {
            let children = adapter.children(node);
            if let Some(&any) = children.first() {
                assert_eq!(children.len(), adapter.index_in_parent(any, false).size());
            }
        }
    }

    #[test]
    fn test_children_named() {
        let doc = Document::parse(PLAY);
        let adapter = DomAdapter::new(&doc, 0).unwrap();
        let head = adapter.children(adapter.root())[0];

        assert_eq!(adapter.children_named(head, "script").len(), 2);
        assert_eq!(adapter.children_named(head, "SCRIPT").len(), 0);
        assert_eq!(adapter.children_named(head, "*").len(), 4);
        assert_eq!(adapter.children_named(head, "#text").len(), 0);
    }

    #[test]
    fn test_case_sensitivity() {
        let xml = Document::parse(b"<div><p/></div>");
        let adapter = DomAdapter::new(&xml, 0).unwrap();
        assert!(adapter.is_case_sensitive());
        let div = adapter.root();
        assert!(adapter.name_matches(div, "div"));
        assert!(!adapter.name_matches(div, "DIV"));
        assert!(!adapter.name_matches(div, "Div"));
        assert!(adapter.name_matches(div, UNIVERSAL_TAG));

        let html = Document::parse_html(b"<DIV><P></P></DIV>");
        let adapter = DomAdapter::new(&html, 0).unwrap();
        assert!(!adapter.is_case_sensitive());
        let div = adapter.root();
        assert_eq!(adapter.name(div), "div");
        assert!(adapter.name_matches(div, "DIV"));
        assert!(adapter.name_matches(div, "Div"));
        assert_eq!(adapter.children_named(div, "p").len(), 1);
    }

    #[test]
    fn test_probe_agrees_with_reported_mode() {
        init_logging();
        for doc in [Document::parse(b"<r/>"), Document::parse_html(b"<r></r>")] {
            let reported = DomAdapter::new(&doc, 0).unwrap().is_case_sensitive();
            let access = ProbeOnly(&doc);
            assert_eq!(access.case_sensitive_names(), None);
            let probed = DomAdapter::new(&access, 0).unwrap();
            assert_eq!(probed.is_case_sensitive(), reported);
            assert_eq!(probed.name(probed.root()), "r");
        }
    }

    #[test]
    fn test_descendants() {
        let doc = Document::parse(PLAY);
        let adapter = DomAdapter::new(&doc, 0).unwrap();

        let all = adapter.descendants(0).unwrap();
        let names: Vec<_> = all.iter().map(|&n| adapter.name(n)).collect();
        assert_eq!(
            names,
            [
                "html", "head", "meta", "title", "script", "script", "body", "div", "div", "div",
                "div", "div", "span", "div"
            ]
        );

        let scene = element_by_id(&doc, "scene1");
        assert_eq!(adapter.descendants(scene).unwrap().len(), 6);

        let text = doc.children(scene).next().unwrap();
        assert!(matches!(
            adapter.descendants(text),
            Err(AdapterError::UnsupportedNodeKind { kind: NodeKind::Text, .. })
        ));
        assert!(matches!(adapter.descendants(99_999), Err(AdapterError::UnknownNode { .. })));
    }

    #[test]
    fn test_is_empty() {
        let doc = Document::parse(PLAY);
        let adapter = DomAdapter::new(&doc, 0).unwrap();
        let scene = element_by_id(&doc, "scene1");
        let children = adapter.children(scene);

        let span = children[2];
        assert!(adapter.is_empty(span));
        assert!(adapter.children(span).is_empty());

        // Only a comment inside: no element children, yet not empty
        let commented = children[3];
        assert!(adapter.children(commented).is_empty());
        assert!(!adapter.is_empty(commented));

        let character = children[0];
        assert!(!adapter.is_empty(character));
    }

    #[test]
    fn test_values_and_attributes() {
        let doc = Document::parse(PLAY);
        let adapter = DomAdapter::new(&doc, 0).unwrap();
        let scene = element_by_id(&doc, "scene1");

        assert!(adapter.has_attribute(scene, "class"));
        assert_eq!(adapter.attribute(scene, "class").unwrap(), "scene");
        assert!(!adapter.has_attribute(scene, "title"));
        assert_eq!(
            adapter.attribute(scene, "title"),
            Err(AdapterError::MissingAttribute { node: scene, name: "title".to_string() })
        );

        let character = adapter.children(scene)[0];
        let text = doc.children(character).next().unwrap();
        assert_eq!(adapter.value(text).unwrap(), "ROMEO");
        assert_eq!(adapter.value(character), Err(AdapterError::NoValue { node: character }));

        let class = doc.attribute_node(scene, "class").unwrap();
        assert_eq!(adapter.value(class).unwrap(), "scene");
        assert_eq!(adapter.name(class), "class");
    }

    #[test]
    fn test_sibling_cache_preserves_results() {
        init_logging();
        let doc = Document::parse(PLAY);
        let plain = DomAdapter::new(&doc, 0).unwrap();
        let cached = DomAdapter::with_options(&doc, 0, AdapterOptions::new().sibling_cache(2)).unwrap();

        let nodes = plain.descendants(0).unwrap();
        for _ in 0..2 {
            for &node in &nodes {
                for by_type in [false, true] {
                    assert_eq!(cached.index_in_parent(node, by_type), plain.index_in_parent(node, by_type));
                }
                assert_eq!(cached.next_sibling(node), plain.next_sibling(node));
            }
        }

        let disabled = AdapterOptions::new().sibling_cache(0);
        assert_eq!(disabled.sibling_cache, None);
    }

    #[test]
    fn test_adapter_is_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DomAdapter<'static, Document>>();
    }
}
