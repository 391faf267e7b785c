//! DOM collaborator seam and an arena-backed in-memory document.
//!
//! The engine never touches a real DOM. Everything it needs (finding
//! links, binding listeners, filling regions) goes through
//! [`DomAdapter`].

/// Handle to an element owned by a [`DomAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Element queries and mutations the engine performs.
pub trait DomAdapter {
    /// The document's root element.
    fn document_root(&self) -> NodeId;

    /// Descendants of `root` carrying `class`, in document order.
    fn find_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId>;

    /// The attached element with the given `id` attribute.
    fn find_by_id(&self, id: &str) -> Option<NodeId>;

    /// Route `event` on `element` to the engine.
    ///
    /// Binding the same event twice must not produce two deliveries.
    fn attach_listener(&mut self, element: NodeId, event: &str);

    fn set_attribute(&mut self, elements: &[NodeId], name: &str, value: &str);

    /// `node` itself or its nearest ancestor with the given tag name.
    fn resolve_ancestor(&self, node: NodeId, tag: &str) -> Option<NodeId>;

    fn attribute(&self, element: NodeId, name: &str) -> Option<String>;

    fn has_class(&self, element: NodeId, class: &str) -> bool;

    /// Replace the content of `element` with `markup`.
    fn set_content(&mut self, element: NodeId, markup: &str);
}

// -------------------------------------------------------------------
// MemoryDom
// -------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Markup written by [`DomAdapter::set_content`].
    content: Option<String>,
    listeners: Vec<String>,
}

/// An in-memory element tree.
///
/// Nodes live in a flat arena and are linked by index. Replacing an
/// element's content detaches its children; detached nodes stay in the
/// arena but are unreachable from the root.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<Element>,
}

impl MemoryDom {
    /// A document holding only a `body` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Element {
                tag: "body".to_string(),
                attributes: Vec::new(),
                parent: None,
                children: Vec::new(),
                content: None,
                listeners: Vec::new(),
            }],
        }
    }

    /// Append a child element to `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not created by this document.
    pub fn append(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element {
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            parent: Some(parent),
            children: Vec::new(),
            content: None,
            listeners: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Markup last written into `element`.
    pub fn content(&self, element: NodeId) -> Option<&str> {
        self.node(element)?.content.as_deref()
    }

    /// Content of the element with the given id.
    pub fn content_of(&self, id: &str) -> Option<&str> {
        self.content(self.find_by_id(id)?)
    }

    /// Events bound on `element`.
    pub fn listeners(&self, element: NodeId) -> &[String] {
        self.node(element)
            .map(|n| n.listeners.as_slice())
            .unwrap_or(&[])
    }

    fn node(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    /// Descendants of `root` in document order (pre-order, root excluded).
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(node) = self.node(root) else {
            return out;
        };
        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.node(id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl DomAdapter for MemoryDom {
    fn document_root(&self) -> NodeId {
        NodeId(0)
    }

    fn find_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.has_class(id, class))
            .collect()
    }

    fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let root = self.document_root();
        std::iter::once(root)
            .chain(self.descendants(root))
            .find(|&n| self.attribute(n, "id").as_deref() == Some(id))
    }

    fn attach_listener(&mut self, element: NodeId, event: &str) {
        if let Some(node) = self.nodes.get_mut(element.0)
            && !node.listeners.iter().any(|e| e == event)
        {
            node.listeners.push(event.to_string());
        }
    }

    fn set_attribute(&mut self, elements: &[NodeId], name: &str, value: &str) {
        for id in elements {
            let Some(node) = self.nodes.get_mut(id.0) else {
                continue;
            };
            match node.attributes.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => node.attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn resolve_ancestor(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id)?;
            if n.tag.eq_ignore_ascii_case(tag) {
                return Some(id);
            }
            current = n.parent;
        }
        None
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<String> {
        self.node(element)?
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn has_class(&self, element: NodeId, class: &str) -> bool {
        self.attribute(element, "class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    fn set_content(&mut self, element: NodeId, markup: &str) {
        let Some(node) = self.nodes.get_mut(element.0) else {
            return;
        };
        node.content = Some(markup.to_string());
        let children = std::mem::take(&mut node.children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }
}
