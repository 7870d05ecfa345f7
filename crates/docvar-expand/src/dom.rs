//! Arena document model
//!
//! Nodes live in a single vector and refer to each other by [`NodeId`].
//! Detaching a node only unlinks it, so ids stay valid and a detached
//! subtree can be re-attached later. Ids are only meaningful for the
//! document that created them; passing a foreign id panics.
//!
//! Text nodes and attributes written by an expansion pass are sealed, and
//! later passes leave sealed content alone.

use crate::html;
use std::collections::HashSet;

/// Index of a node in its [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the arena
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Document root
    Root,
    /// `<!DOCTYPE ...>` declaration
    Doctype(String),
    /// Element with lowercase tag name and attributes in source order
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    /// Decoded character data
    Text(String),
    /// Comment body
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Mutable document tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    sealed_text: HashSet<NodeId>,
    sealed_attributes: HashSet<(NodeId, String)>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document holding only the root
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
            }],
            sealed_text: HashSet::new(),
            sealed_attributes: HashSet::new(),
        }
    }

    /// Parse markup into a new document
    #[must_use]
    pub fn parse(markup: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root();
        html::parse_into(&mut doc, root, markup);
        doc
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Whether `id` was created by this document
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Payload of a node
    #[inline]
    #[must_use]
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    /// Parent of a node, `None` for the root and detached nodes
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Children in document order
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// All nodes below `id` in document order, excluding `id`
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            found.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        found
    }

    fn create(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str, attributes: Vec<(String, String)>) -> NodeId {
        self.create(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes,
        })
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeData::Text(text.into()))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeData::Comment(text.into()))
    }

    pub(crate) fn create_doctype(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeData::Doctype(text.into()))
    }

    /// Unlink a node from its parent
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Move `child` to the end of `parent`'s children
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Move `child` right before `reference`
    ///
    /// Returns `false` when `reference` has no parent.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> bool {
        let Some(parent) = self.nodes[reference.0].parent else {
            return false;
        };
        self.detach(child);
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == reference)
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(position, child);
        true
    }

    /// Put `replacement` where `old` is and detach `old`
    pub fn replace_node(&mut self, old: NodeId, replacement: NodeId) -> bool {
        let inserted = self.insert_before(old, replacement);
        if inserted {
            self.detach(old);
        }
        inserted
    }

    /// Detach every child of `id`
    pub fn clear_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    /// Tag name of an element
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Value of an attribute
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id) {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Set or add an attribute; ignored for non-elements
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => value.clone_into(v),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Attributes of an element in source order, empty for other nodes
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.data(id) {
            NodeData::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Remove an attribute if present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            attributes.retain(|(n, _)| n != name);
        }
    }

    /// Whether the `class` attribute lists `class`
    #[must_use]
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Add a class unless present
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let classes = match self.attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", &classes);
    }

    /// Remove a class; the attribute is dropped once empty
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(existing) = self.attribute(id, "class") else {
            return;
        };
        let remaining: Vec<&str> = existing
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        let remaining = remaining.join(" ");
        if remaining.is_empty() {
            self.remove_attribute(id, "class");
        } else {
            self.set_attribute(id, "class", &remaining);
        }
    }

    /// Content of a text node
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Replace the content of a text node; ignored for other nodes
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let NodeData::Text(existing) = &mut self.nodes[id.0].data {
            *existing = text.into();
        }
    }

    /// Mark a text node as substituted output
    pub(crate) fn seal_text(&mut self, id: NodeId) {
        self.sealed_text.insert(id);
    }

    /// Whether a text node holds substituted output
    #[must_use]
    pub fn is_sealed_text(&self, id: NodeId) -> bool {
        self.sealed_text.contains(&id)
    }

    /// Mark an attribute value as substituted output
    pub(crate) fn seal_attribute(&mut self, id: NodeId, name: &str) {
        self.sealed_attributes.insert((id, name.to_string()));
    }

    /// Whether an attribute value holds substituted output
    #[must_use]
    pub fn is_sealed_attribute(&self, id: NodeId, name: &str) -> bool {
        self.sealed_attributes.contains(&(id, name.to_string()))
    }

    /// Concatenated text of all descendant text nodes
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if self.text(id).is_some() {
            self.set_text(id, text);
            return;
        }
        self.clear_children(id);
        if !text.is_empty() {
            let child = self.create_text(text);
            self.append_child(id, child);
        }
    }

    /// Serialized children of `id`
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        html::serialize_children(self, id, &mut out);
        out
    }

    /// Serialized node including itself
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        html::serialize_node(self, id, &mut out);
        out
    }

    /// Replace the children of `id` with parsed markup
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) {
        self.clear_children(id);
        html::parse_into(self, id, markup);
    }

    /// Whole document as markup
    #[must_use]
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    /// Elements below `id` in document order matching `predicate`
    pub fn find_elements(&self, id: NodeId, predicate: impl Fn(&Self, NodeId) -> bool) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.tag(node).is_some() && predicate(self, node))
            .collect()
    }
}
