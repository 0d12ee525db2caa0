//! Content node types

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kind of a plain paragraph node
pub const PARAGRAPH_KIND: &str = "core/paragraph";

/// Kind of a reference node standing in for a shared block
pub const REFERENCE_KIND: &str = "core/block";

/// Attribute holding a reference node's target entity id
pub const REFERENCE_ATTR: &str = "ref";

/// Attribute holding a text node's rich-text content
const CONTENT_ATTR: &str = "content";

/// Identity of a node within a document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a fresh, random node id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A node of a document's structural tree
///
/// `kind` discriminates the node type; `attributes` carry its data and
/// `children` its ordered descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: NodeId,
    pub kind: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    /// Create an empty node of the given kind with a fresh id
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            kind: kind.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Create a paragraph holding `text`
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(PARAGRAPH_KIND).with_attribute(CONTENT_ATTR, Value::String(text.into()))
    }

    /// Create a reference node pointing at a shared entity
    ///
    /// Reference nodes hold only the entity id, never content.
    pub fn reference(entity_id: impl Into<String>) -> Self {
        Self::new(REFERENCE_KIND).with_attribute(REFERENCE_ATTR, Value::String(entity_id.into()))
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<ContentNode>) -> Self {
        self.children = children;
        self
    }

    /// Whether this node stands in for a shared entity
    pub fn is_reference(&self) -> bool {
        self.kind == REFERENCE_KIND
    }

    /// Entity id a reference node points at
    pub fn reference_target(&self) -> Option<&str> {
        if !self.is_reference() {
            return None;
        }
        self.attributes.get(REFERENCE_ATTR).and_then(Value::as_str)
    }

    /// The node's own text content, if it has any
    pub fn text(&self) -> Option<&str> {
        self.attributes.get(CONTENT_ATTR).and_then(Value::as_str)
    }

    /// Replace the node's own text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.attributes
            .insert(CONTENT_ATTR.to_string(), Value::String(text.into()));
    }

    /// Concatenated text of this node and its descendants, depth-first
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = self.text() {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Depth-first, pre-order iterator over this node and its descendants
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Deep copy with fresh ids for this node and every descendant
    pub fn fresh_copy(&self) -> Self {
        Self {
            id: NodeId::new(),
            kind: self.kind.clone(),
            attributes: self.attributes.clone(),
            children: self.children.iter().map(Self::fresh_copy).collect(),
        }
    }

    /// Structural equality: kind, attributes and child order, ignoring ids
    pub fn structurally_eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.attributes == other.attributes
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.structurally_eq(b))
    }
}

/// Iterator returned by [`ContentNode::descendants`]
pub struct Descendants<'a> {
    stack: Vec<&'a ContentNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a ContentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
