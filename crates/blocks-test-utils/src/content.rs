//! Document and content builders.

use blocks_tree::{ContentNode, DocumentTree};

/// A document with one paragraph per entry of `texts`.
///
/// # Panics
/// Never in practice; freshly generated node ids do not collide.
pub fn paragraph_doc(texts: &[&str]) -> DocumentTree {
    DocumentTree::from_nodes(texts.iter().map(|t| ContentNode::paragraph(*t)).collect())
        .unwrap_or_else(|e| panic!("paragraph_doc: {e}"))
}

/// A group node wrapping `children`.
pub fn group(children: Vec<ContentNode>) -> ContentNode {
    ContentNode::new("core/group").with_children(children)
}

/// The `"Hello there!"` paragraph used across scenarios.
pub fn greeting() -> ContentNode {
    ContentNode::paragraph("Hello there!")
}

/// Text of every root of `doc`, in order; non-text roots give their plain text.
pub fn root_texts(doc: &DocumentTree) -> Vec<String> {
    doc.roots().iter().map(ContentNode::plain_text).collect()
}
