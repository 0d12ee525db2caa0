//! Conversion round trips and scenario checks

use std::sync::Arc;

use blocks_core::conversion::{convert_to_regular, convert_to_shared, relink, relink_all};
use blocks_core::{BlocksConfig, ReferenceResolver, Resolution, SharedBlockRegistry};
use blocks_test_utils::MemoryPersistence;
use blocks_test_utils::content::{group, paragraph_doc, root_texts};
use blocks_tree::{ContentNode, DocumentTree};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn registry() -> SharedBlockRegistry {
    SharedBlockRegistry::new(Arc::new(MemoryPersistence::new()), BlocksConfig::default())
}

fn arb_node() -> impl Strategy<Value = ContentNode> {
    let leaf = "[a-zA-Z !]{0,12}".prop_map(ContentNode::paragraph);
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(group)
    })
}

proptest! {
    #[test]
    fn shared_then_regular_preserves_structure(node in arb_node(), before in 0usize..3) {
        let registry = registry();
        let mut roots: Vec<ContentNode> = (0..before).map(|i| ContentNode::paragraph(i.to_string())).collect();
        let target = node.id;
        roots.push(node.clone());
        let mut doc = DocumentTree::from_nodes(roots).unwrap();

        convert_to_shared(&registry, &mut doc, target).unwrap();
        let reference = doc.roots()[before].id;
        let copies = convert_to_regular(&registry, &mut doc, reference).unwrap();

        prop_assert_eq!(copies.len(), 1);
        prop_assert!(copies[0].structurally_eq(&node));
        prop_assert!(doc.roots()[before].structurally_eq(&node));
        let original_ids: Vec<_> = node.descendants().map(|n| n.id).collect();
        prop_assert!(copies[0].descendants().all(|n| !original_ids.contains(&n.id)));
    }
}

#[tokio::test]
async fn test_edit_through_one_reference_shows_in_every_document() {
    let registry = registry();
    let mut first = paragraph_doc(&["Hello there!"]);
    let node = first.roots()[0].id;
    let temp = convert_to_shared(&registry, &mut first, node).unwrap();
    let outcome = registry.save(&temp, Some("Greeting block")).await.unwrap();
    relink(&mut first, &outcome);

    let mut second = paragraph_doc(&["intro"]);
    second
        .push_root(ContentNode::reference(outcome.id.to_string()))
        .unwrap();

    registry
        .update_content(&outcome.id, vec![ContentNode::paragraph("Oh! Hello there!")])
        .unwrap();

    let resolver = ReferenceResolver::new(&registry);
    for doc in [&first, &second] {
        let resolved = resolver.resolve_tree(doc);
        assert_eq!(resolved.len(), 1);
        assert_eq!(
            resolved[0].1.block().unwrap().plain_text(),
            "Oh! Hello there!"
        );
    }
}

#[test]
fn test_converting_back_leaves_other_references_live() {
    let registry = registry();
    let id = registry.create_from_content(vec![ContentNode::paragraph("shared")]);
    let mut doc = DocumentTree::from_nodes(vec![
        ContentNode::reference(id.to_string()),
        ContentNode::reference(id.to_string()),
    ])
    .unwrap();
    let first = doc.roots()[0].id;

    convert_to_regular(&registry, &mut doc, first).unwrap();

    assert_eq!(root_texts(&doc), vec!["shared", ""]);
    assert_eq!(doc.references().len(), 1);
    assert!(registry.contains(&id));
}

#[tokio::test]
async fn test_reference_inserted_before_first_save_follows_promotion() {
    let registry = registry();
    let mut first = paragraph_doc(&["Hello there!"]);
    let node = first.roots()[0].id;
    let temp = convert_to_shared(&registry, &mut first, node).unwrap();

    // A second document inserts the block from the catalog while it is
    // still temporary, and never sees the save outcome
    let entry = registry.search("untitled").remove(0);
    let mut second = paragraph_doc(&["intro"]);
    second
        .push_root(ContentNode::reference(entry.target_id.to_string()))
        .unwrap();

    let outcome = registry.save(&temp, Some("Greeting block")).await.unwrap();
    assert_eq!(outcome.promoted_from, Some(temp));

    let resolver = ReferenceResolver::new(&registry);
    let reference = &second.roots()[1];
    match resolver.resolve(reference).unwrap() {
        Resolution::Resolved(block) => {
            assert_eq!(block.id, outcome.id);
            assert_eq!(block.plain_text(), "Hello there!");
        }
        Resolution::Unresolved { target } => panic!("{target} did not resolve"),
    }

    assert_eq!(relink_all(&registry, &mut second), 1);
    assert_eq!(relink_all(&registry, &mut second), 0);
    assert_eq!(second.references()[0].1, outcome.id.to_string());
    assert!(resolver.dangling_references(&second).is_empty());
}
