//! Property tests over registry, catalog and resolver consistency.

use std::sync::Arc;

use blocks_core::deletion::delete_shared_block;
use blocks_core::{BlocksConfig, Draft, ReferenceResolver, SharedBlockRegistry};
use blocks_test_utils::MemoryPersistence;
use blocks_tree::{ContentNode, DocumentTree};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn setup() -> (SharedBlockRegistry, Arc<MemoryPersistence>) {
    let store = Arc::new(MemoryPersistence::new());
    (
        SharedBlockRegistry::new(store.clone(), BlocksConfig::default()),
        store,
    )
}

proptest! {
    #[test]
    fn saved_title_matches_catalog_label(title in "[A-Za-z][A-Za-z ]{0,15}") {
        let (registry, _) = setup();
        let outcome = runtime().block_on(async {
            let id = registry.create_from_content(vec![ContentNode::paragraph("x")]);
            registry.update_title(&id, title.clone()).unwrap();
            registry.save(&id, None).await.unwrap()
        });

        let block = registry.get(&outcome.id).unwrap();
        let entry = registry.catalog_entry(&outcome.id).unwrap();
        prop_assert_eq!(&block.title, &title);
        prop_assert_eq!(entry.label.as_str(), registry.config().label_for(&block.title));
    }

    #[test]
    fn deleted_blocks_vanish_from_search_and_resolution(
        title in "[a-z]{3,10}",
        query_len in 1usize..3,
    ) {
        let (registry, _) = setup();
        let query = &title[..query_len];
        let doc = runtime().block_on(async {
            let id = registry.create_from_content(vec![ContentNode::paragraph("x")]);
            let outcome = registry.save(&id, Some(&title)).await.unwrap();
            let doc = DocumentTree::from_nodes(vec![ContentNode::reference(outcome.id.to_string())]).unwrap();
            assert_eq!(registry.search(query).len(), 1);

            let pending = registry.request_delete(&outcome.id).unwrap();
            delete_shared_block(&registry, pending.confirm(), &mut []).await.unwrap();
            doc
        });

        prop_assert!(registry.search(query).is_empty());
        let resolver = ReferenceResolver::new(&registry);
        prop_assert_eq!(resolver.dangling_references(&doc).len(), 1);
    }

    #[test]
    fn queued_saves_persist_the_last_draft(titles in prop::collection::vec("[a-z]{1,8}", 1..6)) {
        let (registry, store) = setup();
        runtime().block_on(async {
            let id = registry.create_from_content(vec![ContentNode::paragraph("x")]);
            store.hold();
            let saves: Vec<_> = titles
                .iter()
                .map(|title| {
                    let registry = registry.clone();
                    let draft = Draft::new(title.clone(), vec![ContentNode::paragraph(title.clone())]);
                    tokio::spawn(async move { registry.commit(&id, draft).await })
                })
                .collect();
            for _ in 0..8 {
                tokio::task::yield_now().await;
            }
            store.release();
            for save in saves {
                save.await.unwrap().unwrap();
            }
        });

        let last = titles.last().unwrap();
        let stored = store.stored(1).unwrap();
        prop_assert_eq!(&stored.title, last);
        prop_assert_eq!(stored.content[0].plain_text(), last.clone());
        prop_assert_eq!(store.max_in_flight(), 1);
        prop_assert_eq!(store.history().len(), titles.len());
    }
}
