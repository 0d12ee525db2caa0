//! Registry behavior against the in-memory persistence service

use std::sync::Arc;

use blocks_core::{BlocksConfig, Draft, Error, SharedBlockRegistry};
use blocks_test_utils::MemoryPersistence;
use blocks_test_utils::content::greeting;
use blocks_tree::ContentNode;
use pretty_assertions::assert_eq;

fn setup(config: BlocksConfig) -> (SharedBlockRegistry, Arc<MemoryPersistence>) {
    let store = Arc::new(MemoryPersistence::new());
    let registry = SharedBlockRegistry::new(store.clone(), config);
    (registry, store)
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

mod save_ordering {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_save_during_save_waits_and_persists_the_latest_draft() {
        let (registry, store) = setup(BlocksConfig::default());
        let id = registry.create_from_content(vec![greeting()]);
        store.hold();

        let first = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .commit(&id, Draft::new("first", vec![ContentNode::paragraph("one")]))
                    .await
            }
        });
        while store.pending_saves() == 0 {
            tokio::task::yield_now().await;
        }

        let second = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .commit(&id, Draft::new("second", vec![ContentNode::paragraph("two")]))
                    .await
            }
        });
        settle().await;

        // The second save is queued behind the first, not inside persistence
        assert_eq!(store.pending_saves(), 1);
        store.release();

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(first.promoted_from, Some(id));
        assert_eq!(second.id, first.id);
        assert_eq!(second.promoted_from, None);
        assert_eq!(store.max_in_flight(), 1);

        let history = store.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, None);
        assert_eq!(history[1].id, first.id.permanent());
        assert_eq!(history[1].title, "second");

        let block = registry.get(&second.id).unwrap();
        assert_eq!(block.title, "second");
        assert_eq!(block.plain_text(), "two");
        assert!(!block.is_dirty);
    }

    #[tokio::test]
    async fn test_saves_of_different_entities_do_not_wait_for_each_other() {
        let (registry, store) = setup(BlocksConfig::default());
        let a = registry.create_from_content(vec![ContentNode::paragraph("a")]);
        let b = registry.create_from_content(vec![ContentNode::paragraph("b")]);
        store.hold();

        let saves: Vec<_> = [a, b]
            .into_iter()
            .map(|id| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.save(&id, None).await })
            })
            .collect();
        settle().await;

        assert_eq!(store.pending_saves(), 2);
        store.release();
        for save in saves {
            save.await.unwrap().unwrap();
        }
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_edit_during_save_stays_dirty() {
        let (registry, store) = setup(BlocksConfig::default());
        let id = registry.create_from_content(vec![greeting()]);
        store.hold();

        let save = tokio::spawn({
            let registry = registry.clone();
            async move { registry.save(&id, Some("Greeting block")).await }
        });
        while store.pending_saves() == 0 {
            tokio::task::yield_now().await;
        }
        registry
            .update_content(&id, vec![ContentNode::paragraph("newer")])
            .unwrap();
        store.release();

        let outcome = save.await.unwrap().unwrap();
        let block = registry.get(&outcome.id).unwrap();
        assert!(block.is_dirty);
        assert_eq!(block.plain_text(), "newer");
        assert_eq!(store.stored(1).unwrap().title, "Greeting block");
    }
}

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_failed_first_save_keeps_temporary_entity() {
        let (registry, store) = setup(BlocksConfig::default());
        let id = registry.create_from_content(vec![greeting()]);
        store.fail_next(1);

        let err = registry.save(&id, Some("Greeting block")).await.unwrap_err();

        assert!(err.is_retryable());
        let block = registry.get(&id).unwrap();
        assert!(block.is_temporary());
        assert!(block.is_dirty);
        assert!(block.title.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_configured_retries_absorb_transient_failures() {
        let config = BlocksConfig {
            save_retries: 2,
            ..BlocksConfig::default()
        };
        let (registry, store) = setup(config);
        let id = registry.create_from_content(vec![greeting()]);
        store.fail_next(2);

        let outcome = registry.save(&id, None).await.unwrap();

        assert_eq!(outcome.id.permanent(), Some(1));
        assert_eq!(store.history().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_registry_unchanged() {
        let (registry, store) = setup(BlocksConfig::default());
        store.seed("Greeting block", vec![greeting()]);
        store.fail_next(1);

        assert!(matches!(
            registry.fetch_all().await,
            Err(Error::FetchFailure { .. })
        ));
        assert!(registry.is_empty());

        assert_eq!(registry.fetch_all().await.unwrap(), 1);
        assert_eq!(registry.search("greeting").len(), 1);
    }
}
