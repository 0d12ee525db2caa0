//! Registry round trips through the file store

use std::sync::Arc;

use blocks_core::{BlocksConfig, FileStore, PersistenceService, SharedBlockRegistry};
use blocks_test_utils::content::greeting;
use blocks_test_utils::library::TestLibrary;
use blocks_tree::ContentNode;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_saved_blocks_survive_a_new_registry() {
    let library = TestLibrary::new();
    let registry = SharedBlockRegistry::new(Arc::new(library.store()), BlocksConfig::default());
    let id = registry.create_from_content(vec![greeting()]);
    let outcome = registry.save(&id, Some("Greeting block")).await.unwrap();

    let reopened = SharedBlockRegistry::new(Arc::new(library.store()), BlocksConfig::default());
    assert_eq!(reopened.fetch_all().await.unwrap(), 1);

    let block = reopened.get(&outcome.id).unwrap();
    assert_eq!(block.title, "Greeting block");
    assert_eq!(block.plain_text(), "Hello there!");
    assert!(!block.is_dirty);
    assert_eq!(library.titles(), vec!["Greeting block"]);
}

#[tokio::test]
async fn test_fetch_all_keeps_dirty_local_copies() {
    let library = TestLibrary::with_blocks(&[("Greeting block", "Hello there!")]);
    let registry = SharedBlockRegistry::new(Arc::new(library.store()), BlocksConfig::default());
    registry.fetch_all().await.unwrap();
    let id = "1".parse().unwrap();
    registry
        .update_content(&id, vec![ContentNode::paragraph("local edit")])
        .unwrap();

    assert_eq!(registry.fetch_all().await.unwrap(), 0);
    assert_eq!(registry.get(&id).unwrap().plain_text(), "local edit");
}

#[tokio::test]
async fn test_ids_are_not_reused_after_delete() {
    let library = TestLibrary::with_blocks(&[("one", "1"), ("two", "2")]);
    let registry = SharedBlockRegistry::new(Arc::new(library.store()), BlocksConfig::default());
    registry.fetch_all().await.unwrap();

    let pending = registry.request_delete(&"2".parse().unwrap()).unwrap();
    registry.delete(pending.confirm()).await.unwrap();
    let id = registry.create_from_content(vec![greeting()]);
    let outcome = registry.save(&id, None).await.unwrap();

    assert_eq!(outcome.id.permanent(), Some(3));
    assert_eq!(library.titles(), vec!["one", ""]);
}

#[tokio::test]
async fn test_missing_library_is_empty() {
    let library = TestLibrary::new();
    let store = FileStore::new(library.path());
    assert!(store.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_library_file_loads_as_empty() {
    let library = TestLibrary::new();
    std::fs::write(library.path(), "\n").unwrap();
    let registry = SharedBlockRegistry::new(Arc::new(library.store()), BlocksConfig::default());

    assert_eq!(registry.fetch_all().await.unwrap(), 0);
    let id = registry.create_from_content(vec![greeting()]);
    let outcome = registry.save(&id, Some("Greeting block")).await.unwrap();

    assert_eq!(outcome.id.to_string(), "1");
    assert_eq!(library.titles(), vec!["Greeting block"]);
}
