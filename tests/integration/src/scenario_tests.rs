//! End-to-end scenarios across tree, registry, catalog, sessions and deletion.
//!
//! Each test walks one user-visible flow: a paragraph becomes a shared
//! block, gets edited through an edit surface, and is converted back or
//! deleted, checking what documents and the inserter see at each step.

use std::sync::Arc;

use blocks_core::conversion::{convert_to_regular, convert_to_shared, relink};
use blocks_core::deletion::delete_shared_block;
use blocks_core::{
    BlocksConfig, EditSurface, EntityId, ReferenceResolver, SessionState, SharedBlockRegistry,
};
use blocks_test_utils::MemoryPersistence;
use blocks_test_utils::content::paragraph_doc;
use blocks_tree::{ContentNode, DocumentTree};
use pretty_assertions::assert_eq;

struct Editor {
    registry: SharedBlockRegistry,
    store: Arc<MemoryPersistence>,
    doc: DocumentTree,
}

impl Editor {
    fn new() -> Self {
        let store = Arc::new(MemoryPersistence::new());
        Self {
            registry: SharedBlockRegistry::new(store.clone(), BlocksConfig::default()),
            store,
            doc: paragraph_doc(&["Hello there!"]),
        }
    }

    /// Convert the first paragraph to a shared block and save it
    async fn share_first(&mut self, title: Option<&str>) -> EntityId {
        let node = self.doc.roots()[0].id;
        let temp = convert_to_shared(&self.registry, &mut self.doc, node).unwrap();
        let outcome = self.registry.save(&temp, title).await.unwrap();
        assert_eq!(relink(&mut self.doc, &outcome), 1);
        outcome.id
    }

    fn resolved_text(&self) -> Option<String> {
        let reference = &self.doc.roots()[0];
        ReferenceResolver::new(&self.registry)
            .resolve(reference)
            .unwrap()
            .block()
            .map(|b| b.plain_text())
    }
}

mod scenario_a {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_converted_block_resolves_and_is_searchable() {
        let mut editor = Editor::new();

        let id = editor.share_first(Some("Greeting block")).await;

        assert_eq!(editor.resolved_text().as_deref(), Some("Hello there!"));
        let hits = editor.registry.search("Greeting");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target_id, id);
        assert_eq!(editor.store.stored(1).unwrap().title, "Greeting block");
    }
}

mod scenario_b {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_untitled_block_gets_untitled_label() {
        let mut editor = Editor::new();

        let id = editor.share_first(None).await;

        assert!(editor.registry.get(&id).unwrap().title.is_empty());
        let entry = editor.registry.catalog_entry(&id).unwrap();
        assert_eq!(entry.label, "Untitled shared block");
    }
}

mod scenario_c {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_cancel_keeps_committed_content() {
        let mut editor = Editor::new();
        let id = editor.share_first(Some("Greeting block")).await;
        let saves = editor.store.history().len();

        let surface = EditSurface::new(editor.registry.clone());
        surface.begin_edit(&id).unwrap();
        surface
            .set_content(vec![ContentNode::paragraph("Oh! Hello there!")])
            .unwrap();
        surface.cancel().unwrap();

        assert_eq!(surface.state(), SessionState::Display);
        assert_eq!(editor.resolved_text().as_deref(), Some("Hello there!"));
        assert_eq!(editor.store.history().len(), saves);
    }
}

mod scenario_d {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_commit_shows_through_every_reference() {
        let mut editor = Editor::new();
        let id = editor.share_first(Some("Greeting block")).await;
        let mut other = paragraph_doc(&["elsewhere"]);
        other.push_root(ContentNode::reference(id.to_string())).unwrap();

        let surface = EditSurface::new(editor.registry.clone());
        surface.begin_edit(&id).unwrap();
        surface
            .set_content(vec![ContentNode::paragraph("Oh! Hello there!")])
            .unwrap();
        surface.save().await.unwrap();

        assert_eq!(editor.resolved_text().as_deref(), Some("Oh! Hello there!"));
        let resolver = ReferenceResolver::new(&editor.registry);
        let resolved = resolver.resolve_tree(&other);
        assert_eq!(
            resolved[0].1.block().unwrap().plain_text(),
            "Oh! Hello there!"
        );
        assert_eq!(
            editor.store.stored(1).unwrap().content[0].plain_text(),
            "Oh! Hello there!"
        );
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_draft_for_retry() {
        let mut editor = Editor::new();
        let id = editor.share_first(Some("Greeting block")).await;
        let surface = EditSurface::new(editor.registry.clone());
        surface.begin_edit(&id).unwrap();
        surface
            .set_content(vec![ContentNode::paragraph("Oh! Hello there!")])
            .unwrap();
        editor.store.fail_next(1);

        assert!(surface.save().await.is_err());
        assert_eq!(editor.resolved_text().as_deref(), Some("Hello there!"));
        assert_eq!(surface.state(), SessionState::Editing { entity: id });

        surface.save().await.unwrap();
        assert_eq!(editor.resolved_text().as_deref(), Some("Oh! Hello there!"));
    }
}

mod scenario_e {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_delete_after_converting_back_leaves_document_alone() {
        let mut editor = Editor::new();
        let id = editor.share_first(Some("Greeting block")).await;
        let reference = editor.doc.roots()[0].id;

        let copies = convert_to_regular(&editor.registry, &mut editor.doc, reference).unwrap();
        let pending = editor.registry.request_delete(&id).unwrap();
        delete_shared_block(&editor.registry, pending.confirm(), &mut [&mut editor.doc])
            .await
            .unwrap();

        assert_eq!(editor.doc.roots(), copies.as_slice());
        assert_eq!(editor.doc.plain_text(copies[0].id).unwrap(), "Hello there!");
        assert!(editor.registry.search("Greeting").is_empty());
        assert_eq!(editor.store.deleted(), vec![1]);
    }
}
