//! Bulk content operations.
//!
//! N items are processed in fixed-size batches with a cooperative yield
//! between items and a short sleep between batches, so a large operation
//! never starves interleaved request handling. Each item succeeds or fails
//! on its own; partial success is the normal outcome.

use crate::{
    content::{ContentKind, ContentStore},
    error::CoreResult,
    hooks::{self, names},
    log,
};
use serde_json::json;
use std::{thread, time::Duration};

/// Items per batch.
const BATCH_SIZE: usize = 25;

/// Pause between batches.
const BATCH_PAUSE: Duration = Duration::from_millis(10);

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BulkAction {
    Publish,
    Draft,
    Delete,
}

impl BulkAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug)]
pub struct BulkItemResult {
    pub id: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub results: Vec<BulkItemResult>,
    pub success_count: usize,
    pub error_count: usize,
}

// ============================================================================
// Execution
// ============================================================================

/// Apply `action` to every id, batch by batch.
pub fn run_bulk(
    store: &ContentStore,
    kind: ContentKind,
    action: BulkAction,
    ids: &[String],
) -> BulkOutcome {
    hooks::do_action(
        names::PRE_BULK_OPERATION,
        &[json!({"action": action.as_str(), "count": ids.len()})],
    );
    log!("bulk"; "{} x{} ({})", action.as_str(), ids.len(), kind.label());

    let mut outcome = BulkOutcome::default();
    let item_action = names::bulk_item(action.as_str());

    for batch in ids.chunks(BATCH_SIZE) {
        for id in batch {
            let result = apply(store, kind, action, id);
            match &result {
                Ok(()) => {
                    outcome.success_count += 1;
                    hooks::do_action(&item_action, &[json!({"id": id, "success": true})]);
                    outcome.results.push(BulkItemResult {
                        id: id.clone(),
                        success: true,
                        error: None,
                    });
                }
                Err(e) => {
                    outcome.error_count += 1;
                    log!("warn"; "bulk {} `{id}`: {e}", action.as_str());
                    hooks::do_action(&item_action, &[json!({"id": id, "success": false})]);
                    outcome.results.push(BulkItemResult {
                        id: id.clone(),
                        success: false,
                        error: Some(e.to_string()),
                    });
                }
            }
            thread::yield_now();
        }
        if batch.len() == BATCH_SIZE {
            thread::sleep(BATCH_PAUSE);
        }
    }

    hooks::do_action(
        names::POST_BULK_OPERATION,
        &[json!({
            "action": action.as_str(),
            "successCount": outcome.success_count,
            "errorCount": outcome.error_count,
        })],
    );
    outcome
}

fn apply(store: &ContentStore, kind: ContentKind, action: BulkAction, id: &str) -> CoreResult<()> {
    match action {
        BulkAction::Delete => store.delete(kind, id),
        BulkAction::Publish | BulkAction::Draft => {
            let mut doc = store.get(kind, id)?;
            let status = if action == BulkAction::Publish {
                "published"
            } else {
                "draft"
            };
            doc.metadata.insert("status".into(), json!(status));
            store.update(kind, id, doc)?;
            Ok(())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Document;
    use serde_json::Map;
    use tempfile::tempdir;

    fn post(id: &str, slug: &str, status: &str) -> Document {
        let mut meta = Map::new();
        meta.insert("id".into(), id.into());
        meta.insert("slug".into(), slug.into());
        meta.insert("title".into(), format!("T {id}").into());
        meta.insert("status".into(), status.into());
        meta.insert("createdAt".into(), "2024-01-01".into());
        Document {
            metadata: meta,
            body: "body".into(),
        }
    }

    #[test]
    fn test_bulk_publish() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        for i in 1..=3 {
            store
                .create(ContentKind::Post, post(&format!("p{i}"), &format!("s-{i}"), "draft"))
                .unwrap();
        }

        let ids: Vec<String> = (1..=3).map(|i| format!("p{i}")).collect();
        let outcome = run_bulk(&store, ContentKind::Post, BulkAction::Publish, &ids);
        assert_eq!(outcome.success_count, 3);
        assert_eq!(outcome.error_count, 0);
        for i in 1..=3 {
            let doc = store.get(ContentKind::Post, &format!("p{i}")).unwrap();
            assert!(doc.is_published());
        }
    }

    #[test]
    fn test_partial_failure() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        store.create(ContentKind::Post, post("p1", "one", "published")).unwrap();

        let ids = vec!["p1".to_string(), "missing".to_string()];
        let outcome = run_bulk(&store, ContentKind::Post, BulkAction::Delete, &ids);
        assert_eq!(outcome.success_count, 1);
        assert_eq!(outcome.error_count, 1);
        assert!(outcome.results[0].success);
        assert!(!outcome.results[1].success);
        assert!(outcome.results[1].error.as_ref().unwrap().contains("missing"));
        assert!(store.get(ContentKind::Post, "p1").is_err());
    }

    #[test]
    fn test_publish_forty_items_across_batches() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        for i in 1..=39 {
            store
                .create(ContentKind::Post, post(&format!("p{i}"), &format!("s-{i}"), "draft"))
                .unwrap();
        }

        // 40 ids: a missing one in the first batch must not abort the rest
        let mut ids: Vec<String> = (1..=20).map(|i| format!("p{i}")).collect();
        ids.push("missing".to_string());
        ids.extend((21..=39).map(|i| format!("p{i}")));
        assert_eq!(ids.len(), 40);

        let outcome = run_bulk(&store, ContentKind::Post, BulkAction::Publish, &ids);
        assert_eq!(outcome.results.len(), 40);
        assert_eq!(outcome.success_count, 39);
        assert_eq!(outcome.error_count, 1);
        assert_eq!(outcome.success_count + outcome.error_count, ids.len());

        for (result, id) in outcome.results.iter().zip(&ids) {
            assert_eq!(&result.id, id);
            assert_eq!(result.success, id != "missing");
        }
        assert!(store.get(ContentKind::Post, "p39").unwrap().is_published());
    }

    #[test]
    fn test_bulk_draft() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        store.create(ContentKind::Post, post("p1", "one", "published")).unwrap();

        let outcome = run_bulk(
            &store,
            ContentKind::Post,
            BulkAction::Draft,
            &["p1".to_string()],
        );
        assert_eq!(outcome.success_count, 1);
        assert!(!store.get(ContentKind::Post, "p1").unwrap().is_published());
    }
}
