use futures::future;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::Result;
use crate::store::VisitorStore;

/// Pending cell edits, keyed by row id. Purely in-memory: recording an edit
/// never touches the network, and the buffer is authoritative only for
/// changes that have not been flushed yet.
#[derive(Debug, Default)]
pub struct EditBuffer {
    pending: HashMap<i64, Map<String, Value>>,
}

impl EditBuffer {
    pub fn new() -> EditBuffer {
        EditBuffer::default()
    }

    /// Merges one cell edit into the row's partial update. Repeated edits
    /// to the same field overwrite the earlier value; no history is kept
    /// and no validation happens here.
    pub fn record_edit(&mut self, row_id: i64, field: &str, value: Value) {
        self.pending
            .entry(row_id)
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Drops every pending edit without sending anything.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of rows with pending edits.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_fields(&self, row_id: i64) -> Option<&Map<String, Value>> {
        self.pending.get(&row_id)
    }

    /// Sends one update per buffered row, all in flight at once, and waits
    /// for the whole batch. On success the buffer is emptied and the caller
    /// must refetch. If any update fails the buffer is kept intact so the
    /// user can retry; a retry resends updates that already landed, which
    /// is safe because each is an idempotent field overwrite.
    pub async fn flush<S: VisitorStore>(&mut self, store: &S) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let results = future::join_all(
            self.pending
                .iter()
                .map(|(row_id, patch)| store.update(*row_id, patch)),
        )
        .await;

        if let Some(err) = results.into_iter().find_map(|outcome| outcome.err()) {
            warn!(rows = self.pending.len(), "flush failed, edits retained");
            return Err(err);
        }

        let flushed = self.pending.len();
        self.pending.clear();
        info!(rows = flushed, "flushed pending edits");
        Ok(flushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::{MockStore, StoreCall};
    use serde_json::json;

    #[test]
    fn repeated_edit_to_same_field_is_last_write_wins() {
        let mut buffer = EditBuffer::new();
        buffer.record_edit(1, "full_name", json!("x"));
        buffer.record_edit(1, "full_name", json!("y"));

        let pending = buffer.pending_fields(1).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.get("full_name"), Some(&json!("y")));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn edits_on_distinct_fields_accumulate_per_row() {
        let mut buffer = EditBuffer::new();
        buffer.record_edit(1, "full_name", json!("Kofi"));
        buffer.record_edit(1, "address", json!("Accra"));
        buffer.record_edit(2, "age", json!("31"));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.pending_fields(1).unwrap().len(), 2);
        assert_eq!(buffer.pending_fields(2).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn flush_issues_one_update_per_row_with_only_its_fields() {
        let store = MockStore::default();
        let mut buffer = EditBuffer::new();
        buffer.record_edit(1, "full_name", json!("Kofi"));
        buffer.record_edit(1, "address", json!("Accra"));
        buffer.record_edit(2, "age", json!("31"));

        let flushed = buffer.flush(&store).await.unwrap();
        assert_eq!(flushed, 2);
        assert!(buffer.is_empty());

        let mut calls = store.calls();
        calls.sort_by_key(|call| match call {
            StoreCall::Update { row_id, .. } => *row_id,
            _ => i64::MAX,
        });
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            StoreCall::Update { row_id, fields } => {
                assert_eq!(*row_id, 1);
                let mut fields = fields.clone();
                fields.sort();
                assert_eq!(fields, vec!["address", "full_name"]);
            }
            other => panic!("unexpected call {other:?}"),
        }
        match &calls[1] {
            StoreCall::Update { row_id, fields } => {
                assert_eq!(*row_id, 2);
                assert_eq!(fields.as_slice(), ["age"]);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_flush_keeps_every_pending_edit() {
        let mut store = MockStore::default();
        store.fail_updates_for.insert(2);
        let mut buffer = EditBuffer::new();
        buffer.record_edit(1, "full_name", json!("Kofi"));
        buffer.record_edit(2, "age", json!("31"));

        assert!(buffer.flush(&store).await.is_err());
        // Both rows stay buffered, including the one that went through.
        assert_eq!(buffer.len(), 2);
        assert!(buffer.pending_fields(1).is_some());
        assert!(buffer.pending_fields(2).is_some());
    }

    #[tokio::test]
    async fn flush_of_empty_buffer_makes_no_calls() {
        let store = MockStore::default();
        let mut buffer = EditBuffer::new();
        assert_eq!(buffer.flush(&store).await.unwrap(), 0);
        assert!(store.calls().is_empty());
    }

    #[test]
    fn clear_discards_everything() {
        let mut buffer = EditBuffer::new();
        buffer.record_edit(1, "full_name", json!("Kofi"));
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.pending_fields(1).is_none());
    }
}
