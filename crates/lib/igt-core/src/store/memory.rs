use std::collections::BTreeMap;
use std::sync::Arc;

use igt_store::models::{Subgraph, TextNode, WriteBatch};
use tokio::sync::RwLock;
use tracing::debug;

use super::{GraphStore, StoreResult, ensure_non_empty, validate_batch};

/// Process-local store keeping one subgraph per document.
#[derive(Clone, Default)]
pub struct MemoryGraphStore {
    documents: Arc<RwLock<BTreeMap<String, Subgraph>>>,
}

impl MemoryGraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl GraphStore for MemoryGraphStore {
    async fn write_document(&self, batch: WriteBatch) -> StoreResult<()> {
        let subgraph = validate_batch(&batch)?;
        let mut documents = self.documents.write().await;
        documents.insert(batch.document_id.clone(), subgraph);
        debug!(document_id = %batch.document_id, "replaced document subgraph");
        Ok(())
    }

    async fn read_document(&self, document_id: &str) -> StoreResult<Option<Subgraph>> {
        ensure_non_empty(document_id, "document_id")?;
        Ok(self.documents.read().await.get(document_id).cloned())
    }

    async fn list_documents(&self, limit: usize) -> StoreResult<Vec<TextNode>> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .take(limit)
            .map(|subgraph| subgraph.text.clone())
            .collect())
    }

    async fn document_ids(&self) -> StoreResult<Vec<String>> {
        Ok(self.documents.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use igt_store::models::{NodeRecord, SectionNode};

    use super::*;
    use crate::store::StoreError;

    fn batch(document_id: &str, sections: &[&str]) -> WriteBatch {
        let mut batch = WriteBatch::new(document_id.to_string());
        batch.upsert_node(NodeRecord::Text(TextNode {
            key: document_id.to_string(),
            document_id: document_id.to_string(),
            title: None,
            source: None,
            comment: None,
            language_code: None,
        }));
        for (order, key) in (0_i64..).zip(sections) {
            batch.upsert_node(NodeRecord::Section(SectionNode {
                key: (*key).to_string(),
                document_id: document_id.to_string(),
                order,
            }));
        }
        batch
    }

    #[tokio::test]
    async fn rewrite_replaces_previous_subgraph() {
        let store = MemoryGraphStore::new();
        store.write_document(batch("t", &["a", "b"])).await.expect("first write");
        store.write_document(batch("t", &["c"])).await.expect("second write");

        let subgraph = store.read_document("t").await.expect("read").expect("stored");
        let keys: Vec<_> = subgraph.sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["c"]);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_document_reads_as_none() {
        let store = MemoryGraphStore::new();
        assert!(store.read_document("missing").await.expect("read").is_none());
    }

    #[tokio::test]
    async fn batch_without_document_node_is_rejected() {
        let store = MemoryGraphStore::new();
        let batch = WriteBatch::new("t".to_string());
        let err = store.write_document(batch).await.expect_err("should reject");
        assert!(matches!(err, StoreError::InvalidInput(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn lists_documents_in_id_order() {
        let store = MemoryGraphStore::new();
        store.write_document(batch("b", &[])).await.expect("write b");
        store.write_document(batch("a", &[])).await.expect("write a");
        let ids = store.document_ids().await.expect("ids");
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        let listed = store.list_documents(1).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "a");
    }
}
