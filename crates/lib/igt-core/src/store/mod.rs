//! Graph store contract with `SurrealDB` and in-memory implementations.
//!
//! A store persists one subgraph per document. Writing a batch replaces every
//! row previously stored under the batch's document id.

pub mod memory;
pub mod surreal;

use std::{error::Error, fmt, future::Future};

use igt_store::models::{Subgraph, TextNode, WriteBatch};

pub use memory::MemoryGraphStore;
pub use surreal::SurrealGraphStore;

#[derive(Debug)]
pub enum StoreError {
    Surreal(Box<surrealdb::Error>),
    InvalidInput(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surreal(err) => write!(f, "SurrealDB error: {err}"),
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
        }
    }
}

impl Error for StoreError {}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Surreal(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Subgraph persistence used by the control plane.
pub trait GraphStore: Send + Sync {
    /// Replaces the stored subgraph of `batch.document_id` with the batch contents
    /// as a single unit.
    fn write_document(&self, batch: WriteBatch) -> impl Future<Output = StoreResult<()>> + Send;

    /// Reads every row stored for a document; `None` when nothing is stored.
    fn read_document(
        &self,
        document_id: &str,
    ) -> impl Future<Output = StoreResult<Option<Subgraph>>> + Send;

    /// Lists stored document rows ordered by id.
    fn list_documents(&self, limit: usize) -> impl Future<Output = StoreResult<Vec<TextNode>>> + Send;

    /// Ids of every stored document, sorted.
    fn document_ids(&self) -> impl Future<Output = StoreResult<Vec<String>>> + Send;
}

pub(crate) fn validate_batch(batch: &WriteBatch) -> StoreResult<Subgraph> {
    ensure_non_empty(&batch.document_id, "document_id")?;
    let subgraph = batch.to_subgraph().ok_or_else(|| {
        StoreError::InvalidInput(format!(
            "batch for {} has no document node",
            batch.document_id
        ))
    })?;
    if subgraph.text.key != batch.document_id {
        return Err(StoreError::InvalidInput(format!(
            "document node {} does not match batch document {}",
            subgraph.text.key, batch.document_id
        )));
    }
    Ok(subgraph)
}

pub(crate) fn ensure_non_empty(value: &str, field: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}
