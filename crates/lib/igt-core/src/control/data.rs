use igt_store::models::TextNode;
use serde::{Deserialize, Serialize};

use crate::analytics::{self, AllomorphGroup, FrequencyEntry, FrequencyQuery, MorphemeIssue};
use crate::stats::CorpusStats;
use crate::store::GraphStore;

use super::{ControlError, IgtControlPlane};

/// Stored document metadata, as listed without loading the tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub document_id: String,
    pub title: Option<String>,
    pub source: Option<String>,
    pub language: Option<String>,
}

impl From<TextNode> for DocumentSummary {
    fn from(node: TextNode) -> Self {
        Self {
            document_id: node.key,
            title: node.title,
            source: node.source,
            language: node.language_code,
        }
    }
}

impl<S: GraphStore> IgtControlPlane<S> {
    /// Lists stored documents ordered by id.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query fails.
    pub async fn list_documents(&self, limit: usize) -> Result<Vec<DocumentSummary>, ControlError> {
        let records = self.store.list_documents(limit).await?;
        Ok(records.into_iter().map(DocumentSummary::from).collect())
    }

    /// Computes statistics for one stored document.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for unknown ids.
    pub async fn document_stats(&self, document_id: &str) -> Result<CorpusStats, ControlError> {
        let reconstruction = self.load_document(document_id).await?;
        Ok(CorpusStats::from_document(&reconstruction.document))
    }

    /// Computes statistics across every stored document.
    ///
    /// # Errors
    /// Returns `ControlError` if a store read fails.
    pub async fn corpus_stats(&self) -> Result<CorpusStats, ControlError> {
        let documents = self.load_corpus().await?;
        Ok(CorpusStats::from_documents(&documents))
    }

    /// Frequency table over every stored document.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidInput` for a zero limit, or a store error.
    pub async fn frequency(&self, query: &FrequencyQuery) -> Result<Vec<FrequencyEntry>, ControlError> {
        require_limit(query.limit)?;
        let documents = self.load_corpus().await?;
        Ok(analytics::frequency(&documents, query))
    }

    /// Citation forms analysed inconsistently across the stored corpus.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidInput` for a zero limit, or a store error.
    pub async fn morpheme_issues(
        &self,
        language: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MorphemeIssue>, ControlError> {
        require_limit(limit)?;
        let documents = self.load_corpus().await?;
        Ok(analytics::morpheme_issues(&documents, language, limit))
    }

    /// Citation forms realised by at least `min_variants` surface forms.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidInput` for a zero limit or fewer than two
    /// variants, or a store error.
    pub async fn allomorphs(
        &self,
        language: Option<&str>,
        min_variants: usize,
        limit: usize,
    ) -> Result<Vec<AllomorphGroup>, ControlError> {
        require_limit(limit)?;
        if min_variants < 2 {
            return Err(ControlError::InvalidInput(
                "min_variants must be at least 2".to_string(),
            ));
        }
        let documents = self.load_corpus().await?;
        Ok(analytics::allomorphs(&documents, language, min_variants, limit))
    }
}

fn require_limit(limit: usize) -> Result<(), ControlError> {
    if limit == 0 {
        return Err(ControlError::InvalidInput("limit must be positive".to_string()));
    }
    Ok(())
}
