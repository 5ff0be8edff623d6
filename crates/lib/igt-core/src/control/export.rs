use futures::future::try_join_all;
use igt_store::tree::Document;
use tracing::{info, warn};

use crate::exporters::{ExportArtifact, ExportFormat};
use crate::graph::{DocumentRecords, Reconstruction, reconstruct};
use crate::store::GraphStore;

use super::{ControlError, IgtControlPlane, require_id};

const CORPUS_FILE_STEM: &str = "interlinear_texts";

impl<S: GraphStore> IgtControlPlane<S> {
    /// Reads a stored document and rebuilds its tree.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if nothing is stored under the id, or a
    /// store error if the read fails.
    pub async fn load_document(&self, document_id: &str) -> Result<Reconstruction, ControlError> {
        require_id(document_id, "document_id")?;
        let subgraph = self
            .store
            .read_document(document_id)
            .await?
            .ok_or_else(|| ControlError::NotFound(format!("document {document_id}")))?;
        let reconstruction = reconstruct(DocumentRecords::from_subgraph(subgraph));
        for warning in &reconstruction.warnings {
            warn!(
                document_id,
                entity_id = %warning.entity_id,
                "{}",
                warning.message
            );
        }
        Ok(reconstruction)
    }

    /// Reads and rebuilds every stored document, in id order.
    ///
    /// # Errors
    /// Returns `ControlError` if a store read fails.
    pub async fn load_corpus(&self) -> Result<Vec<Document>, ControlError> {
        let ids = self.store.document_ids().await?;
        let documents = try_join_all(ids.iter().map(|id| self.load_document(id))).await?;
        Ok(documents
            .into_iter()
            .map(|reconstruction| reconstruction.document)
            .collect())
    }

    /// Exports one stored document.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for unknown ids, or an export error if
    /// serialization fails.
    pub async fn export_document(
        &self,
        document_id: &str,
        format: ExportFormat,
    ) -> Result<ExportArtifact, ControlError> {
        let reconstruction = self.load_document(document_id).await?;
        let artifact = format.render(std::slice::from_ref(&reconstruction.document), document_id)?;
        info!(document_id, format = %format, bytes = artifact.content.len(), "exported document");
        Ok(artifact)
    }

    /// Exports every stored document into one artifact.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` when the store holds no documents.
    pub async fn export_corpus(&self, format: ExportFormat) -> Result<ExportArtifact, ControlError> {
        let documents = self.load_corpus().await?;
        if documents.is_empty() {
            warn!(format = %format, "export requested with no stored texts");
            return Err(ControlError::NotFound("no texts available for export".to_string()));
        }
        let artifact = format.render(&documents, CORPUS_FILE_STEM)?;
        info!(
            format = %format,
            documents = documents.len(),
            bytes = artifact.content.len(),
            "exported corpus"
        );
        Ok(artifact)
    }
}
