use std::collections::HashSet;

use futures::future::try_join_all;
use igt_store::schema::SOURCE_KIND_FLEXTEXT;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::graph::{Materialized, materialize};
use crate::parsers::{FlextextParser, ParseOptions, ParseWarning};
use crate::stats::CorpusStats;
use crate::store::GraphStore;

use super::{ControlError, IgtControlPlane};

/// Input payload for importing a `.flextext` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub xml: String,
    /// Path the XML was read from. With the title it seeds ids of texts without a `guid`.
    pub source_path: Option<String>,
}

/// Per-document outcome of an import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportedDocument {
    pub document_id: String,
    pub title: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub languages: Vec<String>,
    /// Whether a stored text with the same id was overwritten.
    pub replaced: bool,
}

/// Summary of a `.flextext` import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub source_kind: String,
    pub source_path: Option<String>,
    pub documents: Vec<ImportedDocument>,
    pub warnings: Vec<ParseWarning>,
    pub stats: CorpusStats,
}

impl<S: GraphStore> IgtControlPlane<S> {
    /// Parses `.flextext` XML and replaces the stored subgraph of every text it contains.
    ///
    /// Nothing is written until every document has parsed and materialized.
    ///
    /// # Errors
    /// Returns `ControlError` if validation fails, parsing fails, or store writes fail.
    pub async fn import_flextext(&self, request: ImportRequest) -> Result<ImportReport, ControlError> {
        let ImportRequest { xml, source_path } = request;
        if xml.trim().is_empty() {
            return Err(ControlError::InvalidInput("xml is required".to_string()));
        }

        let mut options = ParseOptions::new();
        if let Some(path) = source_path.as_deref() {
            options = options.with_source_name(path);
        }
        let parsed = FlextextParser::parse_async(xml, options).await?;

        let mut seen = HashSet::new();
        for document in &parsed.documents {
            if !seen.insert(document.id.as_str()) {
                return Err(ControlError::InvalidInput(format!(
                    "duplicate interlinear text id {}",
                    document.id
                )));
            }
        }
        for warning in &parsed.warnings {
            warn!(
                entity_id = %warning.entity_id,
                path = %warning.path,
                "{}",
                warning.message
            );
        }

        let stored: HashSet<String> = self.store.document_ids().await?.into_iter().collect();
        for document in parsed.documents.iter().filter(|document| stored.contains(&document.id)) {
            info!(
                document_id = %document.id,
                title = document.title.as_deref().unwrap_or_default(),
                "replacing stored text"
            );
        }

        let materialized: Vec<Materialized> = parsed.documents.iter().map(materialize).collect();
        try_join_all(
            materialized
                .iter()
                .map(|item| self.store.write_document(item.batch.clone())),
        )
        .await?;

        let documents: Vec<ImportedDocument> = parsed
            .documents
            .iter()
            .zip(&materialized)
            .map(|(document, item)| ImportedDocument {
                document_id: document.id.clone(),
                title: document.title.clone(),
                node_count: item.batch.node_count(),
                edge_count: item.batch.edge_count(),
                languages: item.languages.languages().iter().cloned().collect(),
                replaced: stored.contains(&document.id),
            })
            .collect();
        let stats = CorpusStats::from_documents(&parsed.documents);

        info!(
            source = source_path.as_deref().unwrap_or("<inline>"),
            documents = documents.len(),
            warnings = parsed.warnings.len(),
            "imported flextext"
        );

        Ok(ImportReport {
            source_kind: SOURCE_KIND_FLEXTEXT.to_string(),
            source_path,
            documents,
            warnings: parsed.warnings,
            stats,
        })
    }
}
