//! Serializers from document trees to downloadable formats.
//!
//! `ExportFormat` is the registry: it resolves a requested file type to the
//! writer, media type and file extension used for the artifact.

pub mod flextext;
pub mod json;

use std::{error::Error, fmt, str::FromStr};

use igt_store::tree::Document;
use serde::{Deserialize, Serialize};

pub use flextext::FlextextWriter;
pub use json::JsonExporter;

#[derive(Debug)]
pub enum ExportError {
    UnsupportedFormat(String),
    Json(serde_json::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(file_type) if file_type.trim().is_empty() => {
                write!(f, "export file type must be provided")
            }
            Self::UnsupportedFormat(file_type) => {
                write!(f, "unsupported export file type '{file_type}'")
            }
            Self::Json(err) => write!(f, "JSON export failed: {err}"),
        }
    }
}

impl Error for ExportError {}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Flextext,
    Json,
}

impl ExportFormat {
    pub const ALL: [Self; 2] = [Self::Flextext, Self::Json];

    #[must_use]
    pub const fn file_type(self) -> &'static str {
        match self {
            Self::Flextext => "flextext",
            Self::Json => "json",
        }
    }

    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Flextext => "application/xml",
            Self::Json => "application/json",
        }
    }

    #[must_use]
    pub const fn file_extension(self) -> &'static str {
        match self {
            Self::Flextext => "flextext",
            Self::Json => "json",
        }
    }

    /// Renders documents into an artifact named `{file_stem}.{extension}`.
    ///
    /// # Errors
    /// Returns `ExportError` if JSON serialization fails.
    pub fn render(self, documents: &[Document], file_stem: &str) -> Result<ExportArtifact, ExportError> {
        let content = match self {
            Self::Flextext => FlextextWriter::write_corpus(documents),
            Self::Json => JsonExporter::export(documents)?,
        };
        Ok(ExportArtifact {
            file_name: format!("{file_stem}.{}", self.file_extension()),
            media_type: self.media_type().to_string(),
            content,
        })
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_type())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.file_type() == normalized)
            .ok_or_else(|| ExportError::UnsupportedFormat(value.to_string()))
    }
}

/// Serialized export ready to be written or downloaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub media_type: String,
    pub content: String,
}
