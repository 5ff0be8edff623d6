use std::{error::Error, fmt, sync::Arc};

use surrealdb::{Connection, Surreal};

use crate::exporters::ExportError;
use crate::parsers::{ParseError, ParseErrorKind};
use crate::store::{GraphStore, StoreError, SurrealGraphStore};

pub mod data;
pub mod export;
pub mod import;

pub use data::DocumentSummary;
pub use import::{ImportReport, ImportRequest, ImportedDocument};

#[derive(Debug)]
pub enum ControlError {
    Parse(ParseError),
    Store(StoreError),
    Export(ExportError),
    NotFound(String),
    InvalidInput(String),
}

/// Coarse error category, stable across the error variants' details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    MissingContainer,
    Io,
    NotFound,
    Storage,
    Export,
    InvalidInput,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedInput => "malformed_input",
            Self::MissingContainer => "missing_container",
            Self::Io => "io",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
            Self::Export => "export",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl ControlError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(err) => match err.kind() {
                ParseErrorKind::Malformed => ErrorKind::MalformedInput,
                ParseErrorKind::MissingContainer => ErrorKind::MissingContainer,
                ParseErrorKind::Io => ErrorKind::Io,
            },
            Self::Store(StoreError::InvalidInput(_)) | Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Store(StoreError::Surreal(_)) => ErrorKind::Storage,
            Self::Export(ExportError::UnsupportedFormat(_)) => ErrorKind::InvalidInput,
            Self::Export(ExportError::Json(_)) => ErrorKind::Export,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::NotFound(message) => write!(f, "Not found: {message}"),
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
        }
    }
}

impl Error for ControlError {}

impl From<ParseError> for ControlError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<StoreError> for ControlError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<ExportError> for ControlError {
    fn from(err: ExportError) -> Self {
        Self::Export(err)
    }
}

/// Orchestrates import, export and statistics over a graph store.
pub struct IgtControlPlane<S: GraphStore> {
    store: S,
}

impl<S: GraphStore + Clone> Clone for IgtControlPlane<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: GraphStore> IgtControlPlane<S> {
    pub const fn with_store(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<C: Connection> IgtControlPlane<SurrealGraphStore<C>> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            store: SurrealGraphStore::new(db),
        }
    }

    pub fn from_arc(db: Arc<Surreal<C>>) -> Self {
        Self {
            store: SurrealGraphStore::from_arc(db),
        }
    }
}

fn require_id(value: &str, field: &str) -> Result<(), ControlError> {
    if value.trim().is_empty() {
        return Err(ControlError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}
