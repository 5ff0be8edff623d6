//! Projection between document trees and stored graph rows.
//!
//! `materialize` turns a tree into a write batch, `DocumentRecords` orders the
//! rows of a stored subgraph per level, and `reconstruct` rebuilds the tree.

pub mod materialize;
pub mod reader;
pub mod reconstruct;

use serde::{Deserialize, Serialize};

pub use materialize::{LanguageIndex, Materialized, materialize};
pub use reader::{DocumentRecords, GlossRecord};
pub use reconstruct::{Reconstruction, reconstruct};

/// Inconsistency found in stored rows. Reading continues past it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphWarning {
    pub entity_id: String,
    pub message: String,
}

impl GraphWarning {
    pub(crate) fn new(entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}
