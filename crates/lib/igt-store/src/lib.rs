//! Data model and schema helpers for interlinear glossed texts.
//!
//! This crate defines the document tree shared by the parser, serializer and
//! statistics code, the graph rows written to and read from storage backends,
//! and the deterministic identifier scheme both sides rely on.

pub mod models;
pub mod schema;
pub mod tree;

pub use models::*;
pub use tree::*;
