//! Core pipeline for interlinear glossed texts.
//!
//! This crate parses FLEx `.flextext` documents into trees, projects them onto
//! graph rows for storage, rebuilds trees from stored subgraphs and serializes
//! them back out. Corpus statistics and lexical analyses run over the rebuilt
//! trees. The `SurrealDB` and in-memory graph stores live here too, behind the
//! control plane.

pub mod analytics;
pub mod control;
pub mod exporters;
pub mod graph;
pub mod parsers;
pub mod stats;
pub mod store;
