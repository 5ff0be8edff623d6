//! Parsers for interlinear text inputs.
//!
//! Each parser normalizes an external document format into the document tree
//! shared by the graph projection, serializers and statistics.

pub mod flextext;

pub use flextext::{
    FlextextParser,
    ParseError,
    ParseErrorKind,
    ParseOptions,
    ParseOutput,
    ParseWarning,
};
