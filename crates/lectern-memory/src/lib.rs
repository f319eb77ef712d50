//! Document ingestion and the in-memory semantic index.
//!
//! The build phase runs [`document::Loader`] → [`document::TextSplitter`] →
//! [`index::SemanticIndex::build`]; queries go through
//! [`index::SemanticIndex::search`].

pub mod document;
pub mod error;
pub mod index;

pub use error::IndexError;
pub use index::{IndexState, RetrievalResult, SemanticIndex};
