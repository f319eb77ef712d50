//! Lectern core: query gating, grounded answering and application wiring.

pub mod bootstrap;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod ingest;
pub mod prompt;
pub mod secret;

pub use classifier::{DeflectReason, Verdict, classify};
pub use composer::{Citation, Composer, FormattedAnswer};
pub use config::Config;
pub use ingest::{IngestError, IngestReport, Ingestor};
