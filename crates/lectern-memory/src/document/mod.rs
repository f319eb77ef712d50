pub mod error;
pub mod loader;
pub mod section;
pub mod splitter;
pub mod types;

pub use error::{DocumentError, SplitterError};
pub use loader::{DocumentLoader, Loader, TextLoader};
pub use splitter::{SplitterConfig, TextSplitter};
pub use types::{Chunk, PageRecord, UNKNOWN_SECTION, full_text};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

/// Default maximum document size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
