//! visualoom-core: client library for the VisuaLoom image-indexing backend
//!
//! Provides the REST client, folder browsing, indexing job tracking, image
//! search and the navigation table shared by VisuaLoom front ends.
//!
//! # Quick Start
//!
//! For most embedding use cases, use the [`VisuaLoom`] facade:
//!
//! ```no_run
//! use visualoom_core::{LoadOptions, VisuaLoom};
//!
//! #[tokio::main]
//! async fn main() -> visualoom_core::Result<()> {
//!     let mut app = VisuaLoom::load_with_options(LoadOptions::default())?;
//!     for root in app.browser.load_roots().await {
//!         println!("{}", root.path);
//!     }
//!     let hits = app.search.search("sunset over water").await?;
//!     println!("{} result(s)", hits.len());
//!     Ok(())
//! }
//! ```
//!
//! For lower-level access, use the individual modules directly.

pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod explorer;
pub mod indexing;
pub mod json_ext;
pub mod model;
pub mod nav;
pub mod output;
pub mod search;
pub mod storage;
mod visualoom;

// Re-export the facade
pub use visualoom::{LoadOptions, STATE_FILENAME, VisuaLoom, follow_job};

// Re-export commonly used types
pub use api::{Backend, HttpBackend};
pub use browser::{FolderBrowser, IndexStatus, Toggle};
pub use config::Config;
pub use error::{ApiError, Result};
pub use explorer::Explorer;
pub use indexing::{IndexingController, JobState, JobWatch};
pub use model::{FolderContents, FolderInfo, IndexJob, Item, ItemKind, SearchResult};
pub use output::{Notice, OutputSink};
pub use search::SearchPanel;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
