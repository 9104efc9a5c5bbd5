//! Backend API for visualoom-core.
//!
//! [`Backend`] declares one operation per REST endpoint. Components are
//! generic over it, so they run against [`HttpBackend`] in production and an
//! in-memory fake in tests. Implementations issue exactly one request per
//! call: no retries, no caching, no deduplication.

pub mod client;
pub mod normalize;

pub use client::HttpBackend;

use crate::error::Result;
use crate::model::{FolderContents, FolderInfo, IndexJob, JobStatus, RootFolders, SearchResult};
use serde_json::Value;
use std::future::Future;
use std::path::Path;

/// The operations the backend REST service exposes.
///
/// Futures are `Send` so the indexing poller can run them on a spawned task.
pub trait Backend: Send + Sync {
    /// `GET /folders/roots`
    fn get_root_folders(&self) -> impl Future<Output = Result<RootFolders>> + Send;

    /// `GET /folders`
    fn get_indexed_folders(&self) -> impl Future<Output = Result<Vec<FolderInfo>>> + Send;

    /// `GET /folders/browse`
    fn browse_folder(
        &self,
        path: &str,
        include_files: bool,
    ) -> impl Future<Output = Result<FolderContents>> + Send;

    /// `GET /folders/search`
    fn search_folders(
        &self,
        base_path: &str,
        query: &str,
        max_results: u32,
    ) -> impl Future<Output = Result<Vec<FolderInfo>>> + Send;

    /// `POST /index`: start a background job for a folder.
    fn start_indexing(&self, folder_path: &str) -> impl Future<Output = Result<IndexJob>> + Send;

    /// `POST /index/files`: index an explicit file set; returns the count indexed.
    fn index_files(&self, paths: &[String]) -> impl Future<Output = Result<u64>> + Send;

    /// `GET /index/status/{job_id}`
    fn get_index_status(&self, job_id: &str) -> impl Future<Output = Result<JobStatus>> + Send;

    /// `GET /search/`
    fn search_images(&self, query: &str) -> impl Future<Output = Result<Vec<SearchResult>>> + Send;

    /// `POST /upload/`: the response is backend-defined and returned as-is.
    fn upload_image(&self, file: &Path) -> impl Future<Output = Result<Value>> + Send;

    /// `DELETE /delete/{id}`: the response is backend-defined and returned as-is.
    fn delete_image_by_id(&self, id: &str) -> impl Future<Output = Result<Value>> + Send;
}
