//! reqwest implementation of [`Backend`].

use super::{Backend, normalize};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::json_ext::JsonExt;
use crate::model::{FolderContents, FolderInfo, IndexJob, JobStatus, RootFolders, SearchResult};
use log::debug;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use std::path::Path;
use url::Url;

/// Longest backend error body echoed into an [`ApiError::HttpStatus`].
const MAX_DETAIL_CHARS: usize = 300;

/// HTTP client for the VisuaLoom backend.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
    timeout_secs: u64,
}

impl HttpBackend {
    /// Build a client from the injected configuration. Every request is
    /// bounded by `config.request_timeout_secs`.
    pub fn new(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("base_url '{}': {}", config.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "base_url '{}' cannot carry a path",
                config.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base,
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base URL, keeping any prefix it carries
    /// (`http://host/api` + `folders` -> `http://host/api/folders`).
    /// Segments are percent-encoded, so ids with `/` stay one segment.
    fn endpoint(&self, segments: &[&str], trailing_slash: bool) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
            if trailing_slash {
                path.push("");
            }
        }
        url
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            ApiError::Network(e.to_string())
        }
    }

    /// Send a request and decode the JSON body; non-2xx becomes `HttpStatus`.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!("backend answered {} ({} bytes)", status, body.len());
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                detail: error_detail(&body, status.canonical_reason()),
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Schema(format!("invalid JSON: {}", e)))
    }

    async fn get(&self, url: Url) -> Result<Value> {
        debug!("GET {}", url);
        self.send(self.client.get(url)).await
    }
}

/// Pull a readable message out of an error body. FastAPI puts it in `detail`.
fn error_detail(body: &str, reason: Option<&str>) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = value.get_str("detail") {
            return detail.to_string();
        }
        if let Some(detail) = value.get("detail") {
            return detail.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return reason.unwrap_or("no details").to_string();
    }
    trimmed.chars().take(MAX_DETAIL_CHARS).collect()
}

/// Content type for an upload, by extension; the backend's image set.
fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

impl Backend for HttpBackend {
    async fn get_root_folders(&self) -> Result<RootFolders> {
        let value = self.get(self.endpoint(&["folders", "roots"], false)).await?;
        normalize::root_folders(&value)
    }

    async fn get_indexed_folders(&self) -> Result<Vec<FolderInfo>> {
        let value = self.get(self.endpoint(&["folders"], false)).await?;
        normalize::indexed_folders(&value)
    }

    async fn browse_folder(&self, path: &str, include_files: bool) -> Result<FolderContents> {
        let mut url = self.endpoint(&["folders", "browse"], false);
        url.query_pairs_mut()
            .append_pair("path", path)
            .append_pair("include_files", if include_files { "true" } else { "false" });
        let value = self.get(url).await?;
        normalize::folder_contents(&value, path)
    }

    async fn search_folders(
        &self,
        base_path: &str,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<FolderInfo>> {
        let mut url = self.endpoint(&["folders", "search"], false);
        url.query_pairs_mut()
            .append_pair("base_path", base_path)
            .append_pair("query", query)
            .append_pair("max_results", &max_results.to_string());
        let value = self.get(url).await?;
        normalize::folder_search_hits(&value)
    }

    async fn start_indexing(&self, folder_path: &str) -> Result<IndexJob> {
        let url = self.endpoint(&["index"], false);
        debug!("POST {} folder_path={}", url, folder_path);
        let form = Form::new().text("folder_path", folder_path.to_string());
        let value = self.send(self.client.post(url).multipart(form)).await?;
        normalize::job_started(&value, folder_path)
    }

    async fn index_files(&self, paths: &[String]) -> Result<u64> {
        let url = self.endpoint(&["index", "files"], false);
        debug!("POST {} ({} files)", url, paths.len());
        let body = json!({ "files": paths });
        let value = self.send(self.client.post(url).json(&body)).await?;
        normalize::indexed_count(&value)
    }

    async fn get_index_status(&self, job_id: &str) -> Result<JobStatus> {
        let value = self
            .get(self.endpoint(&["index", "status", job_id], false))
            .await?;
        normalize::job_status(&value, job_id)
    }

    async fn search_images(&self, query: &str) -> Result<Vec<SearchResult>> {
        let mut url = self.endpoint(&["search"], true);
        url.query_pairs_mut().append_pair("query", query);
        let value = self.get(url).await?;
        normalize::search_results(&value)
    }

    async fn upload_image(&self, file: &Path) -> Result<Value> {
        if !file.is_file() {
            return Err(ApiError::Validation(format!(
                "no file selected: {} is not a file",
                file.display()
            )));
        }
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type_for(file))
            .map_err(|e| ApiError::Validation(format!("invalid content type: {}", e)))?;
        let url = self.endpoint(&["upload"], true);
        debug!("POST {} file={}", url, file.display());
        self.send(self.client.post(url).multipart(Form::new().part("file", part)))
            .await
    }

    async fn delete_image_by_id(&self, id: &str) -> Result<Value> {
        let url = self.endpoint(&["delete", id], false);
        debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(&Config {
            base_url: base.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_segments() {
        let b = backend("http://localhost:8000");
        assert_eq!(
            b.endpoint(&["folders", "roots"], false).as_str(),
            "http://localhost:8000/folders/roots"
        );
        assert_eq!(
            b.endpoint(&["search"], true).as_str(),
            "http://localhost:8000/search/"
        );
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let b = backend("http://host:9000/api/");
        assert_eq!(
            b.endpoint(&["index", "files"], false).as_str(),
            "http://host:9000/api/index/files"
        );
    }

    #[test]
    fn endpoint_encodes_ids() {
        let b = backend("http://localhost:8000");
        assert_eq!(
            b.endpoint(&["delete", "a/b c"], false).as_str(),
            "http://localhost:8000/delete/a%2Fb%20c"
        );
    }

    #[test]
    fn new_rejects_non_base_url() {
        let err = HttpBackend::new(&Config {
            base_url: "mailto:someone@example.com".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn error_detail_prefers_fastapi_detail() {
        assert_eq!(
            error_detail(r#"{"detail": "Folder not found"}"#, Some("Not Found")),
            "Folder not found"
        );
        assert_eq!(error_detail("", Some("Not Found")), "Not Found");
        assert_eq!(error_detail("plain text", None), "plain text");
    }

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type_for(Path::new("/a/b.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("/a/b.webp")), "image/webp");
        assert_eq!(content_type_for(Path::new("/a/b")), "application/octet-stream");
    }
}
