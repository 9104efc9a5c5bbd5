//! Map backend payloads onto the fixed data model.
//!
//! The backend is loose about shapes: folder lists come wrapped or bare,
//! entries are sometimes plain path strings, counts use more than one field
//! name. Each function here accepts the known variants and fails with
//! [`ApiError::Schema`] on anything else instead of defaulting silently.

use crate::error::{ApiError, Result};
use crate::json_ext::JsonExt;
use crate::model::{
    FolderContents, FolderInfo, IndexJob, Item, ItemKind, JobStatus, RootFolders, SearchResult,
    display_name,
};
use serde_json::Value;

/// Unwrap `{ <key>: [...] }` or accept a bare array.
fn list_field<'a>(value: &'a Value, key: &str, what: &str) -> Result<&'a Vec<Value>> {
    if let Some(list) = value.as_array() {
        return Ok(list);
    }
    value
        .get_array(key)
        .ok_or_else(|| ApiError::schema(format!("{what}: expected an array or an object with '{key}'")))
}

/// A folder entry: either a path string or an object with at least `path`.
fn folder_info(entry: &Value) -> Result<FolderInfo> {
    if let Some(path) = entry.as_str() {
        return Ok(FolderInfo::from_path(path));
    }
    let path = entry
        .get_str_any(&["path", "folder_path"])
        .ok_or_else(|| ApiError::schema("folder entry without a path"))?;
    Ok(FolderInfo {
        path: path.to_string(),
        name: entry
            .get_str_any(&["name"])
            .map(str::to_string)
            .unwrap_or_else(|| display_name(path)),
        image_count: entry.get_u64("image_count"),
        subfolder_count: entry.get_u64("subfolder_count"),
        readable: entry.get_bool("readable"),
    })
}

/// `GET /folders`: `{folders: [...]}` or a bare array.
pub fn indexed_folders(value: &Value) -> Result<Vec<FolderInfo>> {
    list_field(value, "folders", "indexed folders")?
        .iter()
        .map(folder_info)
        .collect()
}

/// `GET /folders/roots`
pub fn root_folders(value: &Value) -> Result<RootFolders> {
    let folders = list_field(value, "folders", "root folders")?
        .iter()
        .map(folder_info)
        .collect::<Result<Vec<_>>>()?;
    Ok(RootFolders {
        folders,
        system: value.get_str("system").map(str::to_string),
    })
}

fn item(entry: &Value) -> Result<Item> {
    let path = entry
        .get_str("path")
        .ok_or_else(|| ApiError::schema("item without a path"))?;
    let kind = match entry.get_str("type") {
        Some("folder") | Some("directory") | Some("root") => ItemKind::Folder,
        Some("image") => ItemKind::Image,
        Some(other) => return Err(ApiError::schema(format!("unknown item type '{other}'"))),
        None => return Err(ApiError::schema(format!("item '{path}' has no type"))),
    };
    Ok(Item {
        name: entry
            .get_str_any(&["name"])
            .map(str::to_string)
            .unwrap_or_else(|| display_name(path)),
        path: path.to_string(),
        kind,
        image_count: entry.get_u64("image_count"),
        subfolder_count: entry.get_u64("subfolder_count"),
        readable: entry.get_bool("readable"),
        size: entry.get_u64("size"),
    })
}

/// `GET /folders/browse`. A missing `path` echoes the requested one; a missing
/// `total` means the backend sent everything it has.
pub fn folder_contents(value: &Value, requested: &str) -> Result<FolderContents> {
    let items = value
        .get_array("items")
        .ok_or_else(|| ApiError::schema("browse response without 'items'"))?
        .iter()
        .map(item)
        .collect::<Result<Vec<_>>>()?;
    let total = value.get_u64("total").unwrap_or(items.len() as u64);
    Ok(FolderContents {
        path: value.get_str("path").unwrap_or(requested).to_string(),
        items,
        total,
    })
}

/// `GET /folders/search`: folders that contain images.
pub fn folder_search_hits(value: &Value) -> Result<Vec<FolderInfo>> {
    list_field(value, "results", "folder search")?
        .iter()
        .map(folder_info)
        .collect()
}

/// `POST /index`: the opaque job id of a background job, or `{indexed, path}`
/// when the backend indexed the folder before replying. The latter comes back
/// as an already finished job named after the indexed path.
pub fn job_started(value: &Value, folder_path: &str) -> Result<IndexJob> {
    if let Some(id) = value.get_string_lenient("job_id") {
        if id.is_empty() {
            return Err(ApiError::schema("indexing response with empty 'job_id'"));
        }
        return Ok(IndexJob::new(id));
    }
    if value.get("indexed").is_some() || value.get("indexed_count").is_some() {
        indexed_count(value)?;
        let path = value.get_str("path").unwrap_or(folder_path);
        return Ok(IndexJob::finished(path));
    }
    Err(ApiError::schema("indexing response without 'job_id'"))
}

const DONE_STATUSES: &[&str] = &["done", "completed", "complete", "finished"];
const FAILED_STATUSES: &[&str] = &["failed", "error"];

/// `GET /index/status/{id}`
///
/// Completion comes from `done`, or failing that from a terminal `status`
/// string. A failed job carries its reason in `error`.
pub fn job_status(value: &Value, job_id: &str) -> Result<JobStatus> {
    if !value.is_object() {
        return Err(ApiError::schema("job status is not an object"));
    }
    let status = value.get_str("status").map(str::to_ascii_lowercase);
    let failed = status
        .as_deref()
        .is_some_and(|s| FAILED_STATUSES.contains(&s));
    let error = match value.get_str("error") {
        Some(e) if !e.is_empty() => Some(e.to_string()),
        _ if failed => Some(format!("job reported status '{}'", status.as_deref().unwrap_or(""))),
        _ => None,
    };
    let done = match value.get_bool("done") {
        Some(done) => done,
        None => match status.as_deref() {
            Some(s) => DONE_STATUSES.contains(&s) || failed,
            None if error.is_some() => true,
            None => return Err(ApiError::schema("job status without 'done' or 'status'")),
        },
    };
    let progress = match value.get_u64("progress") {
        Some(p) => p.min(100) as u8,
        None if done && error.is_none() => 100,
        None => 0,
    };
    Ok(JobStatus {
        job: IndexJob {
            job_id: job_id.to_string(),
            progress,
            done,
        },
        error,
    })
}

/// `POST /index/files`: `indexed` or `indexed_count`, as a number or as the
/// list of files that were indexed.
pub fn indexed_count(value: &Value) -> Result<u64> {
    for key in ["indexed", "indexed_count"] {
        if let Some(n) = value.get_u64(key) {
            return Ok(n);
        }
        if let Some(list) = value.get_array(key) {
            return Ok(list.len() as u64);
        }
    }
    Err(ApiError::schema("index files response without 'indexed' or 'indexed_count'"))
}

fn search_result(entry: &Value) -> Result<SearchResult> {
    if let Some(path) = entry.as_str() {
        return Ok(SearchResult {
            path: Some(path.to_string()),
            ..Default::default()
        });
    }
    if !entry.is_object() {
        return Err(ApiError::schema("search result is neither an object nor a path"));
    }
    let owned = |key: &str| entry.get_str_any(&[key]).map(str::to_string);
    let result = SearchResult {
        id: entry.get_string_lenient("id").filter(|s| !s.is_empty()),
        path: owned("path"),
        title: owned("title"),
        name: owned("name").or_else(|| owned("filename")),
        url: owned("url"),
        thumbnail: owned("thumbnail"),
        score: entry
            .get("score")
            .or_else(|| entry.get("similarity"))
            .and_then(Value::as_f64),
    };
    if result.id.is_none() && result.path.is_none() && result.title.is_none() && result.name.is_none()
    {
        return Err(ApiError::schema("search result without id, path, title or name"));
    }
    Ok(result)
}

/// `GET /search/`: `{results: [...]}` or a bare array.
pub fn search_results(value: &Value) -> Result<Vec<SearchResult>> {
    list_field(value, "results", "search")?
        .iter()
        .map(search_result)
        .collect()
}
