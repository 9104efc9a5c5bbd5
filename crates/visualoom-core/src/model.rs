//! Data model shared by the API client and the UI components.
//!
//! These are the fixed shapes the rest of the crate works with; the
//! heterogeneous payloads the backend actually sends are mapped onto them in
//! [`crate::api::normalize`].

use serde::{Deserialize, Serialize};

/// A folder the backend knows about (a root, or an indexed folder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    pub path: String,
    /// Display label, the last path segment unless the backend sent one.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfolder_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readable: Option<bool>,
}

impl FolderInfo {
    /// Build from a bare path, deriving the display name.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self {
            path,
            name,
            image_count: None,
            subfolder_count: None,
            readable: None,
        }
    }
}

/// Derive a display label from a path: its last non-empty segment, or the
/// path itself for roots such as `/` or `C:\`.
pub fn display_name(path: &str) -> String {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| path.to_string())
}

/// Response of `GET /folders/roots`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootFolders {
    pub folders: Vec<FolderInfo>,
    /// Operating system the backend runs on, when reported.
    pub system: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    Image,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Folder => "folder",
            ItemKind::Image => "image",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a browsed folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub path: String,
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfolder_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readable: Option<bool>,
    /// File size in bytes (images only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Item {
    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }
}

/// Contents of one browsed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderContents {
    pub path: String,
    pub items: Vec<Item>,
    /// Total reported by the backend; not guaranteed to equal `items.len()`.
    pub total: u64,
}

/// Snapshot of a backend indexing job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexJob {
    pub job_id: String,
    /// Percent complete, clamped to 0..=100
    pub progress: u8,
    pub done: bool,
}

impl IndexJob {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            progress: 0,
            done: false,
        }
    }

    /// A job the backend completed before answering.
    pub fn finished(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            progress: 100,
            done: true,
        }
    }
}

/// A status poll result: the job snapshot plus a failure reason when the
/// backend reports the job as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub job: IndexJob,
    pub error: Option<String>,
}

/// One hit of an image search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

fn first_non_empty<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

impl SearchResult {
    /// Display label: title, then name, then path, then id.
    pub fn label(&self) -> &str {
        first_non_empty(&[&self.title, &self.name, &self.path, &self.id]).unwrap_or("(untitled)")
    }

    /// Where to load the thumbnail from: url, then thumbnail, then path.
    pub fn thumbnail_source(&self) -> Option<&str> {
        first_non_empty(&[&self.url, &self.thumbnail, &self.path])
    }
}
