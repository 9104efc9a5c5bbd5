//! Folder browser: root listing, lazy expansion and index status.
//!
//! Contents are fetched on first expansion and cached by path. Collapsing
//! keeps the cache, so re-expanding a folder costs no request; selecting a
//! folder always refetches.

use crate::api::Backend;
use crate::error::Result;
use crate::model::{FolderContents, FolderInfo};
use log::{debug, warn};
use std::collections::HashMap;

/// How much of a folder is covered by the backend's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// The folder itself is indexed.
    Indexed,
    /// The folder is not, but something beneath it is.
    Partial,
    None,
}

impl IndexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexStatus::Indexed => "indexed",
            IndexStatus::Partial => "partial",
            IndexStatus::None => "none",
        }
    }
}

impl std::fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip trailing separators, keeping a lone `/`.
fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// True when `candidate` lies strictly beneath `folder`. Matching stops at
/// folder boundaries: `/a/bb` is not beneath `/a/b`.
pub fn is_descendant(folder: &str, candidate: &str) -> bool {
    let folder = normalize_path(folder);
    let candidate = normalize_path(candidate);
    if folder == "/" {
        return candidate.len() > 1 && candidate.starts_with('/');
    }
    candidate
        .strip_prefix(folder)
        .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
}

/// Index status of `path` given the backend's indexed folder paths.
pub fn folder_index_status<S: AsRef<str>>(path: &str, indexed: &[S]) -> IndexStatus {
    let target = normalize_path(path);
    let mut partial = false;
    for candidate in indexed {
        let candidate = candidate.as_ref();
        if normalize_path(candidate) == target {
            return IndexStatus::Indexed;
        }
        partial |= is_descendant(target, candidate);
    }
    if partial {
        IndexStatus::Partial
    } else {
        IndexStatus::None
    }
}

/// Whether a [`FolderBrowser::toggle_expand`] call opened or closed the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Expanded,
    Collapsed,
}

/// Tree-style browser with one expanded node at a time.
pub struct FolderBrowser<B> {
    backend: B,
    include_files: bool,
    roots: Vec<FolderInfo>,
    system: Option<String>,
    indexed: Vec<FolderInfo>,
    expanded: Option<String>,
    selected: Option<String>,
    contents: HashMap<String, FolderContents>,
}

impl<B: Backend> FolderBrowser<B> {
    pub fn new(backend: B, include_files: bool) -> Self {
        Self {
            backend,
            include_files,
            roots: Vec::new(),
            system: None,
            indexed: Vec::new(),
            expanded: None,
            selected: None,
            contents: HashMap::new(),
        }
    }

    /// Load root folders. Failures leave an empty list; this is a passive load.
    pub async fn load_roots(&mut self) -> &[FolderInfo] {
        match self.backend.get_root_folders().await {
            Ok(roots) => {
                self.roots = roots.folders;
                self.system = roots.system;
            }
            Err(e) => {
                warn!("failed to load root folders: {}", e);
                self.roots.clear();
                self.system = None;
            }
        }
        &self.roots
    }

    /// Load the indexed folder list. Failures leave an empty list.
    pub async fn load_indexed(&mut self) -> &[FolderInfo] {
        match self.backend.get_indexed_folders().await {
            Ok(folders) => self.indexed = folders,
            Err(e) => {
                warn!("failed to load indexed folders: {}", e);
                self.indexed.clear();
            }
        }
        &self.indexed
    }

    /// Expand `path`, or collapse it if it is the expanded node.
    ///
    /// Contents are fetched only when not cached. A failed fetch is logged
    /// and leaves the node expanded with no contents.
    pub async fn toggle_expand(&mut self, path: &str) -> Toggle {
        if self.expanded.as_deref() == Some(path) {
            self.expanded = None;
            return Toggle::Collapsed;
        }
        self.expanded = Some(path.to_string());
        if self.contents.contains_key(path) {
            debug!("browse cache hit for {}", path);
            return Toggle::Expanded;
        }
        match self.backend.browse_folder(path, self.include_files).await {
            Ok(contents) => {
                self.contents.insert(path.to_string(), contents);
            }
            Err(e) => warn!("failed to browse {}: {}", path, e),
        }
        Toggle::Expanded
    }

    /// Make `path` the preview target and refetch its contents.
    ///
    /// On failure the stale cached entry is dropped and the error returned.
    pub async fn select_folder(&mut self, path: &str) -> Result<&FolderContents> {
        self.selected = Some(path.to_string());
        match self.backend.browse_folder(path, self.include_files).await {
            Ok(contents) => {
                self.contents.insert(path.to_string(), contents);
                Ok(&self.contents[path])
            }
            Err(e) => {
                warn!("failed to load {}: {}", path, e);
                self.contents.remove(path);
                Err(e)
            }
        }
    }

    pub fn index_status(&self, path: &str) -> IndexStatus {
        let paths: Vec<&str> = self.indexed.iter().map(|f| f.path.as_str()).collect();
        folder_index_status(path, &paths)
    }

    pub fn roots(&self) -> &[FolderInfo] {
        &self.roots
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn indexed(&self) -> &[FolderInfo] {
        &self.indexed
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn contents(&self, path: &str) -> Option<&FolderContents> {
        self.contents.get(path)
    }
}
