//! Path-based explorer with breadcrumbs, filtering, paging, bookmarks and
//! recently visited folders.
//!
//! Unlike [`crate::browser::FolderBrowser`], only the current path's contents
//! are held. Bookmarks and recents are JSON string lists kept in a
//! [`KeyValueStore`].

use crate::api::Backend;
use crate::error::Result;
use crate::model::Item;
use crate::storage::KeyValueStore;
use log::warn;

pub const BOOKMARKS_KEY: &str = "visualoom.bookmarks";
pub const RECENTS_KEY: &str = "visualoom.recents";

/// One breadcrumb: a label and the path it leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub path: String,
}

/// Split `path` into crumbs from the root down. Handles `/`-rooted paths and
/// Windows drive paths (`C:\Users\bob`).
pub fn breadcrumbs(path: &str) -> Vec<Crumb> {
    let sep = if path.contains('\\') && !path.contains('/') {
        '\\'
    } else {
        '/'
    };
    let mut crumbs = Vec::new();
    let mut acc = String::new();
    if path.starts_with(sep) {
        crumbs.push(Crumb {
            label: sep.to_string(),
            path: sep.to_string(),
        });
        acc.push(sep);
    }
    for segment in path.split(sep).filter(|s| !s.is_empty()) {
        if !acc.is_empty() && !acc.ends_with(sep) {
            acc.push(sep);
        }
        acc.push_str(segment);
        // a bare drive letter is only a root with its separator
        let crumb_path = if acc.ends_with(':') {
            format!("{}{}", acc, sep)
        } else {
            acc.clone()
        };
        crumbs.push(Crumb {
            label: segment.to_string(),
            path: crumb_path,
        });
    }
    crumbs
}

/// Parent of `path`, or `None` at a root.
pub fn parent_path(path: &str) -> Option<String> {
    let crumbs = breadcrumbs(path);
    if crumbs.len() < 2 {
        return None;
    }
    Some(crumbs[crumbs.len() - 2].path.clone())
}

/// `path` without trailing separators. Roots keep one: `/`, `\`, `C:\`.
pub fn trim_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.len() == path.len() {
        return path;
    }
    if trimmed.is_empty() || trimmed.ends_with(':') {
        // keep exactly one separator
        &path[..trimmed.len() + 1]
    } else {
        trimmed
    }
}

/// Move `path` to the front of `list`, dropping any older copy, and cap the
/// list at `limit` entries. `/a` and `/a/` count as the same folder.
pub fn push_recent(list: &mut Vec<String>, path: &str, limit: usize) {
    let path = trim_separators(path);
    list.retain(|p| trim_separators(p) != path);
    list.insert(0, path.to_string());
    list.truncate(limit);
}

pub struct Explorer<B, S> {
    backend: B,
    store: S,
    include_files: bool,
    recents_limit: usize,
    per_page: usize,
    current: Option<String>,
    items: Vec<Item>,
    total: u64,
    filter: String,
    page: usize,
}

impl<B: Backend, S: KeyValueStore> Explorer<B, S> {
    pub fn new(backend: B, store: S, include_files: bool, per_page: usize, recents_limit: usize) -> Self {
        Self {
            backend,
            store,
            include_files,
            recents_limit,
            per_page: per_page.max(1),
            current: None,
            items: Vec::new(),
            total: 0,
            filter: String::new(),
            page: 1,
        }
    }

    /// Open `path`: fetch its contents, reset filter and paging, and record it
    /// in recents. On failure the view is emptied and the error returned.
    pub async fn navigate(&mut self, path: &str) -> Result<()> {
        let path = trim_separators(path);
        self.current = Some(path.to_string());
        self.filter.clear();
        self.page = 1;
        match self.backend.browse_folder(path, self.include_files).await {
            Ok(contents) => {
                self.items = contents.items;
                self.total = contents.total;
                self.record_recent(path);
                Ok(())
            }
            Err(e) => {
                warn!("failed to open {}: {}", path, e);
                self.items.clear();
                self.total = 0;
                Err(e)
            }
        }
    }

    /// Navigate to the parent folder. Returns false at a root.
    pub async fn go_up(&mut self) -> Result<bool> {
        let Some(parent) = self.current.as_deref().and_then(parent_path) else {
            return Ok(false);
        };
        self.navigate(&parent).await?;
        Ok(true)
    }

    pub fn current_path(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn breadcrumbs(&self) -> Vec<Crumb> {
        self.current.as_deref().map(breadcrumbs).unwrap_or_default()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Case-insensitive name filter; resets to the first page.
    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.trim().to_lowercase();
        self.page = 1;
    }

    pub fn filtered_items(&self) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| self.filter.is_empty() || item.name.to_lowercase().contains(&self.filter))
            .collect()
    }

    /// Items on the current page of the filtered list.
    pub fn visible_items(&self) -> Vec<&Item> {
        self.filtered_items()
            .into_iter()
            .skip((self.page - 1) * self.per_page)
            .take(self.per_page)
            .collect()
    }

    /// Change the page size; resets to the first page.
    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
        self.page = 1;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of pages, never less than one.
    pub fn page_count(&self) -> usize {
        self.filtered_items().len().div_ceil(self.per_page).max(1)
    }

    /// Jump to `page`, clamped to the valid range.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count());
    }

    pub fn next_page(&mut self) -> bool {
        if self.page < self.page_count() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    fn load_list(&self, key: &str) -> Vec<String> {
        let Some(raw) = self.store.get(key) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("ignoring corrupt '{}' entry: {}", key, e);
            Vec::new()
        })
    }

    fn save_list(&self, key: &str, list: &[String]) -> Result<()> {
        let raw = serde_json::to_string(list).map_err(std::io::Error::other)?;
        self.store.set(key, &raw)?;
        Ok(())
    }

    fn record_recent(&self, path: &str) {
        let mut recents = self.load_list(RECENTS_KEY);
        push_recent(&mut recents, path, self.recents_limit);
        if let Err(e) = self.save_list(RECENTS_KEY, &recents) {
            warn!("failed to save recents: {}", e);
        }
    }

    /// Most recently visited first.
    pub fn recents(&self) -> Vec<String> {
        self.load_list(RECENTS_KEY)
    }

    pub fn bookmarks(&self) -> Vec<String> {
        self.load_list(BOOKMARKS_KEY)
    }

    pub fn is_bookmarked(&self, path: &str) -> bool {
        let path = trim_separators(path);
        self.bookmarks().iter().any(|b| trim_separators(b) == path)
    }

    /// Add a bookmark. Returns false if it was already there.
    pub fn add_bookmark(&self, path: &str) -> Result<bool> {
        let path = trim_separators(path);
        let mut bookmarks = self.bookmarks();
        if bookmarks.iter().any(|b| trim_separators(b) == path) {
            return Ok(false);
        }
        bookmarks.push(path.to_string());
        self.save_list(BOOKMARKS_KEY, &bookmarks)?;
        Ok(true)
    }

    /// Remove a bookmark. Returns false if it was not there.
    pub fn remove_bookmark(&self, path: &str) -> Result<bool> {
        let path = trim_separators(path);
        let mut bookmarks = self.bookmarks();
        let before = bookmarks.len();
        bookmarks.retain(|b| trim_separators(b) != path);
        if bookmarks.len() == before {
            return Ok(false);
        }
        self.save_list(BOOKMARKS_KEY, &bookmarks)?;
        Ok(true)
    }

    /// Flip the bookmark on `path`. Returns whether it is now bookmarked.
    pub fn toggle_bookmark(&self, path: &str) -> Result<bool> {
        if self.remove_bookmark(path)? {
            Ok(false)
        } else {
            self.add_bookmark(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_support::FakeBackend;
    use serde_json::json;

    fn explorer(fake: &FakeBackend, per_page: usize) -> Explorer<FakeBackend, MemoryStore> {
        Explorer::new(fake.clone(), MemoryStore::new(), false, per_page, 10)
    }

    fn folder_listing(names: &[&str]) -> serde_json::Value {
        let items: Vec<_> = names
            .iter()
            .map(|n| json!({"name": n, "path": format!("/p/{}", n), "type": "folder"}))
            .collect();
        json!({"path": "/p", "items": items, "total": names.len()})
    }

    #[test]
    fn breadcrumbs_for_unix_path() {
        let crumbs = breadcrumbs("/home/alice/Pictures");
        let pairs: Vec<(&str, &str)> = crumbs
            .iter()
            .map(|c| (c.label.as_str(), c.path.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("/", "/"),
                ("home", "/home"),
                ("alice", "/home/alice"),
                ("Pictures", "/home/alice/Pictures"),
            ]
        );
    }

    #[test]
    fn breadcrumbs_for_windows_path() {
        let crumbs = breadcrumbs("C:\\Users\\bob");
        assert_eq!(crumbs[0].path, "C:\\");
        assert_eq!(crumbs[1].path, "C:\\Users");
        assert_eq!(crumbs[2].label, "bob");
    }

    #[test]
    fn trailing_separators_are_trimmed_except_at_roots() {
        assert_eq!(trim_separators("/a/"), "/a");
        assert_eq!(trim_separators("/a//"), "/a");
        assert_eq!(trim_separators("/a"), "/a");
        assert_eq!(trim_separators("/"), "/");
        assert_eq!(trim_separators("//"), "/");
        assert_eq!(trim_separators("C:\\Users\\"), "C:\\Users");
        assert_eq!(trim_separators("C:\\"), "C:\\");
    }

    #[test]
    fn push_recent_treats_trailing_slash_as_same_folder() {
        let mut list = vec!["/b".to_string(), "/a/".to_string()];
        push_recent(&mut list, "/a", 10);
        assert_eq!(list, vec!["/a".to_string(), "/b".to_string()]);
        push_recent(&mut list, "/b/", 10);
        assert_eq!(list, vec!["/b".to_string(), "/a".to_string()]);
    }

    #[test]
    fn parent_of_root_is_none() {
        assert_eq!(parent_path("/"), None);
        assert_eq!(parent_path("/home").as_deref(), Some("/"));
        assert_eq!(parent_path("/home/alice/").as_deref(), Some("/home"));
    }

    #[test]
    fn recents_dedup_and_cap() {
        let mut list = Vec::new();
        for i in 0..12 {
            push_recent(&mut list, &format!("/p{}", i), 10);
        }
        assert_eq!(list.len(), 10);
        assert_eq!(list[0], "/p11");
        push_recent(&mut list, "/p5", 10);
        assert_eq!(list[0], "/p5");
        assert_eq!(list.iter().filter(|p| *p == "/p5").count(), 1);
        assert_eq!(list.len(), 10);
    }

    #[tokio::test]
    async fn navigate_records_recents_most_recent_first() {
        let fake = FakeBackend::new();
        fake.set_browse("/a", json!({"items": []}));
        fake.set_browse("/b", json!({"items": []}));
        let mut ex = explorer(&fake, 10);
        ex.navigate("/a").await.unwrap();
        ex.navigate("/b").await.unwrap();
        ex.navigate("/a").await.unwrap();
        assert_eq!(ex.recents(), vec!["/a".to_string(), "/b".to_string()]);
    }

    #[tokio::test]
    async fn trailing_slash_does_not_add_second_recent() {
        let fake = FakeBackend::new();
        fake.set_browse("/a", json!({"items": []}));
        let mut ex = explorer(&fake, 10);
        ex.navigate("/a").await.unwrap();
        ex.navigate("/a/").await.unwrap();
        assert_eq!(ex.recents(), vec!["/a".to_string()]);
        assert_eq!(ex.current_path(), Some("/a"));
        assert_eq!(fake.browse_calls("/a"), 2);

        assert!(ex.add_bookmark("/a/").unwrap());
        assert!(!ex.add_bookmark("/a").unwrap());
        assert!(ex.is_bookmarked("/a/"));
        assert_eq!(ex.bookmarks(), vec!["/a".to_string()]);
    }

    #[tokio::test]
    async fn failed_navigate_empties_view() {
        let fake = FakeBackend::new();
        fake.set_browse("/p", folder_listing(&["one", "two"]));
        let mut ex = explorer(&fake, 10);
        ex.navigate("/p").await.unwrap();
        assert_eq!(ex.visible_items().len(), 2);

        assert!(ex.navigate("/nope").await.is_err());
        assert!(ex.visible_items().is_empty());
        assert_eq!(ex.current_path(), Some("/nope"));
        assert_eq!(ex.recents(), vec!["/p".to_string()]);
    }

    #[tokio::test]
    async fn filter_and_paging() {
        let fake = FakeBackend::new();
        fake.set_browse(
            "/p",
            folder_listing(&["Beach", "beach-2", "City", "Forest", "BEACH old"]),
        );
        let mut ex = explorer(&fake, 2);
        ex.navigate("/p").await.unwrap();
        assert_eq!(ex.page_count(), 3);

        ex.set_filter("beach");
        assert_eq!(ex.filtered_items().len(), 3);
        assert_eq!(ex.page_count(), 2);
        assert_eq!(ex.visible_items().len(), 2);
        assert!(ex.next_page());
        assert_eq!(ex.visible_items()[0].name, "BEACH old");
        assert!(!ex.next_page());
        assert!(ex.prev_page());
        assert!(!ex.prev_page());

        ex.set_page(99);
        assert_eq!(ex.page(), 2);
        ex.set_per_page(10);
        assert_eq!(ex.page(), 1);
        assert_eq!(ex.page_count(), 1);
        ex.set_filter("zzz");
        assert_eq!(ex.page_count(), 1);
        assert!(ex.visible_items().is_empty());
    }

    #[tokio::test]
    async fn go_up_navigates_to_parent() {
        let fake = FakeBackend::new();
        fake.set_browse("/p/q", json!({"items": []}));
        fake.set_browse("/p", folder_listing(&["q"]));
        let mut ex = explorer(&fake, 10);
        ex.navigate("/p/q").await.unwrap();
        assert!(ex.go_up().await.unwrap());
        assert_eq!(ex.current_path(), Some("/p"));
        assert_eq!(ex.breadcrumbs().len(), 2);
    }

    #[tokio::test]
    async fn go_up_at_root_is_noop() {
        let fake = FakeBackend::new();
        fake.set_browse("/", json!({"items": []}));
        let mut ex = explorer(&fake, 10);
        ex.navigate("/").await.unwrap();
        assert!(!ex.go_up().await.unwrap());
        assert_eq!(fake.browse_calls("/"), 1);
    }

    #[test]
    fn bookmarks_toggle_and_keep_order() {
        let fake = FakeBackend::new();
        let ex = explorer(&fake, 10);
        assert!(ex.toggle_bookmark("/a").unwrap());
        assert!(ex.add_bookmark("/b").unwrap());
        assert!(!ex.add_bookmark("/a").unwrap());
        assert_eq!(ex.bookmarks(), vec!["/a".to_string(), "/b".to_string()]);
        assert!(ex.is_bookmarked("/a"));

        assert!(!ex.toggle_bookmark("/a").unwrap());
        assert!(!ex.is_bookmarked("/a"));
        assert!(!ex.remove_bookmark("/a").unwrap());
    }

    #[test]
    fn corrupt_store_reads_as_empty() {
        let fake = FakeBackend::new();
        let store = MemoryStore::new();
        store.set(BOOKMARKS_KEY, "{oops").unwrap();
        let ex = Explorer::new(fake, store, false, 10, 10);
        assert!(ex.bookmarks().is_empty());
    }
}
