//! Output handling for the CLI.
//!
//! `OutputHandler` implements `OutputSink`: results go to stdout, notices and
//! alerts to stderr. The `format_*` helpers render core types as text rows.

use std::cell::Cell;
use std::io::{self, IsTerminal, Write};
use visualoom_core::browser::IndexStatus;
use visualoom_core::{FolderInfo, Item, Notice, OutputSink, SearchResult};

const BAR_WIDTH: usize = 30;

/// CLI output handler: text to stdout, diagnostics to stderr.
pub struct OutputHandler {
    /// Redraw job progress in place instead of one line per update
    fancy_progress: bool,
    bar_drawn: Cell<bool>,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self {
            fancy_progress: !verbose && io::stderr().is_terminal(),
            bar_drawn: Cell::new(false),
        }
    }

    /// Terminate an in-place progress bar before printing anything else.
    fn end_progress_line(&self) {
        if self.bar_drawn.replace(false) {
            eprintln!();
        }
    }
}

impl OutputSink for OutputHandler {
    fn emit_result(&self, content: &str) {
        self.end_progress_line();
        println!("{}", content);
    }

    fn emit_event(&self, notice: Notice) {
        if let Notice::JobProgress { progress, .. } = &notice
            && self.fancy_progress
        {
            eprint!("\r{}", progress_bar(*progress, BAR_WIDTH));
            io::stderr().flush().ok();
            self.bar_drawn.set(true);
            return;
        }
        self.end_progress_line();
        eprintln!("[{}]", notice);
    }

    fn alert(&self, message: &str) {
        self.end_progress_line();
        eprintln!("error: {}", message);
    }
}

/// `[######........................]  20%`
pub fn progress_bar(progress: u8, width: usize) -> String {
    let progress = progress.min(100) as usize;
    let filled = progress * width / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(width - filled),
        progress
    )
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn counts(image_count: Option<u64>, subfolder_count: Option<u64>) -> String {
    let mut parts = Vec::new();
    if let Some(n) = image_count {
        parts.push(format!("{} images", n));
    }
    if let Some(n) = subfolder_count {
        parts.push(format!("{} subfolders", n));
    }
    parts.join(", ")
}

/// One folder per line: path, counts, and the index status when known.
pub fn format_folder(folder: &FolderInfo, status: Option<IndexStatus>) -> String {
    let mut line = folder.path.clone();
    let counts = counts(folder.image_count, folder.subfolder_count);
    if !counts.is_empty() {
        line.push_str(&format!("  ({})", counts));
    }
    if folder.readable == Some(false) {
        line.push_str("  [unreadable]");
    }
    if let Some(status) = status.filter(|s| *s != IndexStatus::None) {
        line.push_str(&format!("  [{}]", status));
    }
    line
}

/// One browse item; folders carry their index status, images their size.
pub fn format_item(item: &Item, status: IndexStatus) -> String {
    if item.is_folder() {
        let mut line = format!("[dir] {}", item.name);
        let counts = counts(item.image_count, item.subfolder_count);
        if !counts.is_empty() {
            line.push_str(&format!("  ({})", counts));
        }
        if status != IndexStatus::None {
            line.push_str(&format!("  [{}]", status));
        }
        line
    } else {
        match item.size {
            Some(size) => format!("[img] {}  {}", item.name, format_size(size)),
            None => format!("[img] {}", item.name),
        }
    }
}

/// Numbered result rows: label, score, and where the thumbnail comes from.
pub fn format_results(results: &[SearchResult]) -> Vec<String> {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut line = format!("{:>3}. {}", i + 1, r.label());
            if let Some(score) = r.score {
                line.push_str(&format!("  ({:.2})", score));
            }
            if let Some(src) = r.thumbnail_source()
                && src != r.label()
            {
                line.push_str(&format!("  {}", src));
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use visualoom_core::ItemKind;

    fn folder_item(name: &str) -> Item {
        Item {
            name: name.to_string(),
            path: format!("/p/{}", name),
            kind: ItemKind::Folder,
            image_count: Some(12),
            subfolder_count: None,
            readable: None,
            size: None,
        }
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0, 10), "[..........]   0%");
        assert_eq!(progress_bar(50, 10), "[#####.....]  50%");
        assert_eq!(progress_bar(100, 10), "[##########] 100%");
        assert_eq!(progress_bar(250, 10), "[##########] 100%");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_format_item_folder_status() {
        let item = folder_item("Pictures");
        assert_eq!(
            format_item(&item, IndexStatus::Partial),
            "[dir] Pictures  (12 images)  [partial]"
        );
        assert_eq!(
            format_item(&item, IndexStatus::None),
            "[dir] Pictures  (12 images)"
        );
    }

    #[test]
    fn test_format_item_image() {
        let item = Item {
            kind: ItemKind::Image,
            size: Some(2048),
            ..folder_item("cat.jpg")
        };
        assert_eq!(format_item(&item, IndexStatus::None), "[img] cat.jpg  2.0 KB");
    }

    #[test]
    fn test_format_folder() {
        let mut folder = FolderInfo::from_path("/home/alice");
        folder.image_count = Some(3);
        folder.subfolder_count = Some(1);
        assert_eq!(
            format_folder(&folder, Some(IndexStatus::Indexed)),
            "/home/alice  (3 images, 1 subfolders)  [indexed]"
        );
        assert_eq!(format_folder(&FolderInfo::from_path("/x"), None), "/x");
    }

    #[test]
    fn test_format_results() {
        let results = vec![
            SearchResult {
                id: Some("1".into()),
                title: Some("Beach".into()),
                url: Some("http://h/1.jpg".into()),
                score: Some(0.876),
                ..Default::default()
            },
            SearchResult {
                path: Some("/p/2.jpg".into()),
                ..Default::default()
            },
        ];
        let lines = format_results(&results);
        assert_eq!(lines[0], "  1. Beach  (0.88)  http://h/1.jpg");
        assert_eq!(lines[1], "  2. /p/2.jpg");
    }
}
