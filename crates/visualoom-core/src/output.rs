use std::fmt;

/// User-facing events emitted by [`crate::VisuaLoom`] actions.
///
/// Core emits every variant; clients pick a presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An indexing job was accepted by the backend.
    IndexingStarted { job_id: String, folder: String },
    /// Progress of a watched job changed.
    JobProgress { job_id: String, progress: u8 },
    /// A watched job finished.
    IndexingDone { job_id: String },
    /// Explicit files were indexed; `count` is whatever the backend reported.
    FilesIndexed { count: u64 },
    /// An image was uploaded.
    Uploaded { file: String },
    /// An image was deleted.
    Deleted { id: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::IndexingStarted { job_id, folder } => {
                write!(f, "Indexing {} (job {})", folder, job_id)
            }
            Notice::JobProgress { job_id, progress } => {
                write!(f, "Job {}: {}%", job_id, progress)
            }
            Notice::IndexingDone { job_id } => write!(f, "Indexing complete (job {})", job_id),
            Notice::FilesIndexed { count } => write!(f, "Indexed {} file(s)", count),
            Notice::Uploaded { file } => write!(f, "Uploaded {}", file),
            Notice::Deleted { id } => write!(f, "Deleted image {}", id),
        }
    }
}

/// Abstraction over how action results and notifications are presented.
///
/// visualoom-cli implements this with `OutputHandler` (text to stdout/stderr).
pub trait OutputSink {
    /// Emit a result string (the primary output of a command).
    fn emit_result(&self, content: &str);

    /// Emit a typed event. Clients filter and format as appropriate.
    fn emit_event(&self, notice: Notice);

    /// Blocking notification for a failed explicit action.
    fn alert(&self, message: &str);
}

/// A capturing output sink for tests.
#[cfg(test)]
pub(crate) struct CaptureSink {
    pub results: std::cell::RefCell<Vec<String>>,
    pub events: std::cell::RefCell<Vec<Notice>>,
    pub alerts: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl CaptureSink {
    pub fn new() -> Self {
        Self {
            results: std::cell::RefCell::new(vec![]),
            events: std::cell::RefCell::new(vec![]),
            alerts: std::cell::RefCell::new(vec![]),
        }
    }
}

#[cfg(test)]
impl OutputSink for CaptureSink {
    fn emit_result(&self, content: &str) {
        self.results.borrow_mut().push(content.to_string());
    }

    fn emit_event(&self, notice: Notice) {
        self.events.borrow_mut().push(notice);
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_indexed_cites_count_verbatim() {
        let notice = Notice::FilesIndexed { count: 2 };
        assert_eq!(notice.to_string(), "Indexed 2 file(s)");
    }

    #[test]
    fn capture_sink_records_each_channel() {
        let sink = CaptureSink::new();
        sink.emit_result("ok");
        sink.emit_event(Notice::Deleted { id: "1".into() });
        sink.alert("bad");
        assert_eq!(*sink.results.borrow(), vec!["ok".to_string()]);
        assert_eq!(sink.events.borrow().len(), 1);
        assert_eq!(*sink.alerts.borrow(), vec!["bad".to_string()]);
    }

    #[test]
    fn progress_names_job() {
        let notice = Notice::JobProgress {
            job_id: "j1".into(),
            progress: 40,
        };
        assert_eq!(notice.to_string(), "Job j1: 40%");
    }
}
