use crate::api::{Backend, HttpBackend};
use crate::browser::FolderBrowser;
use crate::config::{Config, resolve_home};
use crate::error::{ApiError, Result};
use crate::explorer::Explorer;
use crate::indexing::{IndexingController, JobState, JobWatch};
use crate::model::IndexJob;
use crate::output::{Notice, OutputSink};
use crate::search::SearchPanel;
use crate::storage::{FileStore, KeyValueStore};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// File under the home directory holding bookmarks and recents.
pub const STATE_FILENAME: &str = "state.json";

/// Options for loading a [`VisuaLoom`] against the HTTP backend.
///
/// Flag-style overrides win over `config.toml` and the environment.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Home directory. `None` uses `VISUALOOM_HOME` or `~/.visualoom`.
    pub home: Option<PathBuf>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// The main entry point for visualoom-core.
///
/// Owns one instance of each component, all sharing the same backend.
/// Passive loads go straight through the components (they fail silently);
/// the explicit actions below report through an [`OutputSink`].
pub struct VisuaLoom<B, S> {
    pub config: Config,
    pub browser: FolderBrowser<B>,
    pub explorer: Explorer<B, S>,
    pub indexing: IndexingController<B>,
    pub search: SearchPanel<B>,
    backend: B,
}

impl VisuaLoom<HttpBackend, FileStore> {
    /// Load config from the home directory, apply overrides, and connect.
    pub fn load_with_options(options: LoadOptions) -> Result<Self> {
        let home = resolve_home(options.home)?;
        let mut config = Config::load(&home)?;
        if let Some(base_url) = options.base_url {
            config.base_url = base_url;
        }
        if let Some(secs) = options.timeout_secs {
            config.request_timeout_secs = secs;
        }
        config.validate()?;

        let backend = HttpBackend::new(&config)?;
        let store = FileStore::open(home.join(STATE_FILENAME))?;
        Ok(Self::new(backend, store, config))
    }
}

impl<B, S> VisuaLoom<B, S>
where
    B: Backend + Clone + 'static,
    S: KeyValueStore,
{
    pub fn new(backend: B, store: S, config: Config) -> Self {
        Self {
            browser: FolderBrowser::new(backend.clone(), config.include_files),
            explorer: Explorer::new(
                backend.clone(),
                store,
                config.include_files,
                config.page_size,
                config.recents_limit,
            ),
            indexing: IndexingController::from_config(backend.clone(), &config),
            search: SearchPanel::new(backend.clone()),
            backend,
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start an indexing job and announce it. Pair with [`follow_job`] to
    /// report progress.
    pub async fn start_indexing(
        &mut self,
        folder_path: &str,
        sink: &dyn OutputSink,
    ) -> Result<IndexJob> {
        match self.indexing.start_indexing(folder_path).await {
            Ok(job) => {
                sink.emit_event(Notice::IndexingStarted {
                    job_id: job.job_id.clone(),
                    folder: folder_path.to_string(),
                });
                Ok(job)
            }
            Err(e) => {
                sink.alert(&format!("Failed to start indexing {}: {}", folder_path, e));
                Err(e)
            }
        }
    }

    pub async fn index_files(&self, paths: &[String], sink: &dyn OutputSink) -> Result<u64> {
        match self.indexing.index_files(paths).await {
            Ok(count) => {
                sink.emit_event(Notice::FilesIndexed { count });
                Ok(count)
            }
            Err(e) => {
                sink.alert(&format!("Failed to index files: {}", e));
                Err(e)
            }
        }
    }

    /// Upload one image. The backend's response is returned untouched.
    pub async fn upload(&self, file: &Path, sink: &dyn OutputSink) -> Result<Value> {
        match self.backend.upload_image(file).await {
            Ok(response) => {
                sink.emit_event(Notice::Uploaded {
                    file: file.display().to_string(),
                });
                Ok(response)
            }
            Err(e) => {
                sink.alert(&format!("Upload of {} failed: {}", file.display(), e));
                Err(e)
            }
        }
    }

    pub async fn delete_image(&self, id: &str, sink: &dyn OutputSink) -> Result<Value> {
        let result = if id.trim().is_empty() {
            Err(ApiError::Validation("image id must not be empty".to_string()))
        } else {
            self.backend.delete_image_by_id(id).await
        };
        match result {
            Ok(response) => {
                sink.emit_event(Notice::Deleted { id: id.to_string() });
                Ok(response)
            }
            Err(e) => {
                sink.alert(&format!("Delete of image {} failed: {}", id, e));
                Err(e)
            }
        }
    }
}

/// Report a job's progress until it ends, returning the final state.
///
/// Takes the watch by value so callers can race it against a cancel signal
/// without holding a borrow of the controller.
pub async fn follow_job(mut watch: JobWatch, sink: &dyn OutputSink) -> JobState {
    let mut state = watch.current();
    let mut last_progress = None;
    loop {
        match &state {
            JobState::Started(job) | JobState::Polling(job) => {
                if last_progress != Some(job.progress) {
                    last_progress = Some(job.progress);
                    sink.emit_event(Notice::JobProgress {
                        job_id: job.job_id.clone(),
                        progress: job.progress,
                    });
                }
            }
            JobState::Done(job) => {
                sink.emit_event(Notice::IndexingDone {
                    job_id: job.job_id.clone(),
                });
                return state;
            }
            JobState::Error { message, .. } => {
                sink.alert(&format!("Indexing failed: {}", message));
                return state;
            }
            JobState::NotStarted => return state,
        }
        match watch.changed().await {
            Some(next) => state = next,
            None => return state,
        }
    }
}
