// visualoom-cli: command-line front end for a VisuaLoom backend
// Argument parsing, text rendering, job progress

mod cli;
mod output;

use clap::Parser;
use cli::{BookmarkAction, Cli, Commands};
use log::debug;
use output::{OutputHandler, format_folder, format_item, format_results};
use std::process::ExitCode;
use visualoom_core::config::resolve_home;
use visualoom_core::nav::render_sidebar;
use visualoom_core::{
    ApiError, Backend, FileStore, FolderBrowser, HttpBackend, IndexStatus, JobState, LoadOptions,
    OutputSink, Result, Toggle, VisuaLoom, follow_job,
};

type App = VisuaLoom<HttpBackend, FileStore>;

fn load_app(cli: &Cli) -> Result<App> {
    let app = VisuaLoom::load_with_options(LoadOptions {
        home: cli.home.clone(),
        base_url: cli.base_url.clone(),
        timeout_secs: cli.timeout,
    })?;
    debug!("backend at {}", app.backend().base_url());
    Ok(app)
}

fn render_json(out: &OutputHandler, value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => out.emit_result(&text),
        Err(_) => out.emit_result(&value.to_string()),
    }
}

async fn run(cli: Cli, out: &OutputHandler) -> Result<ExitCode> {
    // commands that never touch the backend
    match &cli.command {
        Commands::Pages { active } => {
            for line in render_sidebar(active.as_deref()) {
                out.emit_result(&line);
            }
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Config => {
            let home = resolve_home(cli.home.clone())?;
            let app = load_app(&cli)?;
            out.emit_result(&format!("# home: {}", home.display()));
            let text = toml::to_string_pretty(&app.config)
                .map_err(|e| ApiError::Config(e.to_string()))?;
            out.emit_result(text.trim_end());
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let mut app = load_app(&cli)?;

    match cli.command {
        Commands::Roots => {
            app.browser.load_indexed().await;
            app.browser.load_roots().await;
            if let Some(system) = app.browser.system() {
                out.emit_result(&format!("# {}", system));
            }
            for root in app.browser.roots() {
                let status = app.browser.index_status(&root.path);
                out.emit_result(&format_folder(root, Some(status)));
            }
        }
        Commands::Indexed => {
            for folder in app.browser.load_indexed().await {
                out.emit_result(&format_folder(folder, None));
            }
        }
        Commands::Browse { path, files } => {
            let mut browser = if files {
                FolderBrowser::new(app.backend().clone(), true)
            } else {
                app.browser
            };
            browser.load_indexed().await;
            let contents = browser.select_folder(&path).await?.clone();
            out.emit_result(&format!("{} ({} items)", contents.path, contents.total));
            for item in &contents.items {
                out.emit_result(&format_item(item, browser.index_status(&item.path)));
            }
        }
        Commands::Tree { paths } => {
            app.browser.load_indexed().await;
            for path in paths {
                match app.browser.toggle_expand(&path).await {
                    Toggle::Collapsed => out.emit_result(&format!("> {}", path)),
                    Toggle::Expanded => {
                        out.emit_result(&format!("v {}", path));
                        match app.browser.contents(&path) {
                            Some(contents) => {
                                for item in &contents.items {
                                    let status = app.browser.index_status(&item.path);
                                    out.emit_result(&format!("    {}", format_item(item, status)));
                                }
                            }
                            None => out.emit_result("    (could not load)"),
                        }
                    }
                }
            }
        }
        Commands::Explore {
            path,
            filter,
            page,
            per_page,
        } => {
            app.explorer.navigate(&path).await?;
            if let Some(per_page) = per_page {
                app.explorer.set_per_page(per_page);
            }
            if let Some(filter) = filter {
                app.explorer.set_filter(&filter);
            }
            app.explorer.set_page(page);

            let crumbs: Vec<String> = app
                .explorer
                .breadcrumbs()
                .into_iter()
                .map(|c| c.label)
                .collect();
            out.emit_result(&crumbs.join(" > "));
            if app.explorer.is_bookmarked(&path) {
                out.emit_result("(bookmarked)");
            }
            for item in app.explorer.visible_items() {
                out.emit_result(&format_item(item, IndexStatus::None));
            }
            out.emit_result(&format!(
                "page {} of {} ({} matching, {} total)",
                app.explorer.page(),
                app.explorer.page_count(),
                app.explorer.filtered_items().len(),
                app.explorer.total()
            ));
        }
        Commands::Bookmark { action } => match action {
            BookmarkAction::Add { path } => {
                if app.explorer.add_bookmark(&path)? {
                    out.emit_result(&format!("Bookmarked {}", path));
                } else {
                    out.emit_result(&format!("{} is already bookmarked", path));
                }
            }
            BookmarkAction::Remove { path } => {
                if app.explorer.remove_bookmark(&path)? {
                    out.emit_result(&format!("Removed bookmark {}", path));
                } else {
                    out.emit_result(&format!("{} was not bookmarked", path));
                }
            }
            BookmarkAction::List => {
                for path in app.explorer.bookmarks() {
                    out.emit_result(&path);
                }
            }
        },
        Commands::Recent => {
            for path in app.explorer.recents() {
                out.emit_result(&path);
            }
        }
        Commands::FindFolders { base, query, max } => {
            let hits = app.backend().search_folders(&base, &query, max).await?;
            if hits.is_empty() {
                out.emit_result("No folders found");
            }
            for folder in &hits {
                out.emit_result(&format_folder(folder, None));
            }
        }
        Commands::Index { path, no_wait } => {
            let Ok(job) = app.start_indexing(&path, out).await else {
                return Ok(ExitCode::FAILURE);
            };
            if no_wait {
                out.emit_result(&job.job_id);
                return Ok(ExitCode::SUCCESS);
            }
            let watch = app.indexing.subscribe();
            let state = tokio::select! {
                state = follow_job(watch, out) => state,
                _ = tokio::signal::ctrl_c() => {
                    app.indexing.cancel();
                    out.alert(&format!("stopped following job {}", job.job_id));
                    return Ok(ExitCode::FAILURE);
                }
            };
            if !matches!(state, JobState::Done(_)) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::JobStatus { job_id } => {
            let status = app.backend().get_index_status(&job_id).await?;
            let phase = if status.error.is_some() {
                "failed"
            } else if status.job.done {
                "done"
            } else {
                "running"
            };
            out.emit_result(&format!(
                "job {}: {}% ({})",
                status.job.job_id, status.job.progress, phase
            ));
            if let Some(error) = status.error {
                out.emit_result(&format!("error: {}", error));
            }
        }
        Commands::IndexFiles { files } => {
            if app.index_files(&files, out).await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Search { query } => {
            let results = app.search.search(&query.join(" ")).await?;
            if results.is_empty() {
                out.emit_result("No results");
            }
            for line in format_results(results) {
                out.emit_result(&line);
            }
        }
        Commands::Upload { file } => {
            let Ok(response) = app.upload(&file, out).await else {
                return Ok(ExitCode::FAILURE);
            };
            render_json(out, &response);
        }
        Commands::Delete { id } => {
            let Ok(response) = app.delete_image(&id, out).await else {
                return Ok(ExitCode::FAILURE);
            };
            render_json(out, &response);
        }
        Commands::Pages { .. } | Commands::Config => {}
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .init();

    let out = OutputHandler::new(cli.verbose > 0);
    match run(cli, &out).await {
        Ok(code) => code,
        Err(e) => {
            out.alert(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
