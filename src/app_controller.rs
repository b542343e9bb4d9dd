use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::editor;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::Transport;
use crate::providers::http::HttpTransport;
use crate::segmenter::Segmenter;
use crate::translation::{FieldKind, Orchestrator};

// @module: Application controller for document translation

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Translation written to the path
    Translated(PathBuf),
    /// Untranslated body written behind the pending marker
    Pending(PathBuf),
    /// Output already existed and overwriting was not forced
    Skipped(PathBuf),
}

/// Counts for a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub translated: usize,
    pub pending: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FolderSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Translated(_) => self.translated += 1,
            FileOutcome::Pending(_) => self.pending += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
        }
    }

    /// Files processed in total
    pub fn total(&self) -> usize {
        self.translated + self.pending + self.skipped + self.failed
    }
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Translation pipeline built from the configuration
    orchestrator: Orchestrator,
}

impl Controller {
    // @method: Create a new controller talking to providers over HTTP
    pub fn with_config(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(config.translation.timeout() + Duration::from_secs(5));
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a controller with an explicit transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let orchestrator = config.build_orchestrator(transport);

        Ok(Self { config, orchestrator })
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The translation pipeline
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Translate one file.
    ///
    /// Without an explicit output the result goes to `<stem>.<target>.<ext>`
    /// next to the input. An existing output is left alone unless forced.
    pub async fn translate_file(
        &self,
        input_file: &Path,
        output_file: Option<PathBuf>,
        kind: FieldKind,
        force_overwrite: bool,
    ) -> Result<FileOutcome> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path =
            output_file.unwrap_or_else(|| FileManager::generate_output_path(input_file, &self.config.target_language));
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", input_file);
            return Ok(FileOutcome::Skipped(output_path));
        }

        let source = language_utils::normalize_for_provider(&self.config.source_language)?;
        let target = language_utils::normalize_for_provider(&self.config.target_language)?;

        info!("Translating {:?} ({} -> {}, {})", input_file, source, target, kind);

        let content = FileManager::read_to_string(input_file)?;
        let translated = self
            .orchestrator
            .translate_field(kind, &content, &source, &target)
            .await
            .map_err(|e| {
                if e.is_unavailable() {
                    error!("Provider attempts for {:?}:\n{}", input_file, e.attempt_report());
                }
                anyhow::Error::new(AppError::Translation(e)).context(format!("Failed to translate {:?}", input_file))
            })?;

        FileManager::write_to_file(&output_path, &translated)?;

        let outcome = if self.orchestrator.is_pending(&translated) {
            warn!("Translation of {:?} is pending review: {:?}", input_file, output_path);
            FileOutcome::Pending(output_path)
        } else {
            info!(
                "Success: {:?} ({})",
                output_path,
                Self::format_duration(start_time.elapsed())
            );
            FileOutcome::Translated(output_path)
        };

        Ok(outcome)
    }

    /// Translate every Markdown/MDX source under a directory.
    ///
    /// A failing file is logged and counted; the run continues with the next one.
    pub async fn run_folder(&self, input_dir: &Path, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_markdown_files(input_dir)?;
        if files.is_empty() {
            return Err(anyhow!("No Markdown or MDX files found in directory: {:?}", input_dir));
        }

        let mut summary = FolderSummary::default();
        for file in &files {
            match self.translate_file(file, None, FieldKind::Mdx, force_overwrite).await {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!("Error processing file: {:#}", e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Processed {} file(s) in {}: {} translated, {} pending, {} skipped, {} failed",
            summary.total(),
            Self::format_duration(start_time.elapsed()),
            summary.translated,
            summary.pending,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    /// Render a document as an editor page with its placeholder map embedded
    pub fn to_html(&self, input_file: &Path) -> Result<String> {
        let content = FileManager::read_to_string(input_file)?;
        editor::export_for_editing(&content).context("Failed to embed placeholder map")
    }

    /// Read an editor page back into Markdown, restoring custom elements
    pub fn to_markdown(&self, input_file: &Path) -> Result<String> {
        let content = FileManager::read_to_string(input_file)?;
        editor::import_from_editor(&content)
            .with_context(|| format!("Invalid placeholder map in {:?}", input_file))
    }

    /// Segmentation of a document as pretty JSON
    pub fn segments_json(&self, input_file: &Path) -> Result<String> {
        let content = FileManager::read_to_string(input_file)?;
        let segmenter = Segmenter::new(self.config.segmenter.custom_tags.clone());
        let segmentation = segmenter.segment_with_warnings(&content);

        for warning in &segmentation.warnings {
            warn!("{:?}: {}", input_file, warning);
        }

        serde_json::to_string_pretty(&segmentation.segments).context("Failed to serialize segments")
    }

    /// Format a duration for log output
    fn format_duration(duration: Duration) -> String {
        let seconds = duration.as_secs();
        if seconds >= 60 {
            format!("{}m {}s", seconds / 60, seconds % 60)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
