use anyhow::{Result, Context, anyhow};
use log::{warn, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use indicatif::{ProgressBar, ProgressStyle};

use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::{FileManager, ISSUES_LOG_NAME};
use crate::language_utils::{get_language_name, LanguageProfile};
use crate::pdf::{DocumentRasterizer, DocumentSource, PageSink, PdfiumBackend};
use crate::pipeline::{PipelineContext, PipelineDriver, PipelineSettings, RunReport};
use crate::providers::model_service::{LayoutService, OcrService};
use crate::providers::ollama::Ollama;
use crate::render::GlyphPainter;

// @module: Application controller for document translation

/// Main application controller for PDF translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the pipeline context from the configuration: HTTP services,
    /// the translator and the fonts. Missing fonts are fatal here.
    pub fn build_context(&self) -> Result<PipelineContext> {
        let profile = LanguageProfile::for_language(&self.config.target_language)?;
        let source_name = get_language_name(&self.config.source_language)?;
        let services = &self.config.services;

        let painter = GlyphPainter::load(&self.config.fonts)?;
        let translator = Ollama::new(&services.translation, &source_name, &profile.name);

        Ok(PipelineContext::new(
            Arc::new(LayoutService::new(&services.layout)),
            Arc::new(OcrService::new(&services.ocr)),
            Arc::new(translator),
            Arc::new(painter),
            PipelineSettings::from_config(&self.config),
            profile,
        ))
    }

    /// Translate `input_file` into `output_dir` with the configured services
    /// and the PDFium backend.
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf) -> Result<RunReport> {
        FileManager::check_input_pdf(&input_file)?;
        FileManager::ensure_dir(&output_dir)?;

        let context = self.build_context()?;
        let backend = PdfiumBackend::new(&output_dir).map_err(|e| AppError::Startup(e.to_string()))?;

        self.run_with(&context, &backend, &backend, &DocumentSource::Path(input_file), &output_dir)
            .await
    }

    /// Run the pipeline with explicit collaborators. Service checks happen
    /// before the first page; a failing check aborts the run.
    pub async fn run_with(
        &self,
        context: &PipelineContext,
        rasterizer: &dyn DocumentRasterizer,
        sink: &dyn PageSink,
        source: &DocumentSource,
        output_dir: &Path,
    ) -> Result<RunReport> {
        let start_time = std::time::Instant::now();
        context.check_services().await?;

        info!(
            "Translating {} → {} ({}), model {}",
            self.config.source_language,
            context.profile.name,
            context.profile.code,
            self.config.services.translation.model
        );

        let progress_bar = ProgressBar::new(0);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let driver = PipelineDriver::new(context, rasterizer, sink, output_dir)
            .with_progress(progress_bar.clone());
        let result = driver.run(source).await;
        progress_bar.finish_and_clear();

        let report = result.map_err(|e| anyhow!(AppError::Document(e)))?;

        let issues = report.issues();
        if !issues.is_empty() {
            let log_file_path = output_dir.join(ISSUES_LOG_NAME);
            if let Err(e) = self.write_issues_log(&log_file_path, &issues) {
                warn!("Failed to write issues log: {}", e);
            } else {
                info!("{} issues written to {}", issues.len(), log_file_path.display());
            }
        }

        info!(
            "Done in {}: {} translated, {} passed through, {} failed",
            Self::format_duration(start_time.elapsed()),
            report.translated_pages(),
            report.passthrough_pages(),
            report.failed_pages()
        );
        if let Some(merged) = &report.merged {
            info!("Success: {}", merged.display());
        }

        Ok(report)
    }

    fn write_issues_log(&self, path: &Path, issues: &[String]) -> Result<()> {
        FileManager::append_to_log_file(
            path,
            &format!(
                "Run {} → {} ({} issues)",
                self.config.source_language,
                self.config.target_language,
                issues.len()
            ),
        )?;
        for issue in issues {
            FileManager::append_to_log_file(path, issue)?;
        }
        Ok(())
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
