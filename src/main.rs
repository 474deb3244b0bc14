// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use log::{LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::PathBuf;
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use layoutlingo::app_config::{self, Config, OutputLayout};
use layoutlingo::file_utils::FileManager;
use layoutlingo::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a PDF document (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for layoutlingo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input PDF file
    #[arg(value_name = "INPUT_PDF")]
    input_pdf: PathBuf,

    /// Output directory (default: `<input stem>_<target language>` next to the input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Source language code (e.g., 'en', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'ja', 'zh', 'vi')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Keep the per-page files only, do not merge them
    #[arg(long)]
    no_merge: bool,

    /// Put the original and translated pages side by side
    #[arg(long)]
    side_by_side: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// layoutlingo - layout-preserving PDF translation
///
/// Translates the text of a PDF page by page and draws the translation
/// where the original text was, keeping figures, tables and formulas.
#[derive(Parser, Debug)]
#[command(name = "layoutlingo")]
#[command(version = "0.1.0")]
#[command(about = "Layout-preserving PDF translation")]
#[command(long_about = "layoutlingo detects the text regions of every page of a PDF, translates them \
with a local Ollama model and redraws the translation in place.

EXAMPLES:
    layoutlingo paper.pdf                        # Translate using default config
    layoutlingo -t zh paper.pdf                  # Translate to Chinese
    layoutlingo -o out/ --no-merge paper.pdf     # Keep per-page files only
    layoutlingo --side-by-side paper.pdf         # Original and translation side by side
    layoutlingo completions bash > layoutlingo.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SERVICES:
    layout      - Layout detection service (default: http://localhost:8501)
    ocr         - OCR service (default: http://localhost:8502)
    translation - Ollama server (default: http://localhost:11434)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input PDF file
    #[arg(value_name = "INPUT_PDF")]
    input_pdf: Option<PathBuf>,

    /// Output directory (default: `<input stem>_<target language>` next to the input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Source language code (e.g., 'en', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'ja', 'zh', 'vi')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Keep the per-page files only, do not merge them
    #[arg(long)]
    no_merge: bool,

    /// Put the original and translated pages side by side
    #[arg(long)]
    side_by_side: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => " ",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "layoutlingo", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            let input_pdf = cli.input_pdf.ok_or_else(|| {
                anyhow!("INPUT_PDF is required when no subcommand is specified")
            })?;

            let translate_args = TranslateArgs {
                input_pdf,
                output_dir: cli.output_dir,
                source_language: cli.source_language,
                target_language: cli.target_language,
                no_merge: cli.no_merge,
                side_by_side: cli.side_by_side,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_translate(translate_args).await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if options.no_merge {
        config.merge = false;
    }
    if options.side_by_side {
        config.pipeline.output_layout = OutputLayout::SideBySide;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    log::set_max_level(config.log_level.to_level_filter());

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| FileManager::default_output_dir(&options.input_pdf, &config.target_language));

    let controller = Controller::with_config(config)?;
    controller.run(options.input_pdf, output_dir).await?;

    Ok(())
}
