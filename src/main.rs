// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use mdxlate::app_config::{Config, LogLevel};
use mdxlate::app_controller::{Controller, FileOutcome};
use mdxlate::translation::FieldKind;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate one Markdown/MDX file
    Translate(TranslateArgs),

    /// Translate every Markdown/MDX file under a directory
    TranslateDir(TranslateDirArgs),

    /// Render a document as editor HTML
    ToHtml {
        /// Markdown/MDX input
        #[arg(value_name = "FILE")]
        input_path: PathBuf,
    },

    /// Read editor HTML back into Markdown
    ToMarkdown {
        /// HTML input
        #[arg(value_name = "FILE")]
        input_path: PathBuf,
    },

    /// Print the translation segments of a document as JSON
    Segments {
        /// Markdown/MDX input
        #[arg(value_name = "FILE")]
        input_path: PathBuf,
    },

    /// Generate shell completions for mdxlate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Language overrides shared by the translate commands
#[derive(Args, Debug)]
struct LanguageArgs {
    /// Source language code (e.g., 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'ar')
    #[arg(short, long)]
    target_language: Option<String>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input Markdown/MDX file
    #[arg(value_name = "FILE")]
    input_path: PathBuf,

    /// Translate the file as one plain field instead of an MDX body
    #[arg(long)]
    plain: bool,

    /// Output file (default: <stem>.<target>.<ext> next to the input)
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    #[command(flatten)]
    languages: LanguageArgs,
}

#[derive(Args, Debug)]
struct TranslateDirArgs {
    /// Directory to scan recursively
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    #[command(flatten)]
    languages: LanguageArgs,
}

/// mdxlate - MDX-preserving machine translation
///
/// Translates English Markdown/MDX into Arabic while keeping code, links
/// and custom elements intact, and converts documents to and from the
/// rich-text editor's HTML.
#[derive(Parser, Debug)]
#[command(name = "mdxlate")]
#[command(version)]
#[command(about = "MDX-preserving machine translation")]
#[command(long_about = "mdxlate translates Markdown/MDX chapters through LibreTranslate-compatible providers.

EXAMPLES:
    mdxlate translate chapter.mdx               # Writes chapter.ar.mdx
    mdxlate translate -f -o out.mdx chapter.mdx  # Explicit output, overwrite
    mdxlate translate --plain title.txt         # Translate as a plain field
    mdxlate translate-dir content/              # Every .md/.mdx file below content/
    mdxlate to-html chapter.mdx > chapter.html  # Editor HTML
    mdxlate segments chapter.mdx                # Show what would be translated
    mdxlate completions bash > mdxlate.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. TRANSLATE_API_URL and TRANSLATE_API_KEY override
    the custom endpoint.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and label for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
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
            let (color, label) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, label, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(level) = cli.log_level {
        log::set_max_level(LogLevel::from(level).to_level_filter());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "mdxlate", &mut std::io::stdout());
            Ok(())
        }
        Commands::ToHtml { input_path } => {
            let controller = build_controller(&cli.config_path, cli.log_level, &LanguageArgs::none())?;
            print!("{}", controller.to_html(&input_path)?);
            Ok(())
        }
        Commands::ToMarkdown { input_path } => {
            let controller = build_controller(&cli.config_path, cli.log_level, &LanguageArgs::none())?;
            println!("{}", controller.to_markdown(&input_path)?);
            Ok(())
        }
        Commands::Segments { input_path } => {
            let controller = build_controller(&cli.config_path, cli.log_level, &LanguageArgs::none())?;
            println!("{}", controller.segments_json(&input_path)?);
            Ok(())
        }
        Commands::Translate(args) => {
            let controller = build_controller(&cli.config_path, cli.log_level, &args.languages)?;
            let kind = if args.plain { FieldKind::Plain } else { FieldKind::Mdx };

            match controller
                .translate_file(&args.input_path, args.output, kind, args.force_overwrite)
                .await?
            {
                FileOutcome::Translated(path) => info!("Wrote {:?}", path),
                FileOutcome::Pending(path) => info!("Wrote {:?} (pending review)", path),
                FileOutcome::Skipped(_) => {}
            }
            Ok(())
        }
        Commands::TranslateDir(args) => {
            let controller = build_controller(&cli.config_path, cli.log_level, &args.languages)?;
            let summary = controller.run_folder(&args.input_dir, args.force_overwrite).await?;

            if summary.failed > 0 {
                return Err(anyhow!("{} of {} file(s) failed", summary.failed, summary.total()));
            }
            Ok(())
        }
    }
}

impl LanguageArgs {
    fn none() -> Self {
        Self {
            source_language: None,
            target_language: None,
        }
    }
}

/// Load the config, apply environment and command line overrides, and build the controller
fn build_controller(config_path: &Path, log_level: Option<CliLogLevel>, languages: &LanguageArgs) -> Result<Controller> {
    let mut config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    config.apply_env_overrides();

    if let Some(source_lang) = &languages.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &languages.target_language {
        config.target_language = target_lang.clone();
    }

    // If log level was not set via command line, update it from config now
    match log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Controller::with_config(config)
}
