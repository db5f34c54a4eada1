//! huskguide CLI - converts a product-guide workbook into HTML fragments

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use huskguide::{GuideBuilder, GuideSettings, LogFormat, RunSummary};
use log::{LevelFilter, Metadata, Record};

const ERROR_LOG: &str = "error_log.txt";

#[derive(Parser)]
#[command(name = "huskguide")]
#[command(about = "Convert a product-guide workbook into themed HTML fragments, logs and a zip archive")]
#[command(version)]
struct Cli {
    /// Workbook to convert (.xlsx or .xls)
    input: PathBuf,

    /// Root directory for run output (a timestamped folder is created inside)
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Directory the zip archive is written to (default: ~/Downloads)
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    /// Do not create a zip archive
    #[arg(long)]
    no_archive: bool,

    /// Log table format
    #[arg(long)]
    log_format: Option<LogFormatArg>,

    /// HTML-escape product names and image file names
    #[arg(long)]
    escape_markup: bool,

    /// Path to a JSON settings file (CLI flags take precedence)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL for product images
    #[arg(long)]
    asset_base_url: Option<String>,

    /// Base URL for tooltip images
    #[arg(long)]
    tooltip_base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum LogFormatArg {
    Xlsx,
    Csv,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Xlsx => LogFormat::Xlsx,
            LogFormatArg::Csv => LogFormat::Csv,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(summary) => {
            report(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{:#}", err);
            match write_error_log(Path::new(ERROR_LOG), &err) {
                Ok(()) => eprintln!("Failed. Details written to {}", ERROR_LOG),
                Err(write_err) => eprintln!("Failed, and the error log could not be written: {}", write_err),
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<RunSummary> {
    let mut builder = GuideBuilder::new();

    if let Some(path) = &cli.config {
        let settings = GuideSettings::load(path).context("failed to load settings")?;
        builder = settings.apply(builder);
    }

    // CLI flags override settings file values
    if let Some(root) = &cli.output_root {
        builder = builder.with_output_root(root);
    }
    if let Some(dir) = &cli.archive_dir {
        builder = builder.with_archive_dir(dir);
    }
    if cli.no_archive {
        builder = builder.without_archive();
    }
    if let Some(format) = cli.log_format {
        builder = builder.with_log_format(format.into());
    }
    if cli.escape_markup {
        builder = builder.with_escape_markup(true);
    }
    if let Some(url) = &cli.asset_base_url {
        builder = builder.with_asset_base_url(url);
    }
    if let Some(url) = &cli.tooltip_base_url {
        builder = builder.with_tooltip_base_url(url);
    }

    let guide = builder.build().context("invalid configuration")?;
    guide
        .run(&cli.input)
        .with_context(|| format!("failed to convert {}", cli.input.display()))
}

fn report(summary: &RunSummary) {
    println!("Fragments: {}", summary.fragment_count);
    println!("Merged: {}", summary.merged_files.len());
    for path in &summary.log_files {
        println!("Log: {}", path.display());
    }
    for tab in &summary.skipped_tabs {
        println!("Skipped sheet: {}", tab);
    }
    match &summary.archive_path {
        Some(archive) => println!("Done. Archive: {}", archive.display()),
        None => println!("Done. Output: {}", summary.output_dir.display()),
    }
}

fn write_error_log(path: &Path, err: &anyhow::Error) -> std::io::Result<()> {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    std::fs::write(path, format!("[{}]\n{:?}\n", timestamp, err))
}

fn init_logging(verbose: bool) {
    static LOGGER: SimpleLogger = SimpleLogger;
    let _ = log::set_logger(&LOGGER);
    let level = if verbose {
        LevelFilter::Debug
    } else {
        log_level_from_env()
    };
    log::set_max_level(level);
}

struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn log_level_from_env() -> LevelFilter {
    match std::env::var("HUSKGUIDE_LOG").as_deref() {
        Ok("error") => LevelFilter::Error,
        Ok("warn") => LevelFilter::Warn,
        Ok("debug") => LevelFilter::Debug,
        Ok("trace") => LevelFilter::Trace,
        Ok("off") => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}
