use clap::Parser;
use colored::Colorize;
use deadbind::report::TerminalReporter;
use deadbind::{Config, Pipeline, ReportFormat, Reporter};
use miette::Result;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// deadbind - Find unused ZK ViewModel classes and methods
#[derive(Parser, Debug)]
#[command(name = "deadbind")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project directory to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Globs of Java sources to include (can be specified multiple times)
    #[arg(long)]
    source_include: Vec<String>,

    /// Globs of Java sources to exclude (can be specified multiple times)
    #[arg(long)]
    source_exclude: Vec<String>,

    /// Globs of ZUL templates to include (can be specified multiple times)
    #[arg(long)]
    template_include: Vec<String>,

    /// Globs of ZUL templates to exclude (can be specified multiple times)
    #[arg(long)]
    template_exclude: Vec<String>,

    /// Patterns to retain - never report as unused (can be specified multiple times)
    #[arg(short, long)]
    retain: Vec<String>,

    /// Report file [default: unused_viewmodel_report.md]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Print the report to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Enable parallel processing for faster analysis
    #[arg(long)]
    parallel: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Markdown,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Markdown => ReportFormat::Markdown,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("deadbind v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    run_analysis(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations
        Config::from_default_locations(&cli.path)?
    };

    // Override with CLI arguments
    if !cli.source_include.is_empty() {
        config.sources.include = cli.source_include.clone();
    }
    config.sources.exclude.extend(cli.source_exclude.iter().cloned());
    if !cli.template_include.is_empty() {
        config.templates.include = cli.template_include.clone();
    }
    config.templates.exclude.extend(cli.template_exclude.iter().cloned());
    config.retain_patterns.extend(cli.retain.iter().cloned());

    if let Some(output) = &cli.output {
        config.report.output = output.clone();
    }

    config.validate()?;
    Ok(config)
}

fn run_analysis(config: &Config, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();
    info!("Analyzing project: {}", cli.path.display());

    let outcome = Pipeline::new(config)
        .with_parallel(cli.parallel)
        .with_progress(!cli.quiet && !cli.stdout)
        .analyze_project(&cli.path)?;

    let format = match cli.format {
        Some(format) => format.into(),
        None => config.report.format.parse::<ReportFormat>()?,
    };

    if cli.stdout {
        Reporter::new(format, None).report(&outcome.report)?;
        return Ok(());
    }

    Reporter::new(format, Some(config.report.output.clone())).report(&outcome.report)?;

    if !cli.quiet {
        TerminalReporter::new().report(&outcome.report);
        println!(
            "{}",
            format!(
                "Report saved to {} ({:.2}s)",
                config.report.output.display(),
                start_time.elapsed().as_secs_f64()
            )
            .dimmed()
        );
    }

    Ok(())
}
