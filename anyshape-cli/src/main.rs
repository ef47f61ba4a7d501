use anyhow::{Context, Result};
use anyshape::{search, RunReport, SearchConfig, SearchError};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Searches a directory tree for every combination of a word's letters
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(
    override_usage = "anyshape [OPTIONS] <ROOT> <WORD> [workerLimit] [-w] [-x combo...] [+fn|-fn] [+ct|-ct] [+cs|-cs] [-a] [-o outFile]"
)]
struct Cli {
    /// Additional config file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    /// Show a progress bar over the combinations
    #[arg(long)]
    progress: bool,

    /// Directory to search
    root: PathBuf,

    /// Word whose combinations are searched for
    word: String,

    /// workerLimit, -w, -x combo..., +fn/-fn, +ct/-ct, +cs/-cs, -a, -o file
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    extra: Vec<String>,
}

/// Exit code for configuration and usage errors, as opposed to failed runs
const USAGE_EXIT_CODE: i32 = 2;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match SearchConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => usage_error(e),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_logging(&config.log_level);

    config.root_path = cli.root;
    config.target_word = cli.word;
    if let Err(e) = config.apply_args(&cli.extra) {
        usage_error(e);
    }
    if cli.progress {
        config.progress = true;
    }
    debug!("Effective configuration: {:?}", config);

    let report = match search::run(&config) {
        Ok(report) => report,
        Err(e) if e.is_fatal_config() => usage_error(e),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Search in {} failed", config.root_path.display()))
        }
    };
    print_summary(&config, &report);
    Ok(())
}

fn usage_error(err: SearchError) -> ! {
    eprintln!("{} {}", "error:".red().bold(), err);
    std::process::exit(USAGE_EXIT_CODE);
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(config: &SearchConfig, report: &RunReport) {
    eprintln!(
        "Searched {} combinations in {} ({} files scanned)",
        report.combinations.to_string().green(),
        humantime::format_duration(report.elapsed),
        report.metrics.files_scanned
    );
    eprintln!(
        "Wrote {} lines to {} ({} duplicates suppressed)",
        report.writer.written.to_string().green(),
        config.output_file.display().to_string().blue(),
        report.writer.duplicates
    );
    if report.metrics.scan_errors > 0 {
        eprintln!(
            "{}",
            format!("{} files could not be read", report.metrics.scan_errors).yellow()
        );
    }
    if !report.failed_combos.is_empty() {
        eprintln!(
            "{}",
            format!(
                "{} combinations could not be searched",
                report.failed_combos.len()
            )
            .red()
        );
    }
}
