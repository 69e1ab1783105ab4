//! CLI entry point for the cleaning pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use lex_tidy::pipeline::PipelineRun;
use lex_tidy::{
    CleaningConfig, NumericImputation, Orchestrator, OutlierMethod, PipelineStage,
    ReportGenerator, RuleEngine, RunReport, StageStatus,
};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Environment variable naming a default config file.
const CONFIG_ENV_VAR: &str = "LEX_TIDY_CONFIG";

/// CLI-compatible numeric imputation strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliNumericImputation {
    /// Use the mean of non-missing values
    Mean,
    /// Use the median of non-missing values
    Median,
    /// Use zero as the fill value
    Zero,
}

impl From<CliNumericImputation> for NumericImputation {
    fn from(cli: CliNumericImputation) -> Self {
        match cli {
            CliNumericImputation::Mean => NumericImputation::Mean,
            CliNumericImputation::Median => NumericImputation::Median,
            CliNumericImputation::Zero => NumericImputation::Zero,
        }
    }
}

/// CLI-compatible outlier envelope enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// mean ± z·std
    Zscore,
    /// Tukey fences around the interquartile range
    Iqr,
}

impl From<CliOutlierMethod> for OutlierMethod {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::Zscore => OutlierMethod::ZScore,
            CliOutlierMethod::Iqr => OutlierMethod::Iqr,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Rule-driven tabular data cleaning and validation",
    long_about = "Cleans a CSV or spreadsheet file through an audited, staged pipeline.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  LEX_TIDY_CONFIG    Cleaning config used when --config is not given\n  \
                  RUST_LOG           Overrides --log-level\n\n\
                  EXAMPLES:\n  \
                  # Clean with default rules\n  \
                  lex-tidy -i movies.csv\n\n  \
                  # Use a config file and write into results/\n  \
                  lex-tidy -i movies.xlsx -c cleaning.json -o results/\n\n  \
                  # Preview the rule plan without cleaning\n  \
                  lex-tidy -i movies.csv --dry-run"
)]
struct Args {
    /// Path to the CSV or spreadsheet file to clean
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for the cleaned file and report
    #[arg(short, long, default_value = "outputs")]
    output: PathBuf,

    /// Cleaning configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the numeric imputation strategy
    #[arg(long, value_enum)]
    numeric_imputation: Option<CliNumericImputation>,

    /// Override the outlier envelope
    #[arg(long, value_enum)]
    outlier_method: Option<CliOutlierMethod>,

    /// Override the drift threshold (standardized mean shift)
    #[arg(long)]
    drift_threshold: Option<f64>,

    /// Profile the file and show the rule plan without cleaning
    #[arg(long)]
    dry_run: bool,

    /// Output the run report as JSON on stdout
    ///
    /// Disables all logs; only the report is written to stdout.
    #[arg(long)]
    json: bool,

    /// Only show warnings, errors and the final result
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Initialize the tracing subscriber for logging.
///
/// Logging is disabled entirely with `--json` so stdout carries only the
/// report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = load_config(&args)?;
    let mut builder = Orchestrator::builder()
        .config(config)
        .output_dir(&args.output);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    let mut orchestrator = builder.build()?;
    orchestrator.upload_path(&args.input)?;

    if args.dry_run {
        return run_dry_run(&args, &mut orchestrator);
    }

    run_pipeline(&args, &mut orchestrator)
}

/// Resolve the cleaning config: `--config`, then `LEX_TIDY_CONFIG`, then
/// defaults. CLI overrides are applied last.
fn load_config(args: &Args) -> Result<CleaningConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

    let mut config = match path {
        Some(path) => {
            info!("Loading config from: {}", path.display());
            CleaningConfig::from_json_file(&path)?
        }
        None => CleaningConfig::default(),
    };

    if let Some(strategy) = args.numeric_imputation {
        config.numeric_imputation = strategy.into();
    }
    if let Some(method) = args.outlier_method {
        config.outlier_method = method.into();
    }
    if let Some(threshold) = args.drift_threshold {
        config.drift_threshold = threshold;
    }

    config.validate()?;
    Ok(config)
}

/// Run every stage, then print or emit the report.
fn run_pipeline(args: &Args, orchestrator: &mut Orchestrator) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let outcome = orchestrator.run_to_completion().map(|_| ());
    if let Err(e) = &outcome {
        error!("Pipeline failed: {}", e);
    }

    let run = orchestrator
        .run()
        .ok_or_else(|| anyhow!("No dataset was uploaded"))?;
    let cleaned_file = run.export().map(|e| e.cleaned_file.as_path());
    let report = ReportGenerator::build_report(run, orchestrator.config(), cleaned_file);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human_readable_summary(&report, run);
    }

    outcome?;
    if let Some(stage) = run.failed_stage() {
        return Err(anyhow!("Run halted at {}", stage.display_name()));
    }
    Ok(())
}

/// Show the raw overview, profile and rule plan without cleaning.
///
/// Uses `println!` on purpose: this output is the point of `--dry-run` and
/// must show regardless of log level.
fn run_dry_run(args: &Args, orchestrator: &mut Orchestrator) -> Result<()> {
    for stage in [PipelineStage::RawOverview, PipelineStage::Profiling] {
        if orchestrator.run_stage(stage)? == StageStatus::Fail {
            break;
        }
    }
    let run = orchestrator
        .run()
        .ok_or_else(|| anyhow!("No dataset was uploaded"))?;

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of cleaning rules");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input.display());
    if let Some(overview) = run.overview() {
        println!("  Rows: {}", overview.rows);
        println!("  Columns: {}", overview.columns);
        println!(
            "  Missing cells: {} of {}",
            overview.missing_cells, overview.total_cells
        );
        println!("  Duplicate rows: {}", overview.duplicate_rows);
        if !overview.missing_required.is_empty() {
            println!(
                "  MISSING REQUIRED COLUMNS: {}",
                overview.missing_required.join(", ")
            );
        }
    }
    println!();

    if let Some(analyzed) = run.analyzed() {
        println!("COLUMN PROFILES");
        println!("{}", "-".repeat(40));
        println!(
            "{:<24} {:<10} {:<10} {:<10} {:<8}",
            "Column", "Type", "Missing %", "Distinct", "Flags"
        );
        println!("{}", "-".repeat(70));

        for col in &analyzed.statistics().columns {
            let mut flags = Vec::new();
            if col.likely_identifier {
                flags.push("id");
            }
            if col.is_constant {
                flags.push("constant");
            }
            if col.high_missing {
                flags.push("sparse");
            }
            if col.outlier_likely {
                flags.push("outliers");
            }
            println!(
                "{:<24} {:<10} {:<10.1} {:<10} {:<8}",
                truncate_str(&col.name, 23),
                col.inferred_type.display_name(),
                col.missing_fraction() * 100.0,
                col.cardinality,
                flags.join(",")
            );
        }
        println!();

        if let Some(score) = run.raw_score() {
            println!("Raw quality score: {} ({})", score.score, score.grade);
        }
        match orchestrator.projected_score(orchestrator.config()) {
            Ok(score) => println!("Projected score after cleaning: {} ({})", score.score, score.grade),
            Err(e) => warn!("Could not project score: {}", e),
        }
        println!();
    }

    println!("RULE PLAN");
    println!("{}", "-".repeat(40));
    for entry in RuleEngine::new(orchestrator.config().clone()).plan() {
        let state = if entry.enabled { "run" } else { "skip" };
        println!("  [{state:<4}] {:<28} {:?}", entry.rule_id, entry.tier);
    }
    println!();

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    let source = run.raw().source_name();
    println!(
        "  - {}",
        args.output
            .join(lex_tidy::io::cleaned_file_name(source))
            .display()
    );
    println!(
        "  - {}",
        args.output
            .join(format!("{}_report.json", extract_file_stem(&args.input)))
            .display()
    );
    println!();

    println!("{}", "=".repeat(80));
    println!("To clean the file, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn extract_file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Print a human-readable summary of the run.
fn print_human_readable_summary(report: &RunReport, run: &PipelineRun) {
    let summary = &report.summary;

    println!();
    println!("{}", "=".repeat(80));
    if summary.halted {
        println!("CLEANING HALTED");
    } else {
        println!("CLEANING COMPLETE");
    }
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.source_file, summary.rows_before, summary.columns_before
    );
    if let Some(ref output_file) = report.cleaned_file {
        println!(
            "Output: {} ({} rows x {} columns)",
            output_file,
            summary.rows_after.unwrap_or_default(),
            summary.columns_after.unwrap_or_default()
        );
    }
    if let Some(report_file) = run.export().and_then(|e| e.report_file.as_ref()) {
        println!("Report: {}", report_file.display());
    }
    println!();

    println!("Stages:");
    for transition in &report.stages {
        println!(
            "  {:<14} {}",
            transition.stage.display_name(),
            transition.status.display_name()
        );
    }
    println!();

    if let Some(ref failure) = report.failure {
        println!("Failure:");
        println!("  Stage: {}", failure.stage.display_name());
        println!("  Cause: {}", failure.cause);
        if let Some(ref rule) = failure.rule_id {
            println!("  Rule: {}", rule);
        }
        if let Some(ref column) = failure.column {
            println!("  Column: {}", column);
        }
        println!();
    }

    println!("Quality:");
    if let Some(ref raw) = report.raw_score {
        println!("  Before cleaning: {} ({})", raw.score, raw.grade);
    }
    if let Some(ref score) = report.final_score {
        println!("  After cleaning:  {} ({})", score.score, score.grade);
        for deduction in score.deductions.iter().take(5) {
            println!("    -{:.1} {}", deduction.points, deduction.reason);
        }
        if score.deductions.len() > 5 {
            println!("    ... and {} more deductions", score.deductions.len() - 5);
        }
    }
    println!();

    if !report.changes_by_rule.is_empty() {
        println!(
            "Changes ({} recorded, {} rows touched):",
            summary.changes_recorded, summary.rows_touched
        );
        for count in &report.changes_by_rule {
            println!("  - {}: {}", count.rule_id, count.changes);
        }
        println!();
    }

    if !report.findings.is_empty() {
        println!("Findings:");
        for finding in report.findings.iter().take(10) {
            println!(
                "  ! [{}] {}",
                finding.severity.display_name(),
                finding.description
            );
        }
        if report.findings.len() > 10 {
            println!("  ... and {} more findings", report.findings.len() - 10);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --dry-run to preview the rule plan");
    println!("{}", "=".repeat(80));
}
