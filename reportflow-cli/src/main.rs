//! # reportflow
//!
//! Command-line driver for reportflow pipelines.
//!
//! ```bash
//! # Dry-run every configured stage with pass-through handlers
//! reportflow run --config pipeline.json
//!
//! # Resume at stage 30 from a known manifest, skipping 40
//! reportflow run --config pipeline.json --start 30 --skip 40 --input 30=manifests/Validate_20240101_120000.json
//!
//! # Show which stages a request would run
//! reportflow plan --config pipeline.json --start 20 --stop 40
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use reportflow::config::{LoadedPipeline, PipelineConfig};
use reportflow::core::{Severity, StageNumber};
use reportflow::observability::init_tracing;
use reportflow::pipeline::{Orchestrator, RunPlan, RunRequest};
use reportflow::stages::StageRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "reportflow", version, about = "Sequential stage orchestration for reporting pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the configured stages with pass-through handlers
    Run {
        #[command(flatten)]
        bounds: Bounds,

        /// Explicit input manifest for a stage, as N=PATH
        #[arg(long = "input", value_parser = parse_input)]
        inputs: Vec<(u32, PathBuf)>,

        /// Log output format
        #[arg(long, value_enum, default_value_t = LogFormat::Text)]
        log_format: LogFormat,
    },
    /// Print the stages a request would run
    Plan {
        #[command(flatten)]
        bounds: Bounds,
    },
    /// Validate the configuration and its incident catalog
    Validate {
        /// Pipeline configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Debug, Args)]
struct Bounds {
    /// Pipeline configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// First stage to run
    #[arg(long)]
    start: Option<u32>,

    /// Last stage to run
    #[arg(long)]
    stop: Option<u32>,

    /// Stage to skip; repeatable
    #[arg(long)]
    skip: Vec<u32>,
}

impl Bounds {
    fn request(&self) -> RunRequest {
        let mut request = RunRequest::new();
        if let Some(start) = self.start {
            request = request.with_start(start);
        }
        if let Some(stop) = self.stop {
            request = request.with_stop(stop);
        }
        self.skip
            .iter()
            .fold(request, |request, &stage| request.with_skip(stage))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn parse_input(raw: &str) -> Result<(u32, PathBuf), String> {
    let (stage, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected N=PATH, got '{raw}'"))?;
    let stage = stage
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid stage number '{stage}': {e}"))?;
    if path.is_empty() {
        return Err(format!("missing path for stage {stage}"));
    }
    Ok((stage, PathBuf::from(path)))
}

fn load(path: &Path) -> Result<LoadedPipeline> {
    PipelineConfig::load(path).with_context(|| format!("loading {}", path.display()))
}

fn format_stages(stages: &[StageNumber]) -> String {
    stages
        .iter()
        .map(|n| n.get().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

async fn run(bounds: &Bounds, inputs: Vec<(u32, PathBuf)>, log_format: LogFormat) -> Result<i32> {
    let LoadedPipeline {
        config,
        catalog,
        warnings,
    } = load(&bounds.config)?;
    init_tracing(config.log_level, log_format == LogFormat::Json);
    for warning in warnings {
        tracing::warn!(pipeline = %config.name, "{warning}");
    }

    let registry = StageRegistry::pass_through(&config);
    let request = inputs
        .into_iter()
        .fold(bounds.request(), |request, (stage, path)| {
            request.with_input(stage, path)
        });

    let report = Orchestrator::new(registry)
        .run(Arc::new(config), Arc::new(catalog), &request)
        .await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.exit_code())
}

fn plan(bounds: &Bounds) -> Result<()> {
    let config = load(&bounds.config)?.config;
    let plan = RunPlan::from_request(&config.stage_numbers(), &bounds.request());
    let skipped: Vec<StageNumber> = plan.skipped().iter().copied().collect();

    println!("bounded: {}", format_stages(plan.bounded()));
    println!("skipped: {}", format_stages(&skipped));
    println!("run:     {}", format_stages(&plan.run_list()));
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    let LoadedPipeline {
        config,
        catalog,
        warnings,
    } = load(path)?;
    for warning in &warnings {
        println!("warning: {warning}");
    }
    println!(
        "{}: {} stages, {} incident codes, {} warnings",
        config.name,
        config.stages.len(),
        catalog.len(),
        warnings.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            bounds,
            inputs,
            log_format,
        } => run(&bounds, inputs, log_format).await,
        Command::Plan { bounds } => {
            init_tracing(Severity::Warning, false);
            plan(&bounds).map(|()| 0)
        }
        Command::Validate { config } => {
            init_tracing(Severity::Warning, false);
            validate(&config).map(|()| 0)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(
            parse_input("30=manifests/Validate.json").unwrap(),
            (30, PathBuf::from("manifests/Validate.json"))
        );
        assert!(parse_input("30").is_err());
        assert!(parse_input("x=a.json").is_err());
        assert!(parse_input("30=").is_err());
    }

    #[test]
    fn test_bounds_request() {
        let cli = Cli::parse_from([
            "reportflow", "plan", "--config", "p.json", "--start", "20", "--skip", "30", "--skip",
            "40",
        ]);
        let Command::Plan { bounds } = cli.command else {
            panic!("expected plan");
        };
        let request = bounds.request();
        assert_eq!(request.start, Some(StageNumber(20)));
        assert_eq!(request.stop, None);
        assert_eq!(request.skip.len(), 2);
    }

    #[test]
    fn test_run_args() {
        let cli = Cli::parse_from([
            "reportflow", "run", "-c", "p.json", "--input", "20=a.json", "--log-format", "json",
        ]);
        let Command::Run {
            inputs, log_format, ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(inputs, vec![(20, PathBuf::from("a.json"))]);
        assert_eq!(log_format, LogFormat::Json);
    }

    #[test]
    fn test_validate_reports_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"name": "empty", "stages": []}"#).unwrap();
        assert!(validate(&path).is_err());
    }
}
