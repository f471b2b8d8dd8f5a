//! # CLI Module
//!
//! Command-line interface for the similar image finder.
//!
//! ## Usage
//! ```bash
//! # Report duplicate groups, never deletes
//! img-dedup scan ~/Pictures
//!
//! # Stricter threshold, descend into subdirectories
//! img-dedup scan ~/Pictures -r -t 0.9
//!
//! # Review each group and delete what you pick
//! img-dedup clean ~/Pictures
//!
//! # See what would be deleted, keep a record
//! img-dedup clean ~/Pictures --dry-run --report report.json
//! ```

mod output;
mod review;

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use similar_image_finder::core::cache::CacheConfig;
use similar_image_finder::core::cleanup::{
    plan_with_selector, DeletionActuator, DeletionPlan, FileDeleter, UnattendedPolicy,
};
use similar_image_finder::core::cluster::DecodePolicy;
use similar_image_finder::core::pipeline::{Pipeline, PipelineResult};
use similar_image_finder::core::scanner::ScanConfig;
use similar_image_finder::error::Result;
use similar_image_finder::events::{null_sender, CompareEvent, Event, EventChannel, PipelineEvent, ScanEvent};
use std::path::PathBuf;
use std::thread;
use tracing::info;

/// Similar Image Finder - group near-duplicate images by structural similarity.
///
/// Grouping is greedy: each image joins the first earlier image it
/// resembles, and similarity is not transitive, so the order in which
/// files are found can change which groups form.
#[derive(Parser, Debug)]
#[command(name = "img-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find duplicate groups and report them. Never deletes anything.
    Scan {
        #[command(flatten)]
        args: ScanArgs,
    },

    /// Find duplicate groups, choose what to delete, and delete it
    Clean {
        #[command(flatten)]
        args: ScanArgs,

        /// DANGER: skip review and keep one RANDOM image per group, deleting
        /// the rest. The kept copy may not be the one you want.
        #[arg(long)]
        no_confirm: bool,

        /// Show what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Write a JSON report of the deletion to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Directories to scan
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Similarity an image must exceed to join a group (strictly between 0 and 1)
    #[arg(short, long, default_value = "0.8", value_parser = parse_threshold)]
    threshold: f64,

    /// Image extensions to look for (repeat or comma-separate)
    #[arg(short, long, value_delimiter = ',', default_values = ["jpg", "jpeg", "png"])]
    formats: Vec<String>,

    /// Search subdirectories too
    #[arg(short, long)]
    recursive: bool,

    /// Include hidden files and directories
    #[arg(long)]
    include_hidden: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Memory budget for decoded images, in MiB
    #[arg(long, default_value_t = 512)]
    cache_mb: usize,

    /// Compare on a single thread
    #[arg(long)]
    sequential: bool,

    /// Stop at the first image that cannot be decoded instead of skipping it
    #[arg(long)]
    strict_decode: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (duplicate paths only)
    Minimal,
}

fn parse_threshold(value: &str) -> std::result::Result<f64, String> {
    let threshold: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if threshold > 0.0 && threshold < 1.0 {
        Ok(threshold)
    } else {
        Err("threshold must be strictly between 0 and 1".to_string())
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { args } => {
            similar_image_finder::init_tracing(args.verbose);
            let result = run_pipeline(&args)?;
            output::print_results(&Term::stdout(), &result, args.output, args.verbose)?;
            if args.output == OutputFormat::Pretty {
                output::print_scan_footer(&Term::stderr());
            }
            Ok(())
        }
        Commands::Clean {
            args,
            no_confirm,
            dry_run,
            report,
        } => {
            similar_image_finder::init_tracing(args.verbose);
            let result = run_pipeline(&args)?;
            output::print_results(&Term::stdout(), &result, args.output, args.verbose)?;
            run_clean(&result, no_confirm, dry_run, report)
        }
    }
}

fn run_pipeline(args: &ScanArgs) -> Result<PipelineResult> {
    let term = Term::stderr();

    if args.output == OutputFormat::Pretty {
        term.write_line(&format!(
            "{} {}",
            style("Similar Image Finder").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let scan_config = ScanConfig::default()
        .recursive(args.recursive)
        .include_hidden(args.include_hidden)
        .extensions(args.formats.iter().cloned());

    let decode_policy = if args.strict_decode {
        DecodePolicy::Abort
    } else {
        DecodePolicy::Skip
    };

    let pipeline = Pipeline::builder()
        .paths(args.paths.clone())
        .threshold(args.threshold)
        .scan_config(scan_config)
        .cache_config(CacheConfig::with_budget_megabytes(args.cache_mb))
        .decode_policy(decode_policy)
        .parallel(!args.sequential)
        .build()?;

    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if args.output == OutputFormat::Pretty && term.is_term() {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = args.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let mut total_images = 0usize;
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Scan(ScanEvent::Progress(p)) => {
                    pb.set_message(format!("Scanning ({} images found)", p.images_found));
                }
                Event::Scan(ScanEvent::Completed { total_images: total }) => {
                    total_images = total;
                    pb.set_length(total as u64);
                }
                Event::Compare(CompareEvent::Progress(p)) => {
                    pb.set_position(total_images.saturating_sub(p.pool_remaining) as u64);
                    if verbose {
                        pb.set_message(format!(
                            "{} comparisons, {} groups",
                            p.comparisons_completed, p.groups_found
                        ));
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Cancelled)
                | Event::Pipeline(PipelineEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the pipeline
    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    result
}

fn run_clean(result: &PipelineResult, no_confirm: bool, dry_run: bool, report_path: Option<PathBuf>) -> Result<()> {
    let term = Term::stderr();

    if result.groups.is_empty() {
        term.write_line("Nothing to clean.").ok();
        return Ok(());
    }

    let plan: DeletionPlan = if no_confirm {
        term.write_line(&format!(
            "{} {}",
            style("WARNING:").red().bold(),
            style("--no-confirm keeps one random image per group and deletes the rest.").red()
        ))
        .ok();
        UnattendedPolicy.plan(&result.groups, &mut rand::thread_rng())
    } else {
        let mut selector = review::TerminalSelector::new();
        let plan = plan_with_selector(&result.groups, &mut selector)?;
        if plan.is_empty() {
            term.write_line("No images selected; nothing deleted.").ok();
            return Ok(());
        }
        if !dry_run && !review::confirm_deletion(&plan)? {
            term.write_line("Cancelled; nothing deleted.").ok();
            return Ok(());
        }
        plan
    };

    info!("{} images selected for deletion", plan.len());

    let deleter = FileDeleter::new().dry_run(dry_run);
    let report = deleter.delete(&plan.delete, &null_sender());

    output::print_deletion_report(&term, &report);

    if let Some(path) = report_path {
        report.write_json(&path)?;
        term.write_line(&format!("Report written to {}", path.display())).ok();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_parser_enforces_open_interval() {
        assert_eq!(parse_threshold("0.8"), Ok(0.8));
        assert!(parse_threshold("0").is_err());
        assert!(parse_threshold("1").is_err());
        assert!(parse_threshold("abc").is_err());
    }

    #[test]
    fn scan_defaults() {
        let cli = Cli::try_parse_from(["img-dedup", "scan", "/photos"]).unwrap();
        let Commands::Scan { args } = cli.command else {
            panic!("expected scan");
        };

        assert_eq!(args.threshold, 0.8);
        assert_eq!(args.formats, vec!["jpg", "jpeg", "png"]);
        assert!(!args.recursive);
        assert_eq!(args.output, OutputFormat::Pretty);
        assert_eq!(args.cache_mb, 512);
    }

    #[test]
    fn clean_accepts_its_flags() {
        let cli = Cli::try_parse_from([
            "img-dedup",
            "clean",
            "/photos",
            "-r",
            "-f",
            "png,gif",
            "--no-confirm",
            "--dry-run",
            "--report",
            "out.json",
        ])
        .unwrap();
        let Commands::Clean {
            args,
            no_confirm,
            dry_run,
            report,
        } = cli.command
        else {
            panic!("expected clean");
        };

        assert!(args.recursive);
        assert_eq!(args.formats, vec!["png", "gif"]);
        assert!(no_confirm && dry_run);
        assert_eq!(report, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn scan_has_no_deletion_flags() {
        assert!(Cli::try_parse_from(["img-dedup", "scan", "/photos", "--no-confirm"]).is_err());
    }

    #[test]
    fn out_of_range_threshold_is_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["img-dedup", "scan", "/photos", "-t", "1.5"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
