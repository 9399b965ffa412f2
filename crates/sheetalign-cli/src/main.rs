// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sheetalign — command-line host for the answer-sheet alignment pipeline.
//
// Entry point. Initialises logging, loads configuration, and dispatches to the
// align / marks / template subcommands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use sheetalign_align::raster::load_raster;
use sheetalign_align::{AlignmentOrchestrator, MarkDetector, save_raster};
use sheetalign_core::human_errors::{HumanError, humanize_error};
use sheetalign_core::{AlignConfig, AlignError, MarkRecord, RasterImage};

#[derive(Parser)]
#[command(name = "sheetalign")]
#[command(about = "Align photographed answer sheets to a blank template")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Align a sample photo onto a template's pixel grid.
    Align(AlignArgs),

    /// Find option-mark candidates on an already-aligned sheet.
    Marks(MarksArgs),

    /// Report the reference points detected on a template.
    Template(TemplateArgs),
}

#[derive(Debug, Clone, Args)]
struct AlignArgs {
    /// Path to the blank template image.
    #[arg(long)]
    template: PathBuf,

    /// Path to the photographed sample.
    #[arg(long)]
    sample: PathBuf,

    /// Path to write the aligned image.
    #[arg(long)]
    out: PathBuf,

    /// Also write mark candidates of the aligned image (JSON).
    #[arg(long)]
    marks: Option<PathBuf>,

    /// Pipeline configuration (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct MarksArgs {
    /// Path to an aligned sheet image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write mark candidates (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Pipeline configuration (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct TemplateArgs {
    /// Path to the template image.
    #[arg(long)]
    image: PathBuf,

    /// Pipeline configuration (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Align(args) => run_align(args).await,
        Commands::Marks(args) => run_marks(args).await,
        Commands::Template(args) => run_template(args).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(human) => {
            report(&human);
            ExitCode::FAILURE
        }
    }
}

type CliResult<T> = Result<T, HumanError>;

fn load_config(path: Option<&Path>) -> CliResult<AlignConfig> {
    match path {
        Some(path) => AlignConfig::load(path).map_err(|e| humanize_error(&e)),
        None => Ok(AlignConfig::default()),
    }
}

async fn read_image(path: &Path) -> CliResult<RasterImage> {
    load_raster(path).await.map_err(|e| humanize_error(&e))
}

fn write_marks(marks: &[MarkRecord], path: &Path) -> CliResult<()> {
    let json = serde_json::to_string_pretty(marks)
        .map_err(|e| humanize_error(&AlignError::Serialization(e)))?;
    std::fs::write(path, json).map_err(|e| humanize_error(&AlignError::Io(e)))?;
    tracing::info!(count = marks.len(), path = %path.display(), "Mark candidates written");
    Ok(())
}

async fn run_align(args: AlignArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let mark_config = config.marks.clone();

    let mut orchestrator = AlignmentOrchestrator::new(config);
    orchestrator
        .initialize_from_path(&args.template)
        .await
        .map_err(|e| humanize_error(&e))?;

    let sample = read_image(&args.sample).await?;
    let result = orchestrator.align_user_image(&sample).await;
    let aligned = match (result.image, result.human) {
        (Some(image), _) => image,
        (None, Some(human)) => return Err(human),
        (None, None) => {
            return Err(humanize_error(&AlignError::Input(
                result.error.unwrap_or_else(|| "alignment produced no image".into()),
            )));
        }
    };

    save_raster(&aligned, &args.out).map_err(|e| humanize_error(&e))?;
    println!(
        "aligned {} -> {} ({:?})",
        args.sample.display(),
        args.out.display(),
        result.method
    );

    if let Some(marks_path) = args.marks {
        let marks = MarkDetector::new(mark_config)
            .detect(&aligned)
            .map_err(|e| humanize_error(&e))?;
        write_marks(&marks, &marks_path)?;
    }

    orchestrator.teardown();
    Ok(())
}

async fn run_marks(args: MarksArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let image = read_image(&args.image).await?;
    let marks = MarkDetector::new(config.marks)
        .detect(&image)
        .map_err(|e| humanize_error(&e))?;
    write_marks(&marks, &args.out)?;
    println!("{} mark candidates -> {}", marks.len(), args.out.display());
    Ok(())
}

async fn run_template(args: TemplateArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let mut orchestrator = AlignmentOrchestrator::new(config);
    let session = orchestrator
        .initialize_from_path(&args.image)
        .await
        .map_err(|e| humanize_error(&e))?;

    println!("session:  {}", session.id);
    println!(
        "size:     {}x{}",
        session.template_size.width, session.template_size.height
    );
    println!("points:   {} ({:?})", session.template_points.len(), session.point_source);
    for p in session.template_points.points() {
        println!("  ({:.1}, {:.1})", p.x, p.y);
    }
    Ok(())
}

fn report(human: &HumanError) {
    eprintln!("error: {}", human.message);
    eprintln!("  {}", human.suggestion);
    if human.retriable {
        eprintln!("  (a new photo of the same sheet may work)");
    }
}
