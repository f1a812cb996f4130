//! ResizeDrop CLI - resize a selection of images and deliver them in
//! throttled chunks

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};
use walkdir::WalkDir;

use resizedrop::delivery::DeliveryEvent;
use resizedrop::processing::has_supported_extension;
use resizedrop::session::render_gallery;
use resizedrop::{
    init_with_config, AlwaysFocused, Config, DirectorySink, ImageResizer, ProcessingEngine,
    SelectionReport, SessionEvent, SessionState, SourceFile,
};

/// ResizeDrop - batch image resizer with throttled delivery
#[derive(Parser)]
#[command(
    name = "resizedrop",
    version,
    about = "Resize a selection of images and deliver them in throttled chunks",
    long_about = "ResizeDrop resizes every selected image to fit a target width and height, \
                  encodes it (PNG by default) and writes the results to an output directory \
                  eight at a time, pausing five seconds between chunks.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Image files or directories, in selection order
    #[arg(value_name = "PATH")]
    inputs: Vec<PathBuf>,

    /// Maximum width in pixels [default: 35]
    #[arg(short, long, value_name = "PIXELS")]
    width: Option<u32>,

    /// Maximum height in pixels [default: 30]
    #[arg(short = 'H', long, value_name = "PIXELS")]
    height: Option<u32>,

    /// Output directory [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Configuration file path (.toml or .yaml)
    #[arg(short, long, value_name = "FILE", env = "RESIZEDROP_CONFIG")]
    config: Option<PathBuf>,

    /// Descend into subdirectories of directory inputs
    #[arg(short = 'R', long)]
    recursive: bool,

    /// Write an HTML preview grid of the results
    #[arg(long, value_name = "FILE")]
    gallery: Option<PathBuf>,

    /// Print a JSON summary instead of text output
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Validate configuration file
    Config {
        /// Configuration file to validate
        file: PathBuf,
    },
    /// Generate example configuration file
    ExampleConfig {
        /// Output file path
        #[arg(short, long, default_value = "resizedrop.toml")]
        output: PathBuf,
        /// Use YAML format instead of TOML
        #[arg(long)]
        yaml: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        if let Err(e) = handle_subcommand(command) {
            eprintln!("{}: {}", style("Error").red().bold(), e);
            process::exit(1);
        }
        return;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", style("Error").red().bold(), e);
            process::exit(1);
        }
    };

    if let Err(e) = init_with_config(&config) {
        eprintln!("{}: Failed to initialize logging: {}", style("Error").red().bold(), e);
        process::exit(1);
    }

    if cli.inputs.is_empty() {
        eprintln!("{}: No input files given", style("Error").red().bold());
        eprintln!("Run with --help for usage information");
        process::exit(1);
    }

    let files = match select_files(&cli.inputs, cli.recursive).await {
        Ok(files) if files.is_empty() => {
            eprintln!("{}: No image files found in the given paths", style("Error").red().bold());
            process::exit(1);
        }
        Ok(files) => files,
        Err(e) => {
            eprintln!("{}: {}", style("Error").red().bold(), e);
            process::exit(1);
        }
    };

    let output_dir = config
        .delivery
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    info!("Selected {} files, writing to {:?}", files.len(), output_dir);

    let resizer = ImageResizer::new(
        ProcessingEngine::new(),
        DirectorySink::new(&output_dir),
        AlwaysFocused,
    )
    .with_config(&config);

    let progress = (!cli.json && !cli.quiet).then(|| spawn_progress(resizer.subscribe()));

    let start_time = Instant::now();
    let report = resizer.handle_selection(files).await;
    let duration = start_time.elapsed();

    if let Some(handle) = progress {
        let _ = handle.await;
    }

    let state = resizer.snapshot();

    if let Some(path) = &cli.gallery {
        if let Err(e) = std::fs::write(path, render_gallery(&state.results)) {
            eprintln!("{}: Failed to write gallery {}: {}", style("Error").red().bold(), path.display(), e);
        }
    }

    if cli.json {
        print_json(&report, &state);
    } else if !cli.quiet {
        print_summary(&resizer.listing(), &report, &state, duration);
    }

    if !report.succeeded() {
        process::exit(1);
    }
}

/// Handle subcommands
fn handle_subcommand(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Config { file } => validate_config_file(&file)?,
        Commands::ExampleConfig { output, yaml } => generate_example_config(&output, yaml)?,
    }
    Ok(())
}

/// Load the config file (if any) and apply command-line overrides
fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(width) = cli.width {
        config.resize.width = width;
    }
    if let Some(height) = cli.height {
        config.resize.height = height;
    }
    if let Some(output) = &cli.output {
        config.delivery.output_dir = Some(output.clone());
    }

    if cli.quiet {
        config.logging.level = "error".to_string();
    } else if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Expand inputs into an ordered file list and read each file
async fn select_files(
    inputs: &[PathBuf],
    recursive: bool,
) -> Result<Vec<SourceFile>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_file() {
            // Explicitly named files are taken as-is
            paths.push(input.clone());
        } else if input.is_dir() {
            let max_depth = if recursive { usize::MAX } else { 1 };
            for entry in WalkDir::new(input).max_depth(max_depth).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
        } else {
            return Err(format!("Input path does not exist: {}", input.display()).into());
        }
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        debug!("Reading {:?}", path);
        files.push(SourceFile::from_path(path).await?);
    }
    Ok(files)
}

/// Render session events as a progress bar until the selection completes
fn spawn_progress(mut events: broadcast::Receiver<SessionEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message("Resizing...");
        spinner.enable_steady_tick(std::time::Duration::from_millis(120));
        let mut bar: Option<ProgressBar> = None;

        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event {
                SessionEvent::ResultsStored { count } => {
                    spinner.finish_and_clear();
                    let pb = ProgressBar::new(count as u64);
                    if let Ok(bar_style) = ProgressStyle::default_bar()
                        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                    {
                        pb.set_style(bar_style.progress_chars("#>-"));
                    }
                    bar = Some(pb);
                }
                SessionEvent::Delivery(DeliveryEvent::ChunkStarted { index, total, .. }) => {
                    if let Some(pb) = &bar {
                        pb.set_message(format!("chunk {}/{}", index + 1, total));
                    }
                }
                SessionEvent::Delivery(DeliveryEvent::Downloaded { .. }) => {
                    if let Some(pb) = &bar {
                        pb.inc(1);
                    }
                }
                SessionEvent::Delivery(DeliveryEvent::Paused { duration }) => {
                    if let Some(pb) = &bar {
                        pb.set_message(format!("waiting {}s", duration.as_secs()));
                    }
                }
                SessionEvent::Delivery(DeliveryEvent::Warning { message })
                | SessionEvent::Alert { message } => {
                    let line = format!("{}: {}", style("Warning").yellow().bold(), message);
                    match &bar {
                        Some(pb) => pb.println(line),
                        None => spinner.println(line),
                    }
                }
                SessionEvent::Completed { .. } => break,
                SessionEvent::PhaseChanged(_) => {}
            }
        }

        spinner.finish_and_clear();
        if let Some(pb) = bar {
            pb.finish_and_clear();
        }
    })
}

/// Validate configuration file
fn validate_config_file(file_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(file_path)?;
    config.validate()?;

    println!("{}: Configuration file is valid", style("Success").green().bold());
    println!(
        "Target: {}x{} {:?}, chunks of {} every {}ms",
        config.resize.width,
        config.resize.height,
        config.resize.format,
        config.delivery.batch_size,
        config.delivery.pause_ms
    );

    Ok(())
}

/// Generate example configuration file
fn generate_example_config(output_path: &Path, use_yaml: bool) -> Result<(), Box<dyn std::error::Error>> {
    let output_path = if use_yaml {
        output_path.with_extension("yaml")
    } else {
        output_path.to_path_buf()
    };

    Config::default().to_file(&output_path)?;

    let format = if use_yaml { "YAML" } else { "TOML" };
    println!("{}: Generated example {} configuration: {}",
             style("Success").green().bold(),
             format,
             output_path.display());

    Ok(())
}

/// Print the result grid, alerts and completion notice
fn print_summary(
    listing: &[String],
    report: &SelectionReport,
    state: &SessionState,
    duration: std::time::Duration,
) {
    if !listing.is_empty() {
        println!("{}", style(format!("Resized images (total: {}):", listing.len())).bold());
        for line in listing {
            println!("  {line}");
        }
    }

    if let Some(error) = &report.error {
        eprintln!("{}: {}", style("Error").red().bold(), error.user_message());
    }
    for line in state.alert.lines() {
        eprintln!("{}", style(line).red());
    }

    println!();
    println!("{}", style(resizedrop::session::COMPLETION_MESSAGE).green().bold());
    println!("  {}: {}", style("Delivered").green(), report.delivery.delivered);
    println!("  {}: {}", style("Chunks").blue(), report.delivery.chunks);
    println!("  {}: {:.2}s", style("Duration").blue(), duration.as_secs_f64());
}

/// JSON summary of a selection
#[derive(Debug, Serialize)]
struct Summary<'a> {
    succeeded: bool,
    resized: usize,
    failed: &'a [String],
    chunks: usize,
    delivered: usize,
    alert: &'a str,
    results: Vec<ResultEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct ResultEntry<'a> {
    index: usize,
    name: &'a str,
    width: Option<u32>,
    height: Option<u32>,
    bytes: usize,
}

fn print_json(report: &SelectionReport, state: &SessionState) {
    let summary = Summary {
        succeeded: report.succeeded(),
        resized: report.resized,
        failed: &report.failed,
        chunks: report.delivery.chunks,
        delivered: report.delivery.delivered,
        alert: &state.alert,
        results: state
            .results
            .iter()
            .enumerate()
            .map(|(index, image)| ResultEntry {
                index: index + 1,
                name: &image.name,
                width: image.dimensions.map(|(w, _)| w),
                height: image.dimensions.map(|(_, h)| h),
                bytes: image.bytes.len(),
            })
            .collect(),
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("{}: {}", style("Error").red().bold(), e),
    }
}
