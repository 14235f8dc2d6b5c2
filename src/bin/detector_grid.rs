//! Command-line front end: validate results, list mappings, generate example
//! data and render detector grids or animations.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};

use detector_grid::api::{
    GridRenderOptions, GridVisualizationService, VisualizationConfig, load_document_from_path,
    write_example_document,
};
use detector_grid::core::{DocumentSummary, ExampleDataConfig, FactorType, ResultsDocument};
use detector_grid::telemetry::init_default_tracing;
use detector_grid::{GridError, GridResult};

#[derive(Parser, Debug)]
#[command(name = "detector-grid")]
#[command(about = "Render detector ageing factors onto physical channel grids")]
#[command(version)]
struct Cli {
    /// Results JSON file to read.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (png, jpg, svg, gif); also the target of --generate-example.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Detector mapping to render.
    #[arg(short, long, value_parser = ["fta", "ftc"])]
    detector: Option<String>,

    /// Directory containing mapping CSV files.
    #[arg(long)]
    mappings_dir: Option<PathBuf>,

    /// List available detector mappings and exit.
    #[arg(long)]
    list_mappings: bool,

    /// Dataset date to render (exact match); defaults to the last dataset.
    #[arg(long)]
    date: Option<String>,

    /// Ageing factor to display.
    #[arg(long)]
    factor_type: Option<String>,

    /// Color scale: custom, RdYlGn, viridis, plasma, coolwarm, RdBu, seismic.
    #[arg(long)]
    colormap: Option<String>,

    /// Value mapped to the bottom of the color scale.
    #[arg(long)]
    vmin: Option<f64>,

    /// Value mapped to the top of the color scale.
    #[arg(long)]
    vmax: Option<f64>,

    /// Render an animated GIF over all available dates.
    #[arg(long)]
    gif: bool,

    /// Frame duration in milliseconds.
    #[arg(long)]
    gif_duration: Option<u32>,

    /// GIF repeat count (0 loops forever).
    #[arg(long)]
    gif_loop: Option<u16>,

    /// Write example results JSON to --output and exit.
    #[arg(long)]
    generate_example: bool,

    /// Validate --input and exit.
    #[arg(long)]
    validate: bool,

    /// Print a summary of --input.
    #[arg(long)]
    summary: bool,

    /// JSON configuration file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = init_default_tracing(if cli.verbose { "debug" } else { "info" });

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "detector-grid failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> GridResult<()> {
    let config = resolve_config(cli)?;

    if cli.list_mappings {
        list_mappings(&GridVisualizationService::with_config(config));
        return Ok(());
    }

    if cli.generate_example {
        let output = require(cli.output.as_deref(), "--output is required for --generate-example")?;
        let detector = cli.detector.as_deref().unwrap_or("fta");
        write_example_document(output, &ExampleDataConfig::for_detector(detector))?;
        println!("Generated example data for '{detector}' detector");
        println!("  Saved to: {}", output.display());
        println!(
            "  Visualize with: detector-grid -i {} -o output.png -d {detector}",
            output.display()
        );
        return Ok(());
    }

    let input = require(cli.input.as_deref(), "--input is required")?;
    let document = load_document_from_path(input)?;
    println!("Data validation successful: {}", input.display());
    if cli.summary {
        print_summary(&document);
    }
    if cli.validate {
        return Ok(());
    }

    let output = require(cli.output.as_deref(), "--output is required for visualization")?;
    let detector = require(cli.detector.as_deref(), "--detector is required for visualization")?;
    render(cli, config, &document, detector, output)
}

fn resolve_config(cli: &Cli) -> GridResult<VisualizationConfig> {
    let mut config = match &cli.config {
        Some(path) => VisualizationConfig::load(path)?,
        None => VisualizationConfig::default(),
    };
    if let Some(dir) = &cli.mappings_dir {
        config = config.with_mappings_dir(dir.clone());
    }
    if let Some(factor_type) = &cli.factor_type {
        config = config.with_factor_type(factor_type.clone());
    }
    if let Some(colormap) = &cli.colormap {
        config = config.with_color_scale(colormap.clone());
    }
    let scale_min = cli.vmin.unwrap_or(config.scale_min);
    let scale_max = cli.vmax.unwrap_or(config.scale_max);
    config = config.with_scale_range(scale_min, scale_max);
    if let Some(duration) = cli.gif_duration {
        config = config.with_frame_duration_ms(duration);
    }
    if let Some(loop_count) = cli.gif_loop {
        config = config.with_loop_count(loop_count);
    }
    config.validate()?;

    if FactorType::from_name(&config.factor_type).is_none() {
        warn!(factor_type = %config.factor_type, "factor type is not one of the known names");
    }
    Ok(config)
}

fn render(
    cli: &Cli,
    config: VisualizationConfig,
    document: &ResultsDocument,
    detector: &str,
    output: &Path,
) -> GridResult<()> {
    let service = GridVisualizationService::with_config(config);
    let options = service.default_options()?.with_selected_date(cli.date.clone());

    if cli.gif {
        println!("Creating animated GIF for '{detector}' detector...");
        let timing = service.config().animation_timing();
        let animation = service
            .render_animation(detector, document, &options, timing)?
            .ok_or_else(|| missing_mapping(&service, detector))?;
        animation.save(output)?;
        println!(
            "Animated GIF saved to: {} ({} frames)",
            output.display(),
            animation.len()
        );
        return Ok(());
    }

    println!("Creating visualization for '{detector}' detector...");
    if let Some(date) = &cli.date {
        println!("  Date: {date}");
    }
    println!("  Factor type: {}", options.factor_type);
    let image = service
        .render_grid(detector, document, &options)?
        .ok_or_else(|| missing_mapping(&service, detector))?;
    let written = image.save(output)?;
    println!("Visualization saved to: {}", written.display());
    Ok(())
}

fn list_mappings(service: &GridVisualizationService) {
    let mappings = service.available_mappings();
    if mappings.is_empty() {
        println!("No mappings found in {}", service.mappings_dir().display());
        return;
    }
    println!("Available detector mappings:");
    for mapping in mappings {
        println!("  {}", mapping.name);
        println!("    Channels: {}", mapping.channel_count);
        if let Some(path) = &mapping.file_path {
            println!("    File: {}", path.display());
        }
    }
}

fn print_summary(document: &ResultsDocument) {
    let summary = DocumentSummary::of(document);
    println!("Data summary:");
    println!("  Total datasets: {}", summary.total_datasets);
    println!("  Dates: {}", summary.dates.join(", "));
    println!("  Unique modules: {}", summary.unique_modules);
    println!("  Modules: {}", summary.modules.join(", "));
    println!("  Total channels: {}", summary.total_channels);
}

fn missing_mapping(service: &GridVisualizationService, detector: &str) -> GridError {
    let available: Vec<String> = service
        .available_mappings()
        .into_iter()
        .map(|summary| summary.name)
        .collect();
    GridError::InvalidData(format!(
        "mapping `{detector}` not found (available: {})",
        available.join(", ")
    ))
}

fn require<'a, T: ?Sized>(value: Option<&'a T>, message: &str) -> GridResult<&'a T> {
    value.ok_or_else(|| GridError::InvalidData(message.to_owned()))
}
