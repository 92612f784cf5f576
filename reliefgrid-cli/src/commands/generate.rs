//! Generate command - build a heightmap for an area and write it to disk.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use reliefgrid::config::{ConfigFile, TilesConfig};
use reliefgrid::pipeline::{HeightmapRequest, TerrariumPipeline};
use reliefgrid::progress::{progress_channel, PipelineProgress};
use reliefgrid::HeightmapResult;

use crate::error::CliError;

/// PNG path used when no output is requested explicitly.
const DEFAULT_PNG_OUTPUT: &str = "heightmap.png";

/// Arguments for the generate command.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Center latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Center longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Side length of the square area in kilometers
    #[arg(long)]
    pub area_km: Option<f64>,

    /// Tile zoom level
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Output width and height in pixels
    #[arg(long)]
    pub output_px: Option<u32>,

    /// Write an 8-bit grayscale PNG
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Write a whitespace-delimited text grid (rows bottom-up)
    #[arg(long)]
    pub grid: Option<PathBuf>,

    /// Write a JSON summary with the elevation range
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Terrarium tile endpoint
    #[arg(long)]
    pub base_url: Option<String>,

    /// Tile requests in flight at once
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Highest zoom level the tile endpoint serves
    #[arg(long)]
    pub max_zoom: Option<u8>,
}

/// Where to write results.
#[derive(Debug, Clone, PartialEq)]
struct OutputPaths {
    png: Option<PathBuf>,
    grid: Option<PathBuf>,
    json: Option<PathBuf>,
}

impl OutputPaths {
    fn from_args(args: &GenerateArgs) -> Self {
        let mut paths = Self {
            png: args.png.clone(),
            grid: args.grid.clone(),
            json: args.json.clone(),
        };
        if paths.png.is_none() && paths.grid.is_none() && paths.json.is_none() {
            paths.png = Some(PathBuf::from(DEFAULT_PNG_OUTPUT));
        }
        paths
    }
}

/// Resolve tile settings: CLI takes precedence, then config.
fn resolve_tiles(args: &GenerateArgs, config: &ConfigFile) -> TilesConfig {
    TilesConfig {
        base_url: args
            .base_url
            .clone()
            .unwrap_or_else(|| config.tiles.base_url.clone()),
        timeout_secs: args.timeout.unwrap_or(config.tiles.timeout_secs),
        max_concurrent: args.parallel.unwrap_or(config.tiles.max_concurrent),
        max_zoom: args.max_zoom.or(config.tiles.max_zoom),
    }
}

fn resolve_request(args: &GenerateArgs, config: &ConfigFile) -> HeightmapRequest {
    HeightmapRequest::new(
        args.lat,
        args.lon,
        args.area_km.unwrap_or(config.output.area_km),
        args.output_px.unwrap_or(config.output.output_px),
        args.zoom.unwrap_or(config.output.zoom),
    )
}

/// Run the generate command.
pub fn run(args: GenerateArgs) -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config file, using defaults");
        ConfigFile::default()
    });

    let tiles = resolve_tiles(&args, &config);
    let request = resolve_request(&args, &config);
    request.validate()?;
    let outputs = OutputPaths::from_args(&args);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("Failed to start async runtime: {}", e)))?;

    let cancellation = CancellationToken::new();
    let handler_token = cancellation.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received interrupt, cancelling tile requests...");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    println!(
        "Heightmap for {:.4}, {:.4}: {} km at zoom {}, {}×{} px",
        request.center_lat,
        request.center_lon,
        request.area_km,
        request.zoom,
        request.output_px,
        request.output_px
    );
    println!("Tiles: {}", tiles.base_url);
    println!();

    let heightmap = runtime.block_on(generate(&tiles, &request, &cancellation))?;
    write_outputs(&heightmap, &outputs)?;
    Ok(())
}

async fn generate(
    tiles: &TilesConfig,
    request: &HeightmapRequest,
    cancellation: &CancellationToken,
) -> Result<HeightmapResult, CliError> {
    let (progress, rx) = progress_channel();
    let reporter = tokio::spawn(report_progress(rx));

    let pipeline = TerrariumPipeline::from_tiles_config(tiles)?.with_progress(progress);
    let result = pipeline.generate(request, cancellation).await;

    // Closing the channel ends the reporter.
    drop(pipeline);
    if let Err(e) = reporter.await {
        warn!(error = %e, "Progress reporter stopped unexpectedly");
    }

    Ok(result?)
}

fn tile_bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} tiles {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Surfaces pipeline progress on stderr until the channel closes.
async fn report_progress(mut rx: UnboundedReceiver<PipelineProgress>) {
    let bar = ProgressBar::new(0);
    bar.set_style(tile_bar_style());

    while let Some(event) = rx.recv().await {
        match &event {
            PipelineProgress::TileFetchStarted { tiles, .. } => {
                bar.set_length(*tiles as u64);
                bar.enable_steady_tick(Duration::from_millis(100));
            }
            PipelineProgress::TileFetched { tile, completed, .. } => {
                bar.set_position(*completed as u64);
                bar.set_message(tile.to_string());
            }
            PipelineProgress::TileFetchCompleted { .. } => {
                bar.finish_and_clear();
                eprintln!("{} {}", style("✓").green(), event);
            }
            PipelineProgress::ResizeStarted { .. } | PipelineProgress::ElevationRange { .. } => {
                eprintln!("  {}", event);
            }
        }
    }

    if !bar.is_finished() {
        bar.abandon();
    }
}

fn write_outputs(heightmap: &HeightmapResult, outputs: &OutputPaths) -> Result<(), CliError> {
    println!();
    if let Some(path) = &outputs.png {
        heightmap.save_png(path)?;
        println!("PNG:     {}", style(path.display()).bold());
    }
    if let Some(path) = &outputs.grid {
        heightmap.save_text_grid(path)?;
        println!("Grid:    {}", style(path.display()).bold());
    }
    if let Some(path) = &outputs.json {
        let json = serde_json::to_string_pretty(&heightmap.summary())
            .map_err(|e| CliError::Output(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| CliError::Output(e.to_string()))?;
        println!("Summary: {}", style(path.display()).bold());
    }

    println!();
    println!(
        "Elevation: {:.1} m to {:.1} m ({:.2} m per gray level)",
        heightmap.elev_min,
        heightmap.elev_max,
        heightmap.summary().meters_per_level
    );
    Ok(())
}
