//! rastview CLI - inspect rasters and extract sub-regions

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rastview_core::io::write_provider;
use rastview_core::prelude::*;

#[derive(Parser)]
#[command(name = "rastview")]
#[command(author, version, about = "Inspect and extract geospatial raster imagery", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a raster's provider metadata
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Extract a pixel region into a new GeoTIFF
    Extract {
        /// Input raster file
        input: PathBuf,
        /// Output GeoTIFF path
        output: PathBuf,
        /// Region of interest as `X,Y,WxH` (may extend past the source;
        /// out-of-bounds pixels are filled with the no-data value).
        /// Defaults to the full extent.
        #[arg(long)]
        roi: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Info { input } => info_command(&input),
        Commands::Extract { input, output, roi } => extract_command(&input, &output, roi.as_deref()),
    }
}

fn info_command(input: &Path) -> Result<()> {
    let provider = GdalDataProvider::open(input)
        .with_context(|| format!("cannot open {}", input.display()))?;

    let extent = provider.pixel_extent();
    println!("name:    {}", provider.name());
    println!("size:    {} x {}", extent.width, extent.height);
    println!("bands:   {}", provider.band_count());
    for name in provider.band_names() {
        println!("         - {name}");
    }
    println!("depth:   {}", provider.depth());
    println!("nodata:  {}", provider.no_data_value());

    if provider.is_georeferenced() {
        let gt = provider.geo_transform()?;
        let ge = provider.geo_extent()?;
        println!("origin:  ({}, {})", gt.origin_x, gt.origin_y);
        println!("step:    ({}, {})", gt.pixel_width, gt.pixel_height);
        let (tlx, tly) = ge.top_left();
        let (brx, bry) = ge.bottom_right();
        println!("extent:  ({tlx}, {tly}) .. ({brx}, {bry})");
        println!("crs:     {}", provider.projection_ref()?);
    } else {
        println!("georeferencing: none");
    }

    let metadata = provider.metadata()?;
    if !metadata.is_empty() {
        println!("metadata:");
        for (key, value) in metadata.iter() {
            println!("         {key} = {value}");
        }
    }
    Ok(())
}

fn extract_command(input: &Path, output: &Path, roi: Option<&str>) -> Result<()> {
    let provider = GdalDataProvider::open(input)
        .with_context(|| format!("cannot open {}", input.display()))?;

    let roi = match roi {
        Some(text) => parse_roi(text)?,
        None => provider.pixel_extent(),
    };
    info!(
        "extracting {}x{} at ({}, {}) from {}",
        roi.width,
        roi.height,
        roi.x,
        roi.y,
        input.display()
    );

    let floating = FloatingDataProvider::from_provider(&provider, &roi)
        .context("cannot derive the requested region")?;
    write_provider(output, &floating)
        .with_context(|| format!("cannot write {}", output.display()))?;

    info!("wrote {}", output.display());
    Ok(())
}

/// Parse `X,Y,WxH` into a pixel extent.
fn parse_roi(text: &str) -> Result<PixelExtent> {
    let parts: Vec<&str> = text.split(',').collect();
    let [x, y, size] = parts.as_slice() else {
        bail!("invalid roi `{text}`, expected X,Y,WxH");
    };
    let Some((width, height)) = size.split_once('x') else {
        bail!("invalid roi size `{size}`, expected WxH");
    };
    Ok(PixelExtent::new(
        x.trim().parse().with_context(|| format!("invalid roi x `{x}`"))?,
        y.trim().parse().with_context(|| format!("invalid roi y `{y}`"))?,
        width.trim().parse().with_context(|| format!("invalid roi width `{width}`"))?,
        height.trim().parse().with_context(|| format!("invalid roi height `{height}`"))?,
    ))
}
