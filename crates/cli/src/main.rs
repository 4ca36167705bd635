//! popgrid CLI - population aggregation and facility-access analysis

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use popgrid_analysis::access::{band_population, summarize_access};
use popgrid_analysis::distance::{distance_raster, DistanceParams};
use popgrid_analysis::growth::{keyed_aggregates, project};
use popgrid_analysis::zonal::{zonal_statistics, ZonalResult};
use popgrid_core::io::{
    read_boundaries_geojson_path, read_facilities_csv_path, read_geotiff, write_geotiff,
};
use popgrid_core::{FeatureCollection, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "popgrid")]
#[command(author, version, about = "Gridded population aggregation and facility access", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a population raster
    Info {
        /// Input raster file (GeoTIFF)
        input: PathBuf,
    },
    /// Per-polygon population totals from a raster and a boundary layer
    Zonal {
        /// Input population raster (GeoTIFF)
        raster: PathBuf,
        /// Boundary layer (GeoJSON)
        boundaries: PathBuf,
        /// Output CSV file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Project per-polygon totals forward with compound growth
    Project {
        /// Input population raster (GeoTIFF)
        raster: PathBuf,
        /// Boundary layer (GeoJSON)
        boundaries: PathBuf,
        /// Year the raster represents
        #[arg(short, long)]
        base_year: i32,
        /// Annual growth rate in percent (may be negative)
        #[arg(short, long)]
        rate: f64,
        /// Number of years to project
        #[arg(short = 'n', long)]
        years: u32,
        /// Output CSV file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build a nearest-facility distance raster
    Distance {
        /// Input population raster (defines the output grid)
        raster: PathBuf,
        /// Facility locations (CSV with lon/lat columns)
        facilities: PathBuf,
        /// Output distance raster (GeoTIFF, meters)
        output: PathBuf,
        /// Chunk edge length in cells
        #[arg(long, default_value = "500")]
        chunk_size: usize,
        /// Facility inclusion buffer around the raster bounds, degrees
        #[arg(long, default_value = "0.5")]
        buffer: f64,
    },
    /// Population within an access radius and by distance band
    Access {
        /// Input population raster (GeoTIFF)
        raster: PathBuf,
        /// Facility locations (CSV with lon/lat columns)
        facilities: PathBuf,
        /// Access radius in kilometers
        #[arg(short, long, default_value = "5.0")]
        radius_km: f64,
        /// Output CSV file for the band table (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let start = Instant::now();

    match cli.command {
        Commands::Info { input } => run_info(&input)?,
        Commands::Zonal {
            raster,
            boundaries,
            output,
        } => run_zonal(&raster, &boundaries, output.as_deref())?,
        Commands::Project {
            raster,
            boundaries,
            base_year,
            rate,
            years,
            output,
        } => run_project(&raster, &boundaries, base_year, rate, years, output.as_deref())?,
        Commands::Distance {
            raster,
            facilities,
            output,
            chunk_size,
            buffer,
        } => run_distance(&raster, &facilities, &output, chunk_size, buffer)?,
        Commands::Access {
            raster,
            facilities,
            radius_km,
            output,
        } => run_access(&raster, &facilities, radius_km, output.as_deref())?,
    }

    info!("Done in {:.2?}", start.elapsed());
    Ok(())
}

// ─── Input loading ──────────────────────────────────────────────────────

fn load_raster(path: &Path) -> Result<Raster<f64>> {
    let raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("acquisition failed: raster {}", path.display()))?;
    info!(
        "Loaded raster {}: {}x{} cells, CRS {}",
        path.display(),
        raster.rows(),
        raster.cols(),
        raster
            .crs()
            .map(|c| c.identifier())
            .unwrap_or_else(|| "unknown".to_string()),
    );
    Ok(raster)
}

fn load_boundaries(path: &Path) -> Result<FeatureCollection> {
    let boundaries = read_boundaries_geojson_path(path)
        .with_context(|| format!("acquisition failed: boundaries {}", path.display()))?;
    if boundaries.is_empty() {
        bail!("boundary layer {} contains no features", path.display());
    }
    info!("Loaded {} boundary features", boundaries.len());
    Ok(boundaries)
}

fn load_facilities(path: &Path) -> Result<Vec<popgrid_core::FacilityPoint>> {
    let load = read_facilities_csv_path(path)
        .with_context(|| format!("acquisition failed: facilities {}", path.display()))?;
    info!(
        "Loaded {} facilities from columns {}/{} ({} rows skipped)",
        load.points.len(),
        load.lon_column,
        load.lat_column,
        load.skipped
    );
    Ok(load.points)
}

fn csv_writer(output: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };
    Ok(csv::Writer::from_writer(sink))
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed_precise}]")
            .expect("static template"),
    );
    bar.set_message(message);
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}

// ─── Commands ───────────────────────────────────────────────────────────

fn run_info(input: &Path) -> Result<()> {
    let raster = load_raster(input)?;
    let (min_x, min_y, max_x, max_y) = raster.bounds();
    let stats = raster.statistics();

    println!("File:       {}", input.display());
    println!("Size:       {} rows x {} cols", raster.rows(), raster.cols());
    println!("Cell size:  {}", raster.cell_size());
    println!("Bounds:     ({min_x}, {min_y}) - ({max_x}, {max_y})");
    println!(
        "CRS:        {}",
        raster
            .crs()
            .map(|c| c.identifier())
            .unwrap_or_else(|| "unknown".to_string())
    );
    match raster.nodata() {
        Some(nd) => println!("Nodata:     {nd}"),
        None => println!("Nodata:     not set"),
    }
    println!("Valid:      {} cells", stats.valid_count);
    println!("Sum:        {:.1}", stats.sum);
    if let (Some(min), Some(max), Some(mean)) = (stats.min, stats.max, stats.mean) {
        println!("Min/Max:    {min} / {max}");
        println!("Mean:       {mean:.3}");
    }

    Ok(())
}

fn run_zonal(raster_path: &Path, boundaries_path: &Path, output: Option<&Path>) -> Result<()> {
    let raster = load_raster(raster_path)?;
    let boundaries = load_boundaries(boundaries_path)?;

    let bar = spinner("Computing zonal statistics");
    let results = zonal_statistics(&raster, &boundaries).context("zonal statistics failed")?;
    bar.finish_and_clear();

    write_zonal_csv(&boundaries, &results, output)?;

    let total: f64 = results.iter().map(|r| r.total_population).sum();
    info!("Total population across {} units: {:.0}", results.len(), total);
    Ok(())
}

fn write_zonal_csv(
    boundaries: &FeatureCollection,
    results: &[ZonalResult],
    output: Option<&Path>,
) -> Result<()> {
    let mut writer = csv_writer(output)?;
    writer.write_record(["unit", "total_population", "mean_density", "valid_pixels"])?;

    for (idx, (feature, result)) in boundaries.iter().zip(results).enumerate() {
        let name = feature
            .display_name()
            .unwrap_or_else(|| format!("feature_{idx}"));
        writer.write_record([
            name,
            format!("{:.2}", result.total_population),
            format!("{:.4}", result.mean_density),
            result.valid_pixels.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn run_project(
    raster_path: &Path,
    boundaries_path: &Path,
    base_year: i32,
    rate: f64,
    years: u32,
    output: Option<&Path>,
) -> Result<()> {
    let raster = load_raster(raster_path)?;
    let boundaries = load_boundaries(boundaries_path)?;

    let bar = spinner("Computing zonal statistics");
    let results = zonal_statistics(&raster, &boundaries).context("zonal statistics failed")?;
    bar.finish_and_clear();

    let base = keyed_aggregates(&boundaries, &results);
    let projected = project(&base, base_year, rate, years);

    let mut writer = csv_writer(output)?;
    writer.write_record(["year", "unit", "total_population", "mean_density"])?;

    for (unit, agg) in &base {
        writer.write_record([
            base_year.to_string(),
            unit.clone(),
            format!("{:.2}", agg.total),
            format!("{:.4}", agg.mean),
        ])?;
    }
    for (year, per_unit) in &projected {
        for (unit, agg) in per_unit {
            writer.write_record([
                year.to_string(),
                unit.clone(),
                format!("{:.2}", agg.total),
                format!("{:.4}", agg.mean),
            ])?;
        }
    }
    writer.flush()?;

    info!(
        "Projected {} units over {} years at {}%/year from {}",
        base.len(),
        years,
        rate,
        base_year
    );
    Ok(())
}

fn run_distance(
    raster_path: &Path,
    facilities_path: &Path,
    output: &Path,
    chunk_size: usize,
    buffer: f64,
) -> Result<()> {
    let raster = load_raster(raster_path)?;
    let facilities = load_facilities(facilities_path)?;

    let params = DistanceParams {
        chunk_size,
        buffer_degrees: buffer,
    };

    let bar = spinner("Computing facility distances");
    let dist = distance_raster(&raster, &facilities, &params)
        .context("distance computation failed")?;
    bar.finish_and_clear();

    write_geotiff(&dist, output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!("Wrote distance raster to {}", output.display());
    Ok(())
}

fn run_access(
    raster_path: &Path,
    facilities_path: &Path,
    radius_km: f64,
    output: Option<&Path>,
) -> Result<()> {
    let raster = load_raster(raster_path)?;
    let facilities = load_facilities(facilities_path)?;

    let bar = spinner("Computing facility distances");
    let dist = distance_raster(&raster, &facilities, &DistanceParams::default())
        .context("distance computation failed")?;
    bar.finish_and_clear();

    let summary =
        summarize_access(&raster, &dist, radius_km).context("access summary failed")?;
    let bands = band_population(&raster, &dist).context("band aggregation failed")?;

    println!("Access radius:      {} km", summary.radius_km);
    println!(
        "Within radius:      {:.0} ({:.1}%)",
        summary.population_within, summary.percent_within
    );
    println!(
        "Beyond radius:      {:.0} ({:.1}%)",
        summary.population_beyond, summary.percent_beyond
    );
    println!("Total population:   {:.0}", summary.total_population);

    let mut writer = csv_writer(output)?;
    writer.write_record(["band", "population", "percentage"])?;
    for band in &bands {
        writer.write_record([
            band.label.to_string(),
            format!("{:.2}", band.population),
            format!("{:.2}", band.percentage),
        ])?;
    }
    writer.flush()?;

    Ok(())
}
