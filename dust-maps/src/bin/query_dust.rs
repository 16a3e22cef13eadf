use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dust_core::math::distance_modulus;
use dust_core::{Calibration, FilterScaler};
use dust_maps::dataset::container::read_header;
use dust_maps::dataset::{dust_dir, DistanceGrid};
use dust_maps::{DatasetOptions, DatasetVariant, HealpixDataset, HealpixExtinctionMap, MapConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Parser)]
#[command(name = "query-dust")]
#[command(about = "Query 3-D Galactic dust-extinction maps")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print container metadata
    Info {
        /// Path to a .dmap container
        path: PathBuf,
    },
    /// Extinction along one sightline
    Eval {
        #[command(flatten)]
        map: MapArgs,
        /// Galactic longitude in degrees
        #[arg(allow_negative_numbers = true)]
        l: f64,
        /// Galactic latitude in degrees
        #[arg(allow_negative_numbers = true)]
        b: f64,
        /// Distances in kpc
        #[arg(required = true, num_args = 1..)]
        distances: Vec<f64>,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Extinction of every map pixel within a disc
    Disk {
        #[command(flatten)]
        map: MapArgs,
        #[arg(allow_negative_numbers = true)]
        l: f64,
        #[arg(allow_negative_numbers = true)]
        b: f64,
        /// Distance in kpc
        distance: f64,
        /// Disc radius in degrees
        #[arg(long, default_value = "0.5")]
        radius: f64,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List known dataset variants and supported filters
    Variants,
}

#[derive(Args)]
struct MapArgs {
    /// Container to open
    #[arg(long, conflicts_with = "variant")]
    file: Option<PathBuf>,
    /// Dataset variant (green15, green17, green19, combined15, combined19, decaps25)
    #[arg(long)]
    variant: Option<String>,
    /// Dataset root, overrides DUST_DIR
    #[arg(long)]
    dust_dir: Option<PathBuf>,
    /// Photometric filter, e.g. "2MASS Ks" (native units if omitted)
    #[arg(long)]
    filter: Option<String>,
    /// Use SFD98 instead of Schlafly & Finkbeiner (2011) coefficients
    #[arg(long)]
    legacy: bool,
    /// Radial spline order (1-5)
    #[arg(long, default_value = "1")]
    order: usize,
    /// Evaluate posterior sample N instead of the best fit
    #[arg(long)]
    sample: Option<usize>,
}

impl MapArgs {
    fn open(&self) -> anyhow::Result<HealpixExtinctionMap> {
        let config = MapConfig {
            filter: self.filter.clone(),
            calibration: if self.legacy {
                Calibration::Legacy
            } else {
                Calibration::Recalibrated
            },
            interp_order: self.order,
            load_samples: self.sample.is_some(),
        };

        let mut map = match (&self.file, &self.variant) {
            (Some(path), _) => HealpixExtinctionMap::open_path(path, &config, None)
                .with_context(|| format!("Failed to open dust map {:?}", path))?,
            (None, Some(name)) => {
                let variant: DatasetVariant = name.parse()?;
                let root = self.dust_dir.clone().unwrap_or_else(dust_dir);
                HealpixExtinctionMap::open_in(variant, &root, &config)
                    .with_context(|| format!("Failed to open {} under {:?}", variant, root))?
            }
            (None, None) => bail!("Either --file or --variant is required"),
        };

        if let Some(sample) = self.sample {
            map.use_sample(sample)
                .with_context(|| format!("Cannot switch to sample {}", sample))?;
        }
        Ok(map)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { path } => print_info(&path)?,
        Commands::Eval {
            map,
            l,
            b,
            distances,
            format,
        } => {
            let map = map.open()?;
            let start = Instant::now();
            let values = map
                .evaluate_along(l, b, &distances)
                .with_context(|| format!("Sightline l={} b={}", l, b))?;
            tracing::debug!(elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "evaluated");

            let rows: Vec<SightlineRow> = distances
                .iter()
                .zip(values)
                .map(|(&distance_kpc, extinction)| SightlineRow {
                    l,
                    b,
                    distance_kpc,
                    distmod: distance_modulus(distance_kpc),
                    extinction,
                })
                .collect();
            let unit = map.filter().unwrap_or("E(B-V)");
            match format {
                OutputFormat::Table => print_sightline_table(&rows, unit),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Csv => print_sightline_csv(&rows),
            }
        }
        Commands::Disk {
            map,
            l,
            b,
            distance,
            radius,
            format,
        } => {
            let map = map.open()?;
            let disk = map
                .query_disk(l, b, distance, radius)
                .with_context(|| format!("Disc query at l={} b={} r={}", l, b, radius))?;
            match format {
                OutputFormat::Table => {
                    for (i, (area, ext)) in disk.pixel_area.iter().zip(&disk.extinction).enumerate() {
                        println!("{:5}: area={:.6e} sr extinction={:.4}", i + 1, area, ext);
                    }
                    if disk.is_empty() {
                        println!("No map pixels within {}° of ({}, {}).", radius, l, b);
                    } else {
                        println!(
                            "\nPixels: {}  Area: {:.6e} sr  Weighted mean: {:.4}",
                            disk.len(),
                            disk.total_area(),
                            disk.weighted_mean()
                        );
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&disk)?),
                OutputFormat::Csv => {
                    println!("pixel_area,extinction");
                    for (area, ext) in disk.pixel_area.iter().zip(&disk.extinction) {
                        println!("{},{}", area, ext);
                    }
                }
            }
        }
        Commands::Variants => print_variants(),
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct SightlineRow {
    l: f64,
    b: f64,
    distance_kpc: f64,
    distmod: f64,
    extinction: f64,
}

fn print_sightline_table(rows: &[SightlineRow], unit: &str) {
    println!("{:>12} {:>10} {:>12}", "d [kpc]", "DM", unit);
    for row in rows {
        println!(
            "{:>12.4} {:>10.3} {:>12.5}",
            row.distance_kpc, row.distmod, row.extinction
        );
    }
}

fn print_sightline_csv(rows: &[SightlineRow]) {
    println!("l,b,distance_kpc,distmod,extinction");
    for r in rows {
        println!("{},{},{},{},{}", r.l, r.b, r.distance_kpc, r.distmod, r.extinction);
    }
}

fn print_info(path: &Path) -> anyhow::Result<()> {
    let header =
        read_header(path).with_context(|| format!("Failed to read container {:?}", path))?;
    println!("{}", header);

    let dataset = HealpixDataset::open(
        path,
        &DatasetOptions {
            load_samples: false,
            distmods: None,
        },
    );
    match dataset {
        Ok(dataset) => {
            let distmods = dataset.distmods();
            println!(
                "Distance modulus range: {:.3} to {:.3}",
                distmods[0],
                distmods[distmods.len() - 1]
            );
            println!("Entries per nside:");
            for (nside, count) in dataset.catalog().nside_histogram() {
                println!("  {:>6}: {}", nside, count);
            }
        }
        Err(err) if !header.has_distmods() => {
            tracing::debug!(%err, "skipping catalog summary");
        }
        Err(err) => return Err(err).context("Container failed validation"),
    }
    Ok(())
}

fn print_variants() {
    let root = dust_dir();
    for variant in DatasetVariant::ALL {
        let config = variant.config();
        let grid = match config.grid {
            DistanceGrid::Linspace { start, stop, count } => {
                format!("{} bins, DM {}-{}", count, start, stop)
            }
            DistanceGrid::Stored => "stored bin edges".to_string(),
        };
        let path = variant.path_in(&root, false);
        println!(
            "{:<12} {:<28} samples={:<5} present={:<5} {}",
            config.name,
            grid,
            config.has_samples,
            path.exists(),
            path.display()
        );
    }
    println!("\nFilters:");
    for name in FilterScaler::default().filters() {
        println!("  {}", name);
    }
}
