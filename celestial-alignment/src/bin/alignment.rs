use anyhow::Context;
use celestial_alignment::clock::{FixedClock, JulianClock, SystemClock};
use celestial_alignment::hull::HullStats;
use celestial_alignment::parser::load_dataset;
use celestial_alignment::plugin::{BuiltInMathPlugin, MathPlugin};
use celestial_alignment::vector::DirectionVector;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "alignment")]
#[command(about = "Telescope sync-point alignment: sky <-> mount direction")]
struct Cli {
    /// Sync-point dataset file
    #[arg(long)]
    data: PathBuf,

    /// Evaluate at this Julian date instead of the current time
    #[arg(long)]
    jd: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fitted model
    Info,
    /// Mount direction for a catalog position
    #[command(allow_negative_numbers = true)]
    ToMount {
        /// Right ascension in decimal hours
        ra: f64,
        /// Declination in decimal degrees
        dec: f64,
        /// Time offset in days
        #[arg(long, default_value = "0.0")]
        offset: f64,
    },
    /// Catalog position for a mount direction
    #[command(allow_negative_numbers = true)]
    ToSky {
        x: f64,
        y: f64,
        z: f64,
        /// Time offset in days
        #[arg(long, default_value = "0.0")]
        offset: f64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let dataset = load_dataset(&cli.data)
        .with_context(|| format!("reading {}", cli.data.display()))?;
    let clock: Arc<dyn JulianClock> = match cli.jd {
        Some(jd) => Arc::new(FixedClock(jd)),
        None => Arc::new(SystemClock),
    };
    let plugin = BuiltInMathPlugin::new().with_clock(clock.clone());
    plugin.set_mount_alignment(dataset.alignment);
    plugin
        .initialise(&dataset.entries, dataset.position)
        .context("building alignment model")?;

    match cli.command {
        Commands::Info => {
            let model = plugin.model();
            println!("Plugin:     {} ({})", plugin.name(), plugin.description());
            match model.position() {
                Some(p) => println!("Site:       lat {:+.4}  lon {:+.4}", p.latitude, p.longitude),
                None => println!("Site:       (none)"),
            }
            println!("Alignment:  {}", model.mount_alignment().as_str());
            println!("Points:     {}", model.point_count());
            println!("Strategy:   {}", model.strategy_name());
            if let Some(m) = model.forward_matrix() {
                println!("Forward:\n{}", m);
            }
            if let Some((actual, apparent)) = model.hull_stats() {
                print_hull("Actual hull:  ", actual, model.actual_facets().len());
                print_hull("Apparent hull:", apparent, model.apparent_facets().len());
            }
        }
        Commands::ToMount { ra, dec, offset } => {
            let v = plugin.transform_celestial_to_mount(ra, dec, offset)?;
            println!("JD {:.6}", clock.julian_date() + offset);
            println!("{}", v);
        }
        Commands::ToSky { x, y, z, offset } => {
            let v = DirectionVector::new(x, y, z);
            let (ra, dec) = plugin.transform_mount_to_celestial(&v, offset)?;
            println!("JD {:.6}", clock.julian_date() + offset);
            println!("RA  {}  ({:.6}h)", format_ra(ra), ra);
            println!("Dec {}  ({:+.6})", format_dec(dec), dec);
        }
    }
    Ok(())
}

fn print_hull(label: &str, stats: Option<HullStats>, facets: usize) {
    match stats {
        Some(s) => println!(
            "{} V={} E={} F={}  facets in use: {}",
            label, s.vertices, s.edges, s.faces, facets
        ),
        None => println!("{} degenerate, nearest sync points only", label),
    }
}

fn format_ra(hours: f64) -> String {
    let h = hours.abs();
    let hh = libm::floor(h) as u32;
    let remainder = (h - hh as f64) * 60.0;
    let mm = libm::floor(remainder) as u32;
    let ss = (remainder - mm as f64) * 60.0;
    format!("{:02}h {:02}m {:05.2}s", hh, mm, ss)
}

fn format_dec(deg: f64) -> String {
    let sign = if deg < 0.0 { "-" } else { "+" };
    let total = deg.abs();
    let dd = libm::floor(total) as u32;
    let remainder = (total - dd as f64) * 60.0;
    let mm = libm::floor(remainder) as u32;
    let ss = (remainder - mm as f64) * 60.0;
    format!("{}{:02}\u{00b0} {:02}' {:04.1}\"", sign, dd, mm, ss)
}
