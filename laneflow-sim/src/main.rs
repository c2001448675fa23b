//! Runs a simulated multi-lane link and checks that every release is aligned.

use anyhow::{bail, ensure, Result};
use clap::Parser;
use laneflow_phy::constants::{DEFAULT_DESKEW_CAPACITY, DEFAULT_ELASTIC_CAPACITY, DEFAULT_SKEW_BOUND};
use laneflow_phy::{Character, Entry, LaneDrive, LinkConfig, Testbench, Transmitter, COM};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Multi-lane 8b/10b receive pipeline simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of lanes
    #[arg(short, long, default_value_t = 4)]
    lanes: usize,

    /// Payload characters per lane
    #[arg(short, long, default_value_t = 10_000)]
    characters: usize,

    /// Characters between filler ordered sets
    #[arg(long, default_value_t = 400)]
    skp_interval: usize,

    /// Transmit clock offset from the receiver, in ppm (positive is slower)
    #[arg(long, default_value_t = 300, allow_hyphen_values = true)]
    ppm: i32,

    /// Extra offset per lane, in ppm, on top of `--ppm`
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    ppm_spread: i32,

    /// Per-lane skew in bits, comma separated (default: 7 bits per lane index)
    #[arg(long, value_delimiter = ',')]
    skew_bits: Vec<u64>,

    /// Nominal bit period in picoseconds
    #[arg(long, default_value_t = 400)]
    bit_period_ps: u64,

    /// Compensation buffer capacity
    #[arg(long, default_value_t = DEFAULT_ELASTIC_CAPACITY)]
    elastic_capacity: usize,

    /// Deskew queue capacity
    #[arg(long, default_value_t = DEFAULT_DESKEW_CAPACITY)]
    deskew_capacity: usize,

    /// Skew window bound
    #[arg(long, default_value_t = DEFAULT_SKEW_BOUND)]
    skew_bound: u8,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Byte `n` of lane `lane`. The per-lane offset makes a cross-lane mix-up visible.
fn payload(lane: usize, n: usize) -> u8 { (n + 17 * lane) as u8 }

fn drive(args: &Args, lane: usize, bit_period_fs: u64) -> Result<LaneDrive> {
    let mut transmitter = Transmitter::default().with_skp_interval(args.skp_interval);
    transmitter.send(COM)?;
    for n in 0..args.characters {
        transmitter.send(Character::data(payload(lane, n)))?;
    }

    let skew_bits = args.skew_bits.get(lane).copied().unwrap_or(7 * lane as u64);
    let ppm = args.ppm + args.ppm_spread * lane as i32;
    Ok(LaneDrive { transmitter, ppm, phase_fs: skew_bits * bit_period_fs })
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("laneflow_phy={0},laneflow_sim={0}", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LinkConfig::builder()
        .lanes(args.lanes)
        .elastic_capacity(args.elastic_capacity)
        .deskew_capacity(args.deskew_capacity)
        .skew_bound(args.skew_bound)
        .build()?;
    ensure!(args.skew_bits.len() <= args.lanes, "{} skews given for {} lanes", args.skew_bits.len(), args.lanes);
    info!(?config, "link");

    let bit_period_fs = args.bit_period_ps * laneflow::clock::FS_PER_PS;
    let drives = (0..args.lanes).map(|lane| drive(&args, lane, bit_period_fs)).collect::<Result<Vec<_>>>()?;
    let mut bench = Testbench::new(&config, drives, bit_period_fs, 0)?;

    // Room for the filler sets, the slowest clock, and the pipeline.
    let slack = args.characters / 500 + 200;
    let ticks = args.characters + args.characters / args.skp_interval.max(1) * 4 + slack;
    let releases = bench.run(ticks)?;
    info!(releases = releases.len(), now_fs = bench.now_fs(), "run complete");

    for (lane, stats) in bench.aligner().lanes().iter().map(|lane| lane.stats()).enumerate() {
        info!(lane, ?stats, "lane");
        if stats.saturations > 0 || stats.overflows > 0 {
            warn!(lane, "link ran outside its sizing");
        }
    }

    for (n, release) in releases.iter().enumerate() {
        let expected = (0..args.lanes).map(|lane| Entry::valid(Character::data(payload(lane, n))));
        if !itertools::equal(release.iter().copied(), expected) {
            bail!("release {} is misaligned: {:?}", n, release);
        }
    }
    ensure!(releases.len() == args.characters, "released {} of {} characters", releases.len(), args.characters);

    info!("every release aligned");
    Ok(())
}
