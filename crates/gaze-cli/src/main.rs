mod trace;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gaze_core::{GazePipeline, GridEvent, ScriptedTracker, TickReport, TileGrid, TileId};
use gaze_store::{Catalog, Settings, Store};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::trace::{BlinkInjector, TraceFrame};

#[derive(Parser)]
#[command(name = "gaze", about = "Gaze dwell-selection pipeline driver")]
struct Cli {
    /// Settings file (default: <data dir>/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded gaze trace through the pipeline
    Replay {
        /// Trace file (JSON array of frames)
        trace: PathBuf,

        /// Content catalog (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Probability per frame of an injected blink
        #[arg(long, default_value_t = 0.0)]
        blink_rate: f64,

        /// Seed for blink injection
        #[arg(long)]
        seed: Option<u64>,

        /// Print events as JSON lines instead of text
        #[arg(long)]
        json: bool,

        /// Store commits and dwell time in the stats database
        #[arg(long)]
        record: bool,
    },

    /// Drive the pipeline from JSON-lines frames on stdin
    Live {
        /// Content catalog (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Store commits and dwell time in the stats database
        #[arg(long)]
        record: bool,
    },

    /// Show dwell statistics and recent selections
    Stats {
        /// Number of recent selections to list
        #[arg(long, default_value_t = 10)]
        recent: usize,
    },

    /// Validate settings and catalog, print the tile layout
    Check {
        /// Content catalog (JSON)
        #[arg(long)]
        catalog: PathBuf,
    },
}

fn data_dir() -> PathBuf {
    std::env::var("GAZE_DATA_DIR")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(gaze_store::default_base_dir)
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    Settings::resolve(cli.config.as_deref(), &data_dir()).context("failed to load settings")
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    let catalog = Catalog::load(path).context("failed to load catalog")?;
    catalog.warn_issues().context("failed to validate catalog")?;
    Ok(catalog)
}

fn open_store() -> Result<Store> {
    Store::open_in_dir(&data_dir()).context("failed to open stats database")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Replay {
            trace,
            catalog,
            blink_rate,
            seed,
            json,
            record,
        } => cmd_replay(&cli, trace, catalog, *blink_rate, *seed, *json, *record),
        Commands::Live { catalog, record } => cmd_live(&cli, catalog, *record).await,
        Commands::Stats { recent } => cmd_stats(*recent),
        Commands::Check { catalog } => cmd_check(&cli, catalog),
    }
}

// ---------------------------------------------------------------------------
// Event output
// ---------------------------------------------------------------------------

fn tile_name(grid: &TileGrid, id: TileId) -> String {
    grid.get(id)
        .map(|t| t.content().display_name().to_string())
        .unwrap_or_else(|| id.to_string())
}

/// One JSON object per transition and dwell event, in the order they happened.
fn report_json(grid: &TileGrid, report: &TickReport) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    if let Some(id) = report.transition.exit {
        out.push(json!({ "event": "exit", "tile": id, "title": tile_name(grid, id) }));
    }
    if let Some(id) = report.transition.enter {
        out.push(json!({ "event": "enter", "tile": id, "title": tile_name(grid, id) }));
    }
    for event in &report.events {
        out.push(match event {
            GridEvent::FillStarted { tile } => {
                json!({ "event": "fill_started", "tile": tile, "title": tile_name(grid, *tile) })
            }
            GridEvent::Committed { tile, item } => json!({
                "event": "committed",
                "tile": tile,
                "title": item.title,
                "media_id": item.media_id,
                "watch_url": item.watch_url(),
            }),
        });
    }
    out
}

fn report_text(grid: &TileGrid, report: &TickReport, clock: f64) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(id) = report.transition.exit {
        out.push(format!("{clock:>8.2}s  exit    {}", tile_name(grid, id)));
    }
    if let Some(id) = report.transition.enter {
        out.push(format!("{clock:>8.2}s  enter   {}", tile_name(grid, id)));
    }
    for event in &report.events {
        out.push(match event {
            GridEvent::FillStarted { tile } => {
                format!("{clock:>8.2}s  fill    {}", tile_name(grid, *tile))
            }
            GridEvent::Committed { item, .. } => {
                format!("{clock:>8.2}s  commit  {} -> {}", item.display_name(), item.watch_url())
            }
        });
    }
    out
}

/// Persist commits plus the dwell seconds every tile accumulated.
fn record_session(pipeline: &GazePipeline, commits: &[gaze_core::ContentItem]) -> Result<()> {
    let store = open_store()?;
    for item in commits {
        store.record_commit(item).context("failed to record commit")?;
    }
    for tile in pipeline.grid().tiles() {
        store
            .record_dwell_secs(tile.content(), tile.engine().total_secs())
            .context("failed to record dwell time")?;
    }
    println!("recorded {} commits", commits.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_replay(
    cli: &Cli,
    trace_path: &Path,
    catalog_path: &Path,
    blink_rate: f64,
    seed: Option<u64>,
    as_json: bool,
    record: bool,
) -> Result<()> {
    let config = load_settings(cli)?.pipeline;
    let catalog = load_catalog(catalog_path)?;
    let frames = trace::load_trace(trace_path)?;

    let (tracker, feed) = ScriptedTracker::channel();
    let mut pipeline = GazePipeline::from_config(Some(Box::new(tracker)), &config, catalog.items());
    let mut blinks = BlinkInjector::new(blink_rate, seed);

    let mut clock = 0.0;
    let mut ticks = 0u64;
    let mut commits = Vec::new();

    for (index, frame) in frames.iter().enumerate() {
        let reading = frame
            .reading(&config.scene, pipeline.grid().len())
            .with_context(|| format!("invalid trace frame {index}"))?;
        for _ in 0..frame.repeat {
            feed.push(blinks.apply(reading));
            let report = pipeline.tick(frame.dt);
            ticks += 1;
            if frame.dt.is_finite() && frame.dt > 0.0 {
                clock += frame.dt;
            }

            if as_json {
                for line in report_json(pipeline.grid(), &report) {
                    println!("{line}");
                }
            } else {
                for line in report_text(pipeline.grid(), &report, clock) {
                    println!("{line}");
                }
            }
            commits.extend(report.commits().cloned());
        }
    }

    pipeline.set_enabled(false);
    if !as_json {
        println!("done. ticks={ticks}, commits={}, elapsed={clock:.2}s", commits.len());
    }

    if record {
        record_session(&pipeline, &commits)?;
    }
    Ok(())
}

async fn cmd_live(cli: &Cli, catalog_path: &Path, record: bool) -> Result<()> {
    let config = load_settings(cli)?.pipeline;
    let catalog = load_catalog(catalog_path)?;

    let (tracker, feed) = ScriptedTracker::channel();
    let mut pipeline = GazePipeline::from_config(Some(Box::new(tracker)), &config, catalog.items());
    tracing::info!("live pipeline ready with {} tiles", pipeline.grid().len());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut commits = Vec::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    tracing::info!("stdin closed; stopping");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let frame: TraceFrame = match serde_json::from_str(&line) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!("skipping malformed frame: {e}");
                        continue;
                    }
                };
                let reading = match frame.reading(&config.scene, pipeline.grid().len()) {
                    Ok(reading) => reading,
                    Err(e) => {
                        tracing::warn!("skipping frame: {e}");
                        continue;
                    }
                };
                for _ in 0..frame.repeat {
                    feed.push(reading);
                    let report = pipeline.tick(frame.dt);
                    for line in report_json(pipeline.grid(), &report) {
                        println!("{line}");
                    }
                    commits.extend(report.commits().cloned());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; stopping");
                break;
            }
        }
    }

    pipeline.set_enabled(false);
    if record {
        record_session(&pipeline, &commits)?;
    }
    Ok(())
}

fn cmd_stats(recent: usize) -> Result<()> {
    let store = open_store()?;
    let stats = store.stats().context("failed to read dwell stats")?;
    let history = store
        .recent_commits(recent)
        .context("failed to read commit history")?;

    println!("media:      {}", stats.len());
    println!("commits:    {}", store.commit_count()?);
    for stat in &stats {
        println!(
            "  {:<12} {:>6}s {:>4} commits  {}",
            stat.media_id, stat.dwell_secs, stat.commits, stat.title
        );
    }
    if !history.is_empty() {
        println!("recent:");
        for commit in &history {
            println!("  {}  {:<12} {}", commit.committed_at, commit.media_id, commit.title);
        }
    }
    Ok(())
}

fn cmd_check(cli: &Cli, catalog_path: &Path) -> Result<()> {
    let config = load_settings(cli)?.pipeline;
    let catalog = Catalog::load(catalog_path).context("failed to load catalog")?;
    let issues = catalog.issues().context("failed to validate catalog")?;

    println!(
        "settings:   ok (pre_hold={}s, fill={}s, min_confidence={}, plane_miss={:?})",
        config.dwell.pre_hold_secs,
        config.dwell.fill_secs,
        config.gaze.min_confidence,
        config.resolver.plane_miss
    );

    let usable: Vec<_> = catalog.items().iter().filter(|i| i.has_media()).collect();
    println!(
        "catalog:    {} items, {} usable, {} issues",
        catalog.items().len(),
        usable.len(),
        issues.len()
    );
    for issue in &issues {
        println!("  ! {issue}");
    }

    let layout = config.scene.layout;
    let cells = layout.cells(usable.len());
    println!("grid:       {} rows x {} columns", layout.rows(usable.len()), layout.columns.max(1));
    for (index, (item, cell)) in usable.iter().zip(&cells).enumerate() {
        let center = cell.center();
        println!(
            "  [{index}] ({:.0}, {:.0})  {}  {}",
            center.x,
            center.y,
            item.media_id,
            item.display_name()
        );
        if let Some(thumb) = item.thumbnail_urls().first() {
            println!("        thumbnail: {thumb}");
        }
    }
    Ok(())
}
