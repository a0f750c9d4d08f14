use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crowdview::compositor::Compositor;
use crowdview::config::RenderConfig;
use crowdview::fonts::CosmicTextMeasure;
use crowdview::raster::Rasterizer;
use crowdview::schedule::FrameSlot;
use crowdview::{GraphDescription, StateSnapshot};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Replays a directory of snapshots through the renderer
#[derive(Parser, Debug)]
#[command(name = "crowdview-watch")]
#[command(version)]
#[command(about = "Render every snapshot in a directory, newest-wins when rendering falls behind", long_about = None)]
struct Args {
    /// Venue graph JSON file
    #[arg(value_name = "GRAPH")]
    graph: PathBuf,

    /// Directory of snapshot JSON files, replayed in file-name order
    #[arg(value_name = "STATE_DIR")]
    state_dir: PathBuf,

    /// Directory receiving one PNG per rendered frame
    #[arg(short, long, value_name = "OUT_DIR")]
    output: PathBuf,

    /// Renderer config file (TOML or YAML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Delay between published snapshots in milliseconds
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1000)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 700)]
    height: u32,
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RenderConfig::load(path).map_err(|e| format!("Failed to load config: {}", e))?,
        None => RenderConfig::default(),
    };
    let graph_json = std::fs::read_to_string(&args.graph)
        .map_err(|e| format!("Failed to read graph file: {}", e))?;
    let graph = GraphDescription::from_json(&graph_json)
        .map_err(|e| format!("Failed to parse graph: {}", e))?;

    let snapshots = snapshot_files(&args.state_dir)?;
    std::fs::create_dir_all(&args.output)
        .map_err(|e| format!("Failed to create output directory: {}", e))?;

    let slot: Arc<FrameSlot<(String, StateSnapshot)>> = Arc::new(FrameSlot::new());
    let producer = {
        let slot = Arc::clone(&slot);
        let interval = Duration::from_millis(args.interval_ms);
        thread::spawn(move || {
            for path in snapshots {
                match read_snapshot(&path) {
                    Ok(snapshot) => {
                        let name = path
                            .file_stem()
                            .map(|s| s.to_string_lossy().into_owned())
                            .unwrap_or_else(|| "frame".to_string());
                        slot.publish((name, snapshot));
                    }
                    Err(err) => warn!(file = %path.display(), error = %err, "skipping snapshot"),
                }
                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }
            slot.close();
        })
    };

    let mut compositor = Compositor::new(
        config,
        Box::new(CosmicTextMeasure::new()),
        Rasterizer::with_system_fonts(),
    )
    .map_err(|e| e.to_string())?;

    let mut rendered = 0usize;
    while let Some((name, snapshot)) = slot.wait_take() {
        compositor.render(Some(&graph), Some(&snapshot), args.width, args.height);
        let png = compositor.export_png().map_err(|e| e.to_string())?;
        let target = args.output.join(format!("{}.png", name));
        std::fs::write(&target, png).map_err(|e| format!("Failed to write PNG: {}", e))?;
        rendered += 1;
    }

    producer
        .join()
        .map_err(|_| "Snapshot reader thread panicked".to_string())?;

    info!(
        rendered,
        superseded = slot.superseded(),
        "replay finished"
    );
    eprintln!("Frames saved to: {}", args.output.display());
    Ok(())
}

fn snapshot_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read snapshot directory: {}", e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_snapshot(path: &Path) -> crowdview::Result<StateSnapshot> {
    let content = std::fs::read_to_string(path)?;
    StateSnapshot::from_json(&content)
}
