use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use crowdview::compositor::Compositor;
use crowdview::config::RenderConfig;
use crowdview::fonts::CosmicTextMeasure;
use crowdview::raster::Rasterizer;
use crowdview::theme::Theme;
use crowdview::{GraphDescription, StateSnapshot};
use tracing_subscriber::EnvFilter;

/// Render crowd-density floor plans to SVG, PNG or PDF
#[derive(Parser, Debug)]
#[command(name = "crowdview")]
#[command(version)]
#[command(about = "Render a venue graph and occupancy snapshot as a floor-plan image", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one frame
    Render(RenderArgs),
    /// List built-in themes
    Themes,
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// Venue graph JSON file
    #[arg(value_name = "GRAPH")]
    graph: PathBuf,

    /// Occupancy snapshot JSON file (use "-" for stdin)
    #[arg(value_name = "STATE")]
    state: PathBuf,

    /// Output file path (extension determines format: .svg, .png or .pdf)
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Renderer config file (TOML or YAML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Built-in theme name, overrides the config file
    #[arg(short, long, value_name = "THEME")]
    theme: Option<String>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1000)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 700)]
    height: u32,

    /// Raster scale multiplier for PNG output (e.g. 2.0 for sharper output)
    #[arg(long, default_value_t = 1.0)]
    png_scale: f32,
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render(args) => render(args),
        Command::Themes => {
            for name in Theme::list_builtins() {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "crowdview", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn render(args: RenderArgs) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RenderConfig::default(),
    };
    if let Some(theme) = args.theme {
        config.theme = theme;
        config.palette = None;
    }

    let graph_json = std::fs::read_to_string(&args.graph)
        .map_err(|e| format!("Failed to read graph file: {}", e))?;
    let graph = GraphDescription::from_json(&graph_json)
        .map_err(|e| format!("Failed to parse graph: {}", e))?;

    let state_json = if args.state.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else {
        std::fs::read_to_string(&args.state)
            .map_err(|e| format!("Failed to read state file: {}", e))?
    };
    let state = StateSnapshot::from_json(&state_json)
        .map_err(|e| format!("Failed to parse state: {}", e))?;

    let mut compositor = Compositor::new(
        config,
        Box::new(CosmicTextMeasure::new()),
        Rasterizer::with_system_fonts(),
    )
    .map_err(|e| e.to_string())?;

    let output_ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .ok_or("Output file has no extension")?
        .to_ascii_lowercase();

    match output_ext.as_str() {
        "svg" => {
            let frame = compositor.compose_svg(Some(&graph), Some(&state), args.width, args.height);
            std::fs::write(&args.output, frame.svg)
                .map_err(|e| format!("Failed to write SVG: {}", e))?;
            eprintln!("SVG saved to: {}", args.output.display());
        }
        "png" => {
            let encoded = if args.png_scale == 1.0 {
                compositor.render(Some(&graph), Some(&state), args.width, args.height);
                compositor.export_png()
            } else {
                let frame =
                    compositor.compose_svg(Some(&graph), Some(&state), args.width, args.height);
                compositor.rasterizer().svg_to_png(&frame.svg, args.png_scale)
            };
            let png_data = encoded.map_err(|e| e.to_string())?;
            std::fs::write(&args.output, png_data)
                .map_err(|e| format!("Failed to write PNG: {}", e))?;
            eprintln!("PNG saved to: {}", args.output.display());
        }
        "pdf" => {
            compositor.render(Some(&graph), Some(&state), args.width, args.height);
            let pdf_data = compositor.export_pdf().map_err(|e| e.to_string())?;
            std::fs::write(&args.output, pdf_data)
                .map_err(|e| format!("Failed to write PDF: {}", e))?;
            eprintln!("PDF saved to: {}", args.output.display());
        }
        _ => {
            return Err(format!(
                "Unsupported output format: .{} (use .svg, .png or .pdf)",
                output_ext
            ));
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<RenderConfig, String> {
    if !(path.exists() && path.is_file()) {
        return Err(format!("Config file not found: {}", path.display()));
    }
    RenderConfig::load(path).map_err(|e| format!("Failed to load config: {}", e))
}
