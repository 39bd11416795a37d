use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use hotspot_viewer::{AssetKind, AssetSource as _};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Parser, Debug)]
#[command(name = "hotspot-viewer", version)]
struct Cli {
    /// Log debug events (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a graph and load every asset it references.
    Check(CheckArgs),
    /// Replay a session script into PNG frames and a WAV mix.
    Render(RenderArgs),
    /// Print the normalized `[x, y]` of a pixel position on a node's image.
    Locate(LocateArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Node graph JSON.
    #[arg(long)]
    graph: PathBuf,

    /// Asset root holding `images/` and `sounds/` (defaults to the graph's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Only validate the graph.
    #[arg(long)]
    skip_assets: bool,

    /// Give up when no asset finishes loading for this long.
    #[arg(long, default_value_t = 30)]
    load_timeout_secs: u64,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Node graph JSON.
    #[arg(long)]
    graph: PathBuf,

    /// Session script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Output directory for `frame_00000.png`, ... and `audio.wav`.
    #[arg(long)]
    out: PathBuf,

    /// Asset root holding `images/` and `sounds/` (defaults to the graph's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Animation frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Sample rate of the mix.
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,

    /// Render without audio.
    #[arg(long)]
    mute: bool,

    /// Step the session without writing PNG frames.
    #[arg(long)]
    no_frames: bool,

    /// Give up when no asset finishes loading for this long.
    #[arg(long, default_value_t = 30)]
    load_timeout_secs: u64,
}

#[derive(Parser, Debug)]
struct LocateArgs {
    /// Node graph JSON.
    #[arg(long)]
    graph: PathBuf,

    /// Asset root holding `images/` (defaults to the graph's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Node whose image is shown.
    #[arg(long)]
    node: String,

    /// Viewport width in pixels.
    #[arg(long)]
    width: f64,

    /// Viewport height in pixels.
    #[arg(long)]
    height: f64,

    /// Click x in viewport pixels.
    #[arg(long)]
    x: f64,

    /// Click y in viewport pixels.
    #[arg(long)]
    y: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Render(args) => cmd_render(args),
        Command::Locate(args) => cmd_locate(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn asset_root(graph: &Path, assets: Option<PathBuf>) -> PathBuf {
    assets.unwrap_or_else(|| {
        graph
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

fn load_graph(path: &Path) -> anyhow::Result<hotspot_viewer::NodeGraph> {
    hotspot_viewer::NodeGraph::from_json_file(path)
        .with_context(|| format!("load graph '{}'", path.display()))
}

fn load_assets(
    graph: &hotspot_viewer::NodeGraph,
    root: PathBuf,
    timeout_secs: u64,
) -> anyhow::Result<hotspot_viewer::LoadedAssets> {
    let source = Arc::new(hotspot_viewer::DirAssetSource::new(root));
    let opts = hotspot_viewer::LoadOpts {
        stall_timeout: Duration::from_secs(timeout_secs.max(1)),
    };
    Ok(hotspot_viewer::load_all(graph, source, &opts)?)
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let graph = load_graph(&args.graph)?;
    let hotspots: usize = graph.nodes().iter().map(|n| n.hotspots.len()).sum();
    println!(
        "graph ok: {} node(s), {} hotspot(s), start '{}'",
        graph.len(),
        hotspots,
        graph.start().id
    );

    if args.skip_assets {
        return Ok(());
    }

    let root = asset_root(&args.graph, args.assets);
    let assets = load_assets(&graph, root.clone(), args.load_timeout_secs)?;
    println!(
        "assets ok: {} node(s) with image and sound under '{}'",
        assets.len(),
        root.display()
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let graph = load_graph(&args.graph)?;
    let script = hotspot_viewer::Script::from_json_file(&args.script)
        .with_context(|| format!("load script '{}'", args.script.display()))?;
    let root = asset_root(&args.graph, args.assets);
    let assets = load_assets(&graph, root, args.load_timeout_secs)?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let opts = hotspot_viewer::RenderOpts {
        fps: args.fps,
        sample_rate: args.sample_rate,
        mute: args.mute,
        frames_dir: (!args.no_frames).then(|| args.out.clone()),
        audio_out: (!args.mute).then(|| args.out.join("audio.wav")),
        ..hotspot_viewer::RenderOpts::default()
    };
    let report = hotspot_viewer::render_session(graph, assets, &script, &opts)?;

    for event in &report.events {
        if let hotspot_viewer::ViewerEvent::PositionReported { node, text, .. } = event {
            println!("{node} {text}");
        }
    }
    eprintln!(
        "rendered {} frame(s), {} navigation(s), ended at '{}' -> {}",
        report.stats.frames_total,
        report.stats.navigations,
        report.final_node,
        args.out.display()
    );
    Ok(())
}

fn cmd_locate(args: LocateArgs) -> anyhow::Result<()> {
    let graph = load_graph(&args.graph)?;
    let node = graph.by_id(&args.node)?;
    let viewport = hotspot_viewer::Viewport::new(args.width, args.height)?;

    let root = asset_root(&args.graph, args.assets);
    let source = hotspot_viewer::DirAssetSource::new(root);
    let bytes = source.fetch(AssetKind::Image, &node.image.file_name)?;
    let image = hotspot_viewer::decode_image(&bytes)
        .with_context(|| format!("decode image of node '{}'", node.id))?;

    let bounds = hotspot_viewer::fit_to_viewport(image.size(), viewport.size());
    let position =
        hotspot_viewer::normalized_position(bounds, hotspot_viewer::Point::new(args.x, args.y))
            .context("image has an empty rendered box")?;
    println!("{}", hotspot_viewer::format_position(position));
    Ok(())
}
