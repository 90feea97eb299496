use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use scenecache::{
    CacheConfig, Command as EditCommand, CommandRecorder, Composer, FrameIndex, NodeId, Rgba8,
    Scene, SceneGraph,
};

#[derive(Parser, Debug)]
#[command(name = "scenecache", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a frame range cold and warm, edit the scene, and render again.
    Bench(BenchArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Cache configuration JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct BenchArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Cache configuration JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to render. Defaults to the scene duration.
    #[arg(long)]
    frames: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Bench(args) => cmd_bench(args),
    }
}

fn load(in_path: &Path, config: Option<&Path>) -> anyhow::Result<(Scene, CacheConfig)> {
    let scene = Scene::from_path(in_path)
        .with_context(|| format!("load scene '{}'", in_path.display()))?;
    let config = match config {
        Some(p) => CacheConfig::from_path(p)
            .with_context(|| format!("load cache config '{}'", p.display()))?,
        None => CacheConfig::default(),
    };
    Ok((scene, config))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (mut scene, config) = load(&args.in_path, args.config.as_deref())?;
    let mut composer = Composer::new(&scene, &config)?;
    let frame = composer.render_frame(&mut scene, FrameIndex(args.frame))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_bench(args: BenchArgs) -> anyhow::Result<()> {
    let (mut scene, config) = load(&args.in_path, args.config.as_deref())?;
    let frames = args.frames.unwrap_or_else(|| scene.duration_frames());
    let mut composer = Composer::new(&scene, &config)?;
    let mut recorder = CommandRecorder::new(Arc::clone(composer.frame_cache()));

    let pass = |composer: &mut Composer, scene: &mut Scene, label: &str| -> anyhow::Result<()> {
        let started = Instant::now();
        for f in 0..frames {
            composer
                .render_frame(scene, FrameIndex(f))
                .with_context(|| format!("render frame {f}"))?;
        }
        let node = composer.node_cache().stats();
        let frame = composer.frame_cache().stats();
        eprintln!(
            "{label}: {frames} frames in {:.2?} | node cache {} cached / {} entries, {} rasterizations | frame cache {} frames in {} blocks, {} bytes",
            started.elapsed(),
            node.cached,
            node.entries,
            node.rasterizations,
            frame.frames,
            frame.blocks,
            frame.bytes,
        );
        Ok(())
    };

    pass(&mut composer, &mut scene, "cold")?;
    pass(&mut composer, &mut scene, "warm")?;

    let edit = scene
        .elements()
        .first()
        .and_then(|e| first_leaf(scene.graph(), e.root));
    match edit {
        Some((node, fill)) => {
            let inverted = Rgba8::new(255 - fill.r, 255 - fill.g, 255 - fill.b, fill.a);
            let dropped = recorder
                .execute(&mut scene, EditCommand::SetFill { node, fill: inverted })?
                .wait();
            eprintln!("edit: recolored {node:?}, dropped {dropped} cached frames");
            pass(&mut composer, &mut scene, "edited")?;
        }
        None => eprintln!("edit: scene has no leaf to recolor"),
    }

    let stats = composer.stats();
    eprintln!(
        "total: {} requested, {} frame cache hits, {} rendered, {} live fallbacks",
        stats.frames_requested, stats.frame_cache_hits, stats.frames_rendered, stats.live_fallbacks
    );
    Ok(())
}

fn first_leaf(graph: &SceneGraph, root: NodeId) -> Option<(NodeId, Rgba8)> {
    let node = graph.get(root)?;
    if let Some(leaf) = node.as_leaf() {
        return Some((root, leaf.fill));
    }
    node.children()
        .iter()
        .find_map(|&child| first_leaf(graph, child))
}
