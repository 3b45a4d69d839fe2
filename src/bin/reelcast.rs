use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reelcast", version)]
struct Cli {
    /// Measure text with this TTF/OTF font instead of the monospace estimate.
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved layout of every job (or one) as JSON.
    Layout(LayoutArgs),
    /// Render one frame of a job as a JSON display list.
    Frame(FrameArgs),
    /// Record every job of a manifest on the simulated collaborators.
    Batch(BatchArgs),
    /// Print how a range would be cut into segments.
    Split(SplitArgs),
}

#[derive(Args, Debug)]
struct LayoutArgs {
    /// Batch manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Only this job id.
    #[arg(long)]
    job: Option<String>,

    /// Pipeline config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Batch manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    #[arg(long)]
    job: String,

    /// Source time in seconds.
    #[arg(long)]
    time: f64,

    /// Write the display list here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pipeline config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Batch manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Directory artifacts are written to.
    #[arg(long)]
    out_dir: PathBuf,

    /// Run on the wall clock instead of a simulated one.
    #[arg(long)]
    realtime: bool,

    /// Pipeline config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SplitArgs {
    #[arg(long)]
    start: f64,

    #[arg(long)]
    end: f64,

    /// Segment length in seconds.
    #[arg(long)]
    segment: f64,

    /// Merge a trailing segment shorter than this into the previous one.
    #[arg(long, default_value_t = 0.0)]
    min_tail: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let measure = make_measure(cli.font.as_deref())?;
    match cli.cmd {
        Command::Layout(args) => cmd_layout(args, &measure),
        Command::Frame(args) => cmd_frame(args, &measure),
        Command::Batch(args) => cmd_batch(args, measure),
        Command::Split(args) => cmd_split(args),
    }
}

fn make_measure(font: Option<&Path>) -> anyhow::Result<Rc<dyn reelcast::TextMeasure>> {
    Ok(match font {
        Some(path) => {
            let m = reelcast::ParleyMeasure::from_path(path)
                .with_context(|| format!("load font '{}'", path.display()))?;
            tracing::info!(family = m.family_name(), "measuring text with font");
            Rc::new(m)
        }
        None => Rc::new(reelcast::MonospaceMeasure::default()),
    })
}

fn load_manifest(path: &Path) -> anyhow::Result<(reelcast::BatchManifest, PathBuf)> {
    let manifest = reelcast::BatchManifest::from_path(path)?;
    let root = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((manifest, root))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<reelcast::PipelineConfig> {
    Ok(reelcast::PipelineConfig::load(path)?)
}

/// Natural sizes from the manifest probe table, falling back to the image files themselves.
fn media_dimensions(
    manifest: &reelcast::BatchManifest,
    probe: &reelcast::FsImageProbe,
    job: &reelcast::CompositionJob,
) -> reelcast::MediaDimensions {
    let mut dims = reelcast::MediaDimensions {
        video: manifest.dimensions_of(&job.source),
        ..Default::default()
    };
    for layer in &job.layout.layers {
        for (source, _) in layer.image_assets() {
            let size = manifest
                .dimensions_of(source)
                .map(Ok)
                .unwrap_or_else(|| probe.image_size(source));
            match size {
                Ok(size) => {
                    dims.images.insert(source.clone(), size);
                }
                Err(e) => tracing::warn!(%source, error = %e, "image size unavailable"),
            }
        }
    }
    dims
}

fn cmd_layout(args: LayoutArgs, measure: &Rc<dyn reelcast::TextMeasure>) -> anyhow::Result<()> {
    let (manifest, root) = load_manifest(&args.manifest)?;
    let config = load_config(args.config.as_deref())?;
    let probe = reelcast::FsImageProbe::new(root);

    let mut out = serde_json::Map::new();
    for job in manifest.into_jobs()? {
        if args.job.as_deref().is_some_and(|id| id != job.id.as_str()) {
            continue;
        }
        let dims = media_dimensions(&manifest, &probe, &job);
        let layout =
            reelcast::resolve_layout(&job.layout, &dims, job.output, &config, measure.as_ref())
                .with_context(|| format!("resolve layout of job '{}'", job.id))?;
        out.insert(job.id.to_string(), serde_json::to_value(&layout)?);
    }
    if let Some(id) = &args.job
        && out.is_empty()
    {
        anyhow::bail!("no job '{id}' in manifest");
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_frame(args: FrameArgs, measure: &Rc<dyn reelcast::TextMeasure>) -> anyhow::Result<()> {
    let (manifest, root) = load_manifest(&args.manifest)?;
    let config = load_config(args.config.as_deref())?;
    let probe = reelcast::FsImageProbe::new(root);

    let job = manifest
        .into_jobs()?
        .into_iter()
        .find(|j| j.id.as_str() == args.job)
        .with_context(|| format!("no job '{}' in manifest", args.job))?;
    if !job.time_range.contains(args.time) {
        tracing::warn!(
            t = args.time,
            start = job.time_range.start,
            end = job.time_range.end,
            "time is outside the job range"
        );
    }

    let dims = media_dimensions(&manifest, &probe, &job);
    let layout =
        reelcast::resolve_layout(&job.layout, &dims, job.output, &config, measure.as_ref())?;
    let mut surface = reelcast::DisplayList::with_measure(job.output, Rc::clone(measure));
    reelcast::render_frame(
        &mut surface,
        &layout,
        &job.source,
        &reelcast::FrameContext {
            video_time: args.time,
            range: job.time_range,
            wall_time: (args.time - job.time_range.start).max(0.0),
            video_ready: dims.video.is_some(),
        },
    );

    let json = surface.to_json()?;
    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(path, json + "\n")
                .with_context(|| format!("write display list '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_batch(args: BatchArgs, measure: Rc<dyn reelcast::TextMeasure>) -> anyhow::Result<()> {
    let (manifest, root) = load_manifest(&args.manifest)?;
    let config = load_config(args.config.as_deref())?;
    let mut jobs = manifest.into_jobs()?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(!args.realtime)
        .build()
        .context("build tokio runtime")?;

    let summary = rt.block_on(async {
        let log = reelcast::sim::EventLog::new();
        let media = reelcast::sim::SyntheticMedia::from_probes(&manifest.media, log.clone())
            .with_image_probe(reelcast::FsImageProbe::new(root));
        let audio = reelcast::sim::CountingAudioBackend::new(log.clone());
        let recorders = reelcast::sim::MemoryRecorderFactory::new(log.clone());
        let surfaces = reelcast::DisplayListFactory::new(measure);
        let sink = reelcast::DirectoryDelivery::new(&args.out_dir);

        let controller =
            reelcast::CaptureController::new(&media, &audio, &recorders, &surfaces, config);
        let batch = reelcast::BatchOrchestrator::new(&controller, &sink);
        batch
            .run_all(
                &mut jobs,
                &reelcast::CancelToken::new(),
                &reelcast::TracingProgress,
            )
            .await
    });

    for job in &jobs {
        match &job.failure {
            Some(f) => eprintln!("{}: {} ({})", job.id, job.status, f.reason),
            None => eprintln!("{}: {}", job.id, job.status),
        }
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if summary.failed > 0 {
        anyhow::bail!("{} of {} jobs failed", summary.failed, summary.visited);
    }
    Ok(())
}

fn cmd_split(args: SplitArgs) -> anyhow::Result<()> {
    let range = reelcast::TimeRange::new(args.start, args.end)?;
    let plan = reelcast::split_range(range, args.segment, args.min_tail)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
