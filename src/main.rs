// SYNOID Remix Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use synoid_remix::agent::encoder::FfmpegEncoder;
use synoid_remix::agent::extraction::{FfmpegFrameSource, FrameSource, ImageSequenceSource};
use synoid_remix::agent::health;
use synoid_remix::engine::graph;
use synoid_remix::engine::intent::{FpsSetting, Intent, Pace, Transition};
use synoid_remix::record::RunRecord;
use synoid_remix::{CancelToken, EngineConfig, FrameStore, RemixPipeline};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "synoid-remix")]
#[command(about = "SYNOID Remix - intent-guided frame graph video remixer", long_about = None)]
struct Cli {
    /// Engine config file (defaults to $SYNOID_REMIX_CONFIG, then synoid_remix.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remix a source video according to an intent
    Remix {
        /// Source video (or image-sequence directory with --image-sequence)
        #[arg(short, long)]
        input: PathBuf,

        /// Output video path
        #[arg(short, long)]
        output: PathBuf,

        /// Intent JSON file; flags below override its fields
        #[arg(long)]
        intent_file: Option<PathBuf>,

        /// slow | medium | fast
        #[arg(long)]
        pace: Option<String>,

        /// Output fps, or "auto"
        #[arg(long)]
        fps: Option<String>,

        /// Target duration in seconds
        #[arg(short, long)]
        duration: Option<f64>,

        /// cut | dissolve | fade
        #[arg(long)]
        transition: Option<String>,

        #[arg(long)]
        style: Option<String>,

        #[arg(long)]
        mood: Option<String>,

        /// Directory for extracted frames (a temporary one when omitted)
        #[arg(long)]
        frames_dir: Option<PathBuf>,

        /// Write a JSON run record here after success
        #[arg(long)]
        record: Option<PathBuf>,

        /// Treat the input as a directory of frames instead of a video
        #[arg(long)]
        image_sequence: bool,
    },

    /// Build the frame graph for a frames directory and print it as JSON
    Graph {
        #[arg(long)]
        frames_dir: PathBuf,

        /// Frame rate of the sequence
        #[arg(long)]
        fps: Option<f64>,

        /// Write the summary to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify ffmpeg/ffprobe availability
    Check {
        /// Also verify this frames directory is writable
        #[arg(long)]
        frames_dir: Option<PathBuf>,
    },
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let from_env = std::env::var("SYNOID_REMIX_CONFIG").ok().map(PathBuf::from);
    match explicit.map(Path::to_path_buf).or(from_env) {
        Some(path) => {
            let config = EngineConfig::from_path(&path)
                .with_context(|| format!("loading engine config {:?}", path))?;
            info!("[CONFIG] Loaded engine config from {:?}", path);
            Ok(config)
        }
        None => Ok(EngineConfig::load()),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_intent(
    intent_file: Option<&Path>,
    pace: Option<String>,
    fps: Option<String>,
    duration: Option<f64>,
    transition: Option<String>,
    style: Option<String>,
    mood: Option<String>,
) -> anyhow::Result<Intent> {
    let mut intent = match intent_file {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
            Intent::from_json(&json).with_context(|| format!("parsing intent {:?}", path))?
        }
        None => Intent::default(),
    };
    if let Some(p) = pace {
        intent.pace = p.parse::<Pace>()?;
    }
    if let Some(f) = fps {
        intent.fps = f.parse::<FpsSetting>()?;
    }
    if duration.is_some() {
        intent.target_duration_s = duration;
    }
    if let Some(t) = transition {
        intent.transition = t.parse::<Transition>()?;
    }
    if let Some(s) = style {
        intent.style = s;
    }
    if let Some(m) = mood {
        intent.mood = m;
    }
    intent.validate()?;
    Ok(intent)
}

fn cancel_on_ctrl_c() -> CancelToken {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("[PIPELINE] Ctrl-C received, cancelling run");
            token.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = Cli::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Remix {
            input,
            output,
            intent_file,
            pace,
            fps,
            duration,
            transition,
            style,
            mood,
            frames_dir,
            record,
            image_sequence,
        } => {
            let intent = build_intent(intent_file.as_deref(), pace, fps, duration, transition, style, mood)?;
            info!(
                "--- SYNOID REMIX: {:?} -> {:?} (pace {:?}, fps {}, transition {:?}) ---",
                input, output, intent.pace, intent.fps, intent.transition
            );

            let source: Arc<dyn FrameSource> = if image_sequence {
                Arc::new(ImageSequenceSource::new(config.extraction.sequence_fps))
            } else {
                Arc::new(FfmpegFrameSource::new(config.extraction.clone()))
            };
            let encoder = Arc::new(FfmpegEncoder::new(config.extraction.ffmpeg_bin.clone()));

            // Keeps the temporary store alive until the run is over
            let scratch = tempfile::Builder::new().prefix("synoid_frames_").tempdir()?;
            let store_dir = frames_dir.unwrap_or_else(|| scratch.path().to_path_buf());
            let mut store = FrameStore::create(&store_dir, config.extraction.sequence_fps)?;

            let cancel = cancel_on_ctrl_c();
            let pipeline = RemixPipeline::new(source, encoder, config);
            let outcome = match pipeline.run(&mut store, &input, &intent, &output, &cancel).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("❌ Remix failed at the {} stage", e.stage);
                    return Err(e.into());
                }
            };

            if outcome.excluded_frames > 0 {
                warn!("⚠️ {} frames could not be decoded and were skipped", outcome.excluded_frames);
            }
            info!(
                "✅ Wrote {:?}: {} frames, {:.3}s @ {}fps",
                outcome.video.path, outcome.video.frame_count, outcome.video.duration_s, outcome.video.fps
            );

            if let Some(path) = record {
                RunRecord::new(&intent, &outcome.frame_path, &outcome.video).write(&path)?;
            }
        }

        Commands::Graph {
            frames_dir,
            fps,
            output,
        } => {
            let fps = fps.unwrap_or(config.extraction.sequence_fps);
            let store = FrameStore::open(&frames_dir, fps)?;
            let cancel = cancel_on_ctrl_c();
            let graph_config = config.graph.clone();
            let frame_graph =
                tokio::task::spawn_blocking(move || graph::build(&store, &graph_config, &cancel)).await??;
            let json = serde_json::to_string_pretty(&frame_graph.summary())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    info!("[GRAPH] Summary written to {:?}", path);
                }
                None => println!("{}", json),
            }
        }

        Commands::Check { frames_dir } => {
            let mut missing = health::missing_dependencies(&config.extraction);
            if let Some(dir) = frames_dir {
                let status = health::check_store_dir(&dir);
                if !status.is_healthy() {
                    warn!("[HEALTH] Frame store: {:?}", status);
                    missing.push(dir.display().to_string());
                }
            }
            if !missing.is_empty() {
                bail!("unavailable: {}", missing.join(", "));
            }
            info!("✅ All dependencies available");
        }
    }

    Ok(())
}
