use anyhow::Context;
use assets::{IconCatalog, RodioBackend};
use clap::Parser;
use feed::{spawn_poller, FeedSource};
use log::info;
use status_bridge::bridge::StatusBridge;
use status_bridge::model::BoardModel;
use std::path::PathBuf;
use tokio::runtime::{Builder as TokioBuilder, Handle};
use tokio::sync::mpsc;
use workflow::config::MonitorConfig;
use workflow::runner::Runner;

mod assets;
mod feed;
mod generator;
mod status_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Weather warning monitor driving the warning board")]
struct Args {
    /// Load the monitor config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Replay recorded feed snapshots (a JSON object, or an array of them)
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Generate a synthetic warning scenario from this seed instead of polling
    #[arg(long)]
    scenario: Option<u64>,
    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long, default_value_t = 60)]
    fps: u32,
    #[arg(long, default_value_t = 0.5)]
    poll_interval: f64,
    #[arg(long, default_value_t = false)]
    muted: bool,
    /// Only use bundled icons
    #[arg(long, default_value_t = false)]
    no_remote_icons: bool,
    /// Serve the board model over HTTP for the board app
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Multi-threaded: remote icons are fetched with `block_in_place`.
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating monitor runtime")?;
    runtime.block_on(monitor(args))
}

async fn monitor(args: Args) -> anyhow::Result<()> {
    let mut config = if let Some(path) = args.config {
        MonitorConfig::load(path)?
    } else {
        MonitorConfig::from_args(args.fps, args.poll_interval)
    };
    config.muted |= args.muted;
    config.remote_icons &= !args.no_remote_icons;

    let source = if let Some(path) = args.replay {
        FeedSource::replay(path)?
    } else if let Some(seed) = args.scenario {
        FeedSource::scenario(seed)
    } else {
        FeedSource::http(&config)?
    };

    let (feed_tx, feed_rx) = mpsc::unbounded_channel();
    let poller = spawn_poller(source, config.poll_interval(), feed_tx.clone());

    let bridge = StatusBridge::new();
    if args.serve {
        bridge.serve(config.bridge_addr, feed_tx.clone());
    }
    drop(feed_tx);

    let icons = IconCatalog::new(&config, Handle::current()).context("preparing icon catalog")?;
    let audio = RodioBackend::new(&config);
    if audio.is_muted() {
        info!("audio output muted, notifications will be logged only");
    }
    let mut runner = Runner::new(icons, audio, config.to_cue_config());

    let title = config.title.clone();
    runner
        .run(&config, feed_rx, &bridge, args.ticks, |runner, report| {
            BoardModel::from_report(&title, report, runner.metrics().snapshot(), |code| {
                runner.animators().source().origin(code)
            })
        })
        .await?;
    poller.abort();

    let summary = bridge.snapshot();
    let metrics = summary.metrics;
    println!(
        "Stopped after {} ticks -> active {}, evaluations {}, feed failures {}, notifications {}, aborted {}",
        metrics.ticks,
        summary.warnings.len(),
        metrics.evaluations,
        metrics.feed_failures,
        metrics.notifications,
        metrics.aborted_sequences
    );

    Ok(())
}
