use crate::generator::scenario::ScenarioGenerator;
use crate::workflow::config::MonitorConfig;
use anyhow::Context;
use log::{debug, info, warn};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use warncore::FeedInput;

/// Where feed snapshots come from.
pub enum FeedSource {
    Http { client: reqwest::Client, url: String },
    Replay(ReplayFeed),
    Scenario(ScenarioGenerator),
}

impl FeedSource {
    pub fn http(config: &MonitorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .context("building feed http client")?;
        Ok(FeedSource::Http {
            client,
            url: config.feed_url.clone(),
        })
    }

    pub fn replay<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let replay = ReplayFeed::load(path)?;
        info!("replaying {} recorded snapshot(s)", replay.len());
        Ok(FeedSource::Replay(replay))
    }

    pub fn scenario(seed: u64) -> Self {
        FeedSource::Scenario(ScenarioGenerator::with_seed(seed))
    }

    /// Produces the next poll result. Fetch failures become `Unavailable`
    /// so the tracker can keep showing the last known warnings.
    pub async fn next(&mut self) -> FeedInput {
        match self {
            FeedSource::Http { client, url } => match fetch_json(client, url).await {
                Ok(value) => FeedInput::Fetched(value),
                Err(err) => {
                    warn!("feed fetch failed: {:#}", err);
                    FeedInput::Unavailable(format!("{:#}", err))
                }
            },
            FeedSource::Replay(replay) => FeedInput::Fetched(replay.next_snapshot()),
            FeedSource::Scenario(generator) => FeedInput::Fetched(generator.next_snapshot()),
        }
    }
}

async fn fetch_json(client: &reqwest::Client, url: &str) -> anyhow::Result<Value> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?
        .error_for_status()
        .context("feed answered with an error status")?;
    response
        .json::<Value>()
        .await
        .context("decoding feed body as json")
}

/// Recorded snapshots served one per poll; the last one repeats once the
/// recording runs out.
pub struct ReplayFeed {
    frames: Vec<Value>,
    cursor: usize,
}

impl ReplayFeed {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading replay file {}", path_ref.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("parsing replay file {}", path_ref.display()))?;
        Ok(Self::from_value(value))
    }

    /// An array is a recording of successive snapshots; anything else is a
    /// single snapshot.
    pub fn from_value(value: Value) -> Self {
        let frames = match value {
            Value::Array(frames) if !frames.is_empty() => frames,
            other => vec![other],
        };
        Self { frames, cursor: 0 }
    }

    pub fn next_snapshot(&mut self) -> Value {
        let last = self.frames.len() - 1;
        let frame = self.frames[self.cursor.min(last)].clone();
        if self.cursor < last {
            self.cursor += 1;
        }
        frame
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

/// Polls `source` on its own task and forwards every result to the tick loop.
pub fn spawn_poller(
    mut source: FeedSource,
    interval: Duration,
    tx: mpsc::UnboundedSender<FeedInput>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let input = source.next().await;
            if tx.send(input).is_err() {
                debug!("feed receiver dropped, stopping poller");
                break;
            }
        }
    })
}
