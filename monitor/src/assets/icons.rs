use crate::workflow::config::MonitorConfig;
use anyhow::Context;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat, RgbaImage};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use warncore::animation::FALLBACK_FRAME_MS;
use warncore::{FrameSet, IconSource, WarningCode};

/// Decoded icon frame handed to the animators.
pub type IconFrame = Arc<RgbaImage>;

/// Edge length of the blank frame shown when no icon could be loaded.
pub const PLACEHOLDER_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconOrigin {
    Local,
    Remote,
    Placeholder,
}

/// Fetches the encoded bytes of a remote icon.
pub trait RemoteFetch {
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

/// Blocking HTTP fetch on the driver's runtime.
pub struct HttpFetch {
    client: reqwest::Client,
    runtime: Handle,
}

impl HttpFetch {
    pub fn new(config: &MonitorConfig, runtime: Handle) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .context("building icon http client")?;
        Ok(Self { client, runtime })
    }
}

impl RemoteFetch for HttpFetch {
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let client = self.client.clone();
        let url = url.to_string();
        // Runs at most once per code, the first time it is displayed.
        tokio::task::block_in_place(|| {
            self.runtime.block_on(async move {
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .with_context(|| format!("requesting {}", url))?
                    .error_for_status()
                    .with_context(|| format!("icon {} answered with an error status", url))?;
                let bytes = response.bytes().await.context("reading icon body")?;
                Ok::<_, anyhow::Error>(bytes.to_vec())
            })
        })
    }
}

/// Loads warning icons: bundled PNG pairs first, then the observatory's
/// animated GIF, then a blank placeholder.
pub struct IconCatalog {
    pictures_dir: PathBuf,
    remote: Option<RemoteIcons>,
    origins: HashMap<WarningCode, IconOrigin>,
}

struct RemoteIcons {
    fetcher: Box<dyn RemoteFetch + Send>,
    config: MonitorConfig,
}

impl IconCatalog {
    pub fn new(config: &MonitorConfig, runtime: Handle) -> anyhow::Result<Self> {
        let remote = if config.remote_icons {
            Some(RemoteIcons {
                fetcher: Box::new(HttpFetch::new(config, runtime)?),
                config: config.clone(),
            })
        } else {
            None
        };
        Ok(Self {
            pictures_dir: config.pictures_path.clone(),
            remote,
            origins: HashMap::new(),
        })
    }

    /// Catalog that only looks at bundled files.
    #[cfg(test)]
    pub fn local_only<P: Into<PathBuf>>(pictures_dir: P) -> Self {
        Self {
            pictures_dir: pictures_dir.into(),
            remote: None,
            origins: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_fetcher<P, R>(pictures_dir: P, fetcher: R) -> Self
    where
        P: Into<PathBuf>,
        R: RemoteFetch + Send + 'static,
    {
        Self {
            pictures_dir: pictures_dir.into(),
            remote: Some(RemoteIcons {
                fetcher: Box::new(fetcher),
                config: MonitorConfig::default(),
            }),
            origins: HashMap::new(),
        }
    }

    pub fn origin(&self, code: WarningCode) -> Option<IconOrigin> {
        self.origins.get(&code).copied()
    }

    fn fetch_remote(&self, code: WarningCode) -> anyhow::Result<Option<FrameSet<IconFrame>>> {
        let Some(remote) = &self.remote else {
            return Ok(None);
        };
        let url = remote.config.remote_icon_url_for(code);
        let bytes = remote.fetcher.fetch(&url)?;
        decode_gif(&bytes).map(Some)
    }
}

impl IconSource for IconCatalog {
    type Frame = IconFrame;

    fn load(&mut self, code: WarningCode) -> FrameSet<IconFrame> {
        let local = match load_local(&self.pictures_dir, code) {
            Ok(found) => found,
            Err(err) => {
                warn!("local icon for {} unreadable: {:#}", code, err);
                None
            }
        };
        let (frames, origin) = match local {
            Some(frames) => (frames, IconOrigin::Local),
            None => match self.fetch_remote(code) {
                Ok(Some(frames)) => (frames, IconOrigin::Remote),
                Ok(None) => (placeholder(), IconOrigin::Placeholder),
                Err(err) => {
                    warn!("remote icon for {} unavailable: {:#}", code, err);
                    (placeholder(), IconOrigin::Placeholder)
                }
            },
        };
        info!("icon for {} loaded from {:?} source", code, origin);
        self.origins.insert(code, origin);
        frames
    }
}

/// Paths of the bundled two-state icon, `<stem>1.png` and `<stem>2.png`.
pub fn local_paths(dir: &Path, code: WarningCode) -> [PathBuf; 2] {
    let stem = code.asset_stem();
    [
        dir.join(format!("{}1.png", stem)),
        dir.join(format!("{}2.png", stem)),
    ]
}

/// `Ok(None)` when the pair is not bundled.
pub fn load_local(dir: &Path, code: WarningCode) -> anyhow::Result<Option<FrameSet<IconFrame>>> {
    let [first, second] = local_paths(dir, code);
    if !first.exists() || !second.exists() {
        return Ok(None);
    }
    let first = decode_file(&first)?;
    let second = decode_file(&second)?;
    Ok(Some(FrameSet::toggle(first, second)))
}

fn decode_file(path: &Path) -> anyhow::Result<IconFrame> {
    let image = image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    Ok(Arc::new(image.to_rgba8()))
}

/// Decodes every frame of a GIF with its delay in milliseconds. Frames
/// without a delay show for the fallback duration.
pub fn decode_gif(bytes: &[u8]) -> anyhow::Result<FrameSet<IconFrame>> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).context("reading gif header")?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .context("decoding gif frames")?;
    let frames = frames
        .into_iter()
        .map(|frame| {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay_ms = match numer.checked_div(denom) {
                Some(0) | None => FALLBACK_FRAME_MS,
                Some(ms) => ms,
            };
            (Arc::new(frame.into_buffer()), delay_ms)
        })
        .collect();
    FrameSet::cycle(frames).context("gif has no frames")
}

/// PNG encoding of one frame, as served to the board.
pub fn encode_png(frame: &RgbaImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    frame
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("encoding icon frame as png")?;
    Ok(bytes)
}

pub fn placeholder() -> FrameSet<IconFrame> {
    FrameSet::placeholder(Arc::new(RgbaImage::new(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE)))
}
