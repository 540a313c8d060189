use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use warncore::prelude::CueConfig;
use warncore::WarningCode;

pub const DEFAULT_FEED_URL: &str =
    "https://data.weather.gov.hk/weatherAPI/opendata/weather.php?dataType=warnsum&lang=tc";
pub const DEFAULT_REMOTE_ICON_URL: &str =
    "https://www.hko.gov.hk/tc/wxinfo/dailywx/images/{stem}.issuing.gif";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub title: String,
    pub feed_url: String,
    pub poll_interval_secs: f64,
    pub fetch_timeout_secs: f64,
    pub fps: u32,
    pub pictures_path: PathBuf,
    pub sounds_path: PathBuf,
    /// URL template for icons without local frames; `{stem}` is the asset stem.
    pub remote_icon_url: String,
    pub remote_icons: bool,
    pub start_clip: String,
    pub end_clip: String,
    pub placeholder_clip: String,
    pub volume: f32,
    pub muted: bool,
    pub bridge_addr: SocketAddr,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let cues = CueConfig::default();
        Self {
            title: "天氣警告".into(),
            feed_url: DEFAULT_FEED_URL.into(),
            poll_interval_secs: 0.5,
            fetch_timeout_secs: 5.0,
            fps: 60,
            pictures_path: PathBuf::from("assets/pictures"),
            sounds_path: PathBuf::from("assets/sounds"),
            remote_icon_url: DEFAULT_REMOTE_ICON_URL.into(),
            remote_icons: true,
            start_clip: cues.start_clip,
            end_clip: cues.end_clip,
            placeholder_clip: cues.placeholder_clip,
            volume: 1.0,
            muted: false,
            bridge_addr: SocketAddr::from(([127, 0, 0, 1], 9000)),
        }
    }
}

impl MonitorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading monitor config {}", path_ref.display()))?;
        let config: MonitorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing monitor config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(fps: u32, poll_interval_secs: f64) -> Self {
        Self {
            fps,
            poll_interval_secs,
            ..Default::default()
        }
    }

    pub fn to_cue_config(&self) -> CueConfig {
        CueConfig {
            start_clip: self.start_clip.clone(),
            end_clip: self.end_clip.clone(),
            placeholder_clip: self.placeholder_clip.clone(),
        }
    }

    pub fn remote_icon_url_for(&self, code: WarningCode) -> String {
        self.remote_icon_url.replace("{stem}", code.asset_stem())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs.max(0.05))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.fetch_timeout_secs.max(0.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_defaults() {
        let cfg = MonitorConfig::from_args(30, 2.0);
        assert_eq!(cfg.fps, 30);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(2));
        assert_eq!(cfg.to_cue_config(), CueConfig::default());
        assert_eq!(cfg.bridge_addr.port(), 9000);
    }

    #[test]
    fn config_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"fps: 24\nsounds_path: /opt/board/sounds\nplaceholder_clip: beep\nbridge_addr: 0.0.0.0:9100\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = MonitorConfig::load(&path).unwrap();
        assert_eq!(cfg.fps, 24);
        assert_eq!(cfg.sounds_path, PathBuf::from("/opt/board/sounds"));
        assert_eq!(cfg.to_cue_config().placeholder_clip, "beep");
        assert_eq!(cfg.bridge_addr.port(), 9100);
        assert_eq!(cfg.feed_url, DEFAULT_FEED_URL);
    }

    #[test]
    fn remote_icon_url_uses_asset_stem() {
        let cfg = MonitorConfig::default();
        assert_eq!(
            cfg.remote_icon_url_for(WarningCode::Landslip),
            "https://www.hko.gov.hk/tc/wxinfo/dailywx/images/landslip.issuing.gif"
        );
    }

    #[test]
    fn zero_fps_is_clamped() {
        let cfg = MonitorConfig::from_args(0, 0.0);
        assert_eq!(cfg.tick_interval(), Duration::from_secs(1));
        assert!(cfg.poll_interval() >= Duration::from_millis(50));
    }
}
