use crate::workflow::config::MonitorConfig;
use log::{debug, warn};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use warncore::prelude::{WarnError, WarnResult};
use warncore::AudioBackend;

/// Encoded clip kept in memory so replays never touch the disk again.
#[derive(Clone)]
pub struct AudioClip {
    pub name: String,
    data: Arc<[u8]>,
    duration_secs: f64,
}

impl AudioClip {
    pub fn from_bytes(name: &str, data: Vec<u8>) -> WarnResult<Self> {
        let data: Arc<[u8]> = data.into();
        let duration_secs = measure_duration(&data)?;
        Ok(Self {
            name: name.to_string(),
            data,
            duration_secs,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }
}

/// Playback through the default output device, or silent when muted or when
/// no device is available.
pub struct RodioBackend {
    sounds_dir: PathBuf,
    volume: f32,
    output: Option<(OutputStream, OutputStreamHandle)>,
    cache: HashMap<String, AudioClip>,
}

impl RodioBackend {
    pub fn new(config: &MonitorConfig) -> Self {
        let output = if config.muted {
            None
        } else {
            match OutputStream::try_default() {
                Ok(output) => Some(output),
                Err(err) => {
                    warn!("no audio output device ({}), continuing muted", err);
                    None
                }
            }
        };
        Self {
            sounds_dir: config.sounds_path.clone(),
            volume: config.volume.clamp(0.0, 1.0),
            output,
            cache: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn muted<P: Into<PathBuf>>(sounds_dir: P) -> Self {
        Self {
            sounds_dir: sounds_dir.into(),
            volume: 0.0,
            output: None,
            cache: HashMap::new(),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.output.is_none()
    }
}

pub fn clip_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.mp3", name))
}

/// Length of an encoded clip, counting samples when the container does not
/// state it.
pub fn measure_duration(data: &Arc<[u8]>) -> WarnResult<f64> {
    let decoder = Decoder::new(Cursor::new(data.clone()))
        .map_err(|err| WarnError::Playback(format!("undecodable clip: {}", err)))?;
    if let Some(duration) = decoder.total_duration() {
        return Ok(duration.as_secs_f64());
    }
    let channels = f64::from(decoder.channels().max(1));
    let rate = f64::from(decoder.sample_rate().max(1));
    let samples = decoder.count() as f64;
    Ok(samples / (channels * rate))
}

impl AudioBackend for RodioBackend {
    type Clip = AudioClip;

    fn load(&mut self, name: &str) -> WarnResult<AudioClip> {
        if let Some(clip) = self.cache.get(name) {
            return Ok(clip.clone());
        }
        let path = clip_path(&self.sounds_dir, name);
        let data = fs::read(&path)
            .map_err(|err| WarnError::AssetMissing(format!("{}: {}", path.display(), err)))?;
        let clip = AudioClip::from_bytes(name, data)?;
        self.cache.insert(name.to_string(), clip.clone());
        Ok(clip)
    }

    fn duration_secs(&self, clip: &AudioClip) -> f64 {
        clip.duration_secs()
    }

    fn play(&mut self, clip: &AudioClip) -> WarnResult<()> {
        let Some((_, handle)) = &self.output else {
            debug!("muted, skipping {}", clip.name);
            return Ok(());
        };
        let source = Decoder::new(Cursor::new(clip.data.clone()))
            .map_err(|err| WarnError::Playback(format!("{}: {}", clip.name, err)))?;
        let sink = Sink::try_new(handle)
            .map_err(|err| WarnError::Playback(format!("{}: {}", clip.name, err)))?;
        sink.set_volume(self.volume);
        sink.append(source);
        sink.detach();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    /// Mono 16-bit PCM WAV of `samples` silent samples at `rate` Hz.
    fn silent_wav(rate: u32, samples: u32) -> Vec<u8> {
        let data_len = samples * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&rate.to_le_bytes());
        bytes.extend_from_slice(&(rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        bytes
    }

    #[test]
    fn measures_clip_length() {
        let clip = AudioClip::from_bytes("start", silent_wav(8000, 12000)).unwrap();
        assert!((clip.duration_secs() - 1.5).abs() < 1e-3);
    }

    #[test]
    fn missing_clip_is_asset_missing() {
        let dir = tempdir().unwrap();
        let mut backend = RodioBackend::muted(dir.path());
        assert!(matches!(
            backend.load("tc10"),
            Err(WarnError::AssetMissing(_))
        ));
    }

    #[test]
    fn loads_and_caches_clips_from_sounds_dir() {
        let dir = tempdir().unwrap();
        let mut file = fs::File::create(clip_path(dir.path(), "end")).unwrap();
        file.write_all(&silent_wav(8000, 4000)).unwrap();

        let mut backend = RodioBackend::muted(dir.path());
        let clip = backend.load("end").unwrap();
        assert!((backend.duration_secs(&clip) - 0.5).abs() < 1e-3);
        assert!(backend.play(&clip).is_ok());

        fs::remove_file(clip_path(dir.path(), "end")).unwrap();
        assert!(backend.load("end").is_ok());
        assert!(backend.is_muted());
    }

    #[test]
    fn undecodable_clip_is_a_playback_error() {
        assert!(matches!(
            AudioClip::from_bytes("bad", b"nope".to_vec()),
            Err(WarnError::Playback(_))
        ));
    }
}
