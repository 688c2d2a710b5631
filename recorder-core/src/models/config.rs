use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::RecorderError;

/// Bytes per sample of the PCM stream the engine handles.
pub const BYTES_PER_SAMPLE: u16 = 2;

/// Highest capture rate `validate` accepts.
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Parameters for one recording session.
///
/// Built by the caller before `start` and never mutated afterwards; the
/// engine keeps it behind an `Arc` for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Capture device identifier, or empty for the provider's default.
    pub device_id: String,

    /// Capture sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Number of capture channels (default: 1). Valid values: 1, 2.
    pub channels: u16,

    /// Bit-rate target handed to the sink for compressed containers (bits/s).
    pub bit_rate: u32,

    /// Path the sink writes to while recording.
    pub temp_file_path: PathBuf,

    /// Path the caller moves the finished recording to.
    pub final_file_path: PathBuf,

    pub title: String,
    pub album: String,
    pub genre: String,
    pub recording_date: NaiveDate,
    pub track_number: u32,
}

impl RecordingConfig {
    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.sample_rate == 0 {
            return Err(RecorderError::InvalidConfig("sample rate must be positive".into()));
        }
        if self.sample_rate > MAX_SAMPLE_RATE {
            return Err(RecorderError::InvalidConfig(format!(
                "sample rate {} Hz exceeds {} Hz",
                self.sample_rate, MAX_SAMPLE_RATE
            )));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(RecorderError::InvalidConfig(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if self.temp_file_path.as_os_str().is_empty() {
            return Err(RecorderError::InvalidConfig("temp file path is empty".into()));
        }
        Ok(())
    }

    /// PCM layout the capture stream and sink are opened with.
    pub fn pcm_format(&self) -> PcmFormat {
        PcmFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: BYTES_PER_SAMPLE * 8,
            bit_rate: self.bit_rate,
        }
    }

    pub fn tags(&self) -> TrackTags {
        TrackTags {
            title: self.title.clone(),
            album: self.album.clone(),
            genre: self.genre.clone(),
            recording_date: self.recording_date,
            track_number: self.track_number,
        }
    }

    /// Device id to open, `None` meaning the provider default.
    pub fn device(&self) -> Option<&str> {
        if self.device_id.is_empty() {
            None
        } else {
            Some(&self.device_id)
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            sample_rate: 44100,
            channels: 1,
            bit_rate: 128_000,
            temp_file_path: std::env::temp_dir().join("recording.wav"),
            final_file_path: PathBuf::from("recording.wav"),
            title: String::new(),
            album: String::new(),
            genre: String::new(),
            recording_date: chrono::Local::now().date_naive(),
            track_number: 1,
        }
    }
}

/// 16-bit PCM stream layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub bit_rate: u32,
}

impl PcmFormat {
    /// Bytes of PCM per second of audio, saturating at `u32::MAX`.
    pub fn byte_rate(&self) -> u32 {
        let rate = self.sample_rate as u64 * self.channels as u64 * self.bits_per_sample as u64 / 8;
        u32::try_from(rate).unwrap_or(u32::MAX)
    }

    pub fn block_align(&self) -> u16 {
        let align = self.channels as u32 * self.bits_per_sample as u32 / 8;
        u16::try_from(align).unwrap_or(u16::MAX)
    }

    pub fn duration_of(&self, bytes: u64) -> f64 {
        let rate = self.byte_rate();
        if rate == 0 {
            return 0.0;
        }
        bytes as f64 / rate as f64
    }
}

/// Descriptive tags a sink may embed in (or store beside) the recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    pub title: String,
    pub album: String,
    pub genre: String,
    pub recording_date: NaiveDate,
    pub track_number: u32,
}

/// Engine tuning that stays fixed across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Length of the fade-out applied by `stop(true)` (default: 4s).
    pub fade_duration: Duration,

    /// Interval between level reports in milliseconds (default: 100).
    /// Values under 20 are raised to 20 by the aggregator.
    pub reporting_interval_ms: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            fade_duration: Duration::from_secs(4),
            reporting_interval_ms: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RecordingConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let config = RecordingConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RecorderError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_sample_rates_above_the_ceiling() {
        let at_limit = RecordingConfig {
            sample_rate: MAX_SAMPLE_RATE,
            channels: 2,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        let config = RecordingConfig {
            sample_rate: 300_000_000,
            channels: 2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RecorderError::InvalidConfig(_))));
    }

    #[test]
    fn byte_rate_saturates_instead_of_overflowing() {
        let format = PcmFormat {
            sample_rate: u32::MAX,
            channels: 2,
            bits_per_sample: 16,
            bit_rate: 0,
        };
        assert_eq!(format.byte_rate(), u32::MAX);
        assert!(format.duration_of(u32::MAX as u64) > 0.0);
    }

    #[test]
    fn rejects_surround_channel_counts() {
        let config = RecordingConfig {
            channels: 6,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(RecorderError::InvalidConfig("unsupported channel count: 6".into()))
        );
    }

    #[test]
    fn empty_device_id_means_default_device() {
        let mut config = RecordingConfig::default();
        assert_eq!(config.device(), None);
        config.device_id = "usb-mic".into();
        assert_eq!(config.device(), Some("usb-mic"));
    }

    #[test]
    fn pcm_format_byte_rate() {
        let config = RecordingConfig {
            sample_rate: 44100,
            channels: 2,
            ..Default::default()
        };
        let format = config.pcm_format();
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!(format.byte_rate(), 176_400);
        assert_eq!(format.block_align(), 4);
        assert!((format.duration_of(88_200) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = RecordingConfig {
            title: "Morning Service".into(),
            recording_date: NaiveDate::from_ymd_opt(2024, 3, 17).unwrap(),
            track_number: 4,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RecordingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
