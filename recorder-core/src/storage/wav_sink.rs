use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingMetadata;
use crate::processing::wav_format::{self, WAV_HEADER_SIZE};
use crate::traits::file_sink::{FileSink, SinkFactory, SinkRequest, SinkSummary};

/// Opens a `WavFileSink` per session.
#[derive(Debug, Clone, Default)]
pub struct WavSinkFactory {
    /// Skip the `.metadata.json` sidecar normally written on close.
    pub skip_metadata: bool,
}

impl SinkFactory for WavSinkFactory {
    fn open_sink(&self, request: &SinkRequest) -> Result<Box<dyn FileSink>, RecorderError> {
        let mut sink = WavFileSink::new(request.clone());
        sink.write_metadata = !self.skip_metadata;
        sink.open()?;
        Ok(Box::new(sink))
    }
}

/// Streaming 16-bit PCM WAV writer.
///
/// ```text
/// [44-byte RIFF header, sizes zeroed]
/// [raw PCM ...]
/// ```
/// `close` patches the RIFF and data sizes, computes a SHA-256 of the
/// finished file and writes the JSON sidecar.
pub struct WavFileSink {
    request: SinkRequest,
    file: Option<BufWriter<File>>,
    data_bytes: u64,
    write_metadata: bool,
}

impl WavFileSink {
    pub fn new(request: SinkRequest) -> Self {
        Self {
            request,
            file: None,
            data_bytes: 0,
            write_metadata: true,
        }
    }

    /// Create the file (and its directory) and write the placeholder header.
    pub fn open(&mut self) -> Result<(), RecorderError> {
        if self.file.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.request.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    RecorderError::Storage(format!("failed to create directory: {}", e))
                })?;
            }
        }

        let file = File::create(&self.request.path)
            .map_err(|e| RecorderError::Storage(format!("failed to create file: {}", e)))?;
        let mut file = BufWriter::new(file);

        let header = wav_format::generate_wav_header(&self.request.format, 0);
        file.write_all(&header)
            .map_err(|e| RecorderError::Storage(format!("failed to write header: {}", e)))?;

        log::debug!("wav sink opened at {}", self.request.path.display());
        self.file = Some(file);
        self.data_bytes = 0;
        Ok(())
    }

    fn finalize(mut file: BufWriter<File>, data_bytes: u64) -> Result<(), RecorderError> {
        let data_size = wav_format::clamp_data_size(data_bytes);
        let storage = |e: std::io::Error| RecorderError::Storage(e.to_string());

        file.flush().map_err(storage)?;
        let mut file = file
            .into_inner()
            .map_err(|e| RecorderError::Storage(e.to_string()))?;

        file.seek(SeekFrom::Start(wav_format::RIFF_SIZE_OFFSET)).map_err(storage)?;
        file.write_all(&wav_format::riff_chunk_size(data_size).to_le_bytes())
            .map_err(storage)?;
        file.seek(SeekFrom::Start(wav_format::DATA_SIZE_OFFSET)).map_err(storage)?;
        file.write_all(&data_size.to_le_bytes()).map_err(storage)?;
        file.sync_all().map_err(storage)?;
        Ok(())
    }
}

impl FileSink for WavFileSink {
    fn write(&mut self, data: &[u8]) -> Result<(), RecorderError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| RecorderError::Storage("file is not open for writing".into()))?;
        file.write_all(data)
            .map_err(|e| RecorderError::Storage(format!("write failed: {}", e)))?;
        self.data_bytes += data.len() as u64;
        Ok(())
    }

    fn close(&mut self) -> Result<SinkSummary, RecorderError> {
        let file = self
            .file
            .take()
            .ok_or_else(|| RecorderError::Storage("file is not open".into()))?;
        Self::finalize(file, self.data_bytes)?;

        let summary = SinkSummary {
            bytes_written: self.data_bytes,
            checksum: sha256_file(&self.request.path)?,
        };

        if self.write_metadata {
            let meta = RecordingMetadata::for_sink(&self.request, &summary);
            write_sidecar(&meta, &self.request.path)?;
        }

        log::debug!(
            "wav sink closed: {} ({} bytes of audio)",
            self.request.path.display(),
            summary.bytes_written
        );
        Ok(summary)
    }
}

/// Sidecar path for a recording: `take1.wav` → `take1.metadata.json`.
pub fn sidecar_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write the sidecar next to the recording.
///
/// The JSON goes to a `.part` file first and is renamed into place, so a
/// reader that finds the sidecar always sees a complete document.
fn write_sidecar(meta: &RecordingMetadata, recording_path: &Path) -> Result<(), RecorderError> {
    let path = sidecar_path(recording_path);
    let partial = path.with_extension("json.part");
    let json = serde_json::to_vec_pretty(meta)
        .map_err(|e| RecorderError::Storage(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&partial, json)
        .map_err(|e| RecorderError::Storage(format!("failed to write metadata: {}", e)))?;
    fs::rename(&partial, &path).map_err(|e| {
        fs::remove_file(&partial).ok();
        RecorderError::Storage(format!("failed to move metadata into place: {}", e))
    })
}

/// Load the sidecar written for `recording_path`.
pub fn read_sidecar(recording_path: &Path) -> Result<RecordingMetadata, RecorderError> {
    let json = fs::read(sidecar_path(recording_path))
        .map_err(|e| RecorderError::Storage(format!("failed to read metadata: {}", e)))?;
    serde_json::from_slice(&json)
        .map_err(|e| RecorderError::Storage(format!("failed to parse metadata: {}", e)))
}

/// SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, RecorderError> {
    let data = fs::read(path)
        .map_err(|e| RecorderError::Storage(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Total on-disk size of a WAV file with `data_bytes` of samples.
pub fn wav_file_len(data_bytes: u64) -> u64 {
    WAV_HEADER_SIZE as u64 + data_bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::{PcmFormat, TrackTags};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("recorder_core_test_{}_{}", Uuid::new_v4(), name))
    }

    fn request(path: PathBuf) -> SinkRequest {
        SinkRequest {
            session_id: Uuid::new_v4(),
            final_path: PathBuf::from("/media/usb/take.wav"),
            path,
            format: PcmFormat {
                sample_rate: 44100,
                channels: 1,
                bits_per_sample: 16,
                bit_rate: 128_000,
            },
            tags: TrackTags {
                title: "Evening Service".into(),
                album: "Sunday".into(),
                genre: "Speech".into(),
                recording_date: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
                track_number: 3,
            },
        }
    }

    fn cleanup(path: &Path) {
        fs::remove_file(path).ok();
        fs::remove_file(sidecar_path(path)).ok();
    }

    #[test]
    fn write_plain_wav() {
        let path = temp_file_path("plain.wav");
        let mut sink = WavSinkFactory::default().open_sink(&request(path.clone())).unwrap();

        sink.write(&[0u8; 16]).unwrap();
        sink.write(&[1u8; 4]).unwrap();
        let summary = sink.close().unwrap();

        assert_eq!(summary.bytes_written, 20);
        assert_eq!(summary.checksum.len(), 64);

        let data = fs::read(&path).unwrap();
        assert_eq!(data.len() as u64, wav_file_len(20));
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([data[40], data[41], data[42], data[43]]), 20);
        assert_eq!(u32::from_le_bytes([data[4], data[5], data[6], data[7]]), 56);
        assert_eq!(&data[44..60], &[0u8; 16]);

        cleanup(&path);
    }

    #[test]
    fn sidecar_carries_tags_and_checksum() {
        let path = temp_file_path("tagged.wav");
        let req = request(path.clone());
        let mut sink = WavSinkFactory::default().open_sink(&req).unwrap();
        sink.write(&vec![0u8; 88_200]).unwrap();
        let summary = sink.close().unwrap();

        let meta = read_sidecar(&path).unwrap();
        assert_eq!(meta.id, req.session_id.to_string());
        assert_eq!(meta.checksum, summary.checksum);
        assert_eq!(meta.tags.title, "Evening Service");
        assert_eq!(meta.tags.track_number, 3);
        assert!((meta.duration_secs - 1.0).abs() < 1e-9);
        assert_eq!(meta.final_path, "/media/usb/take.wav");
        assert!(!sidecar_path(&path).with_extension("json.part").exists());

        cleanup(&path);
    }

    #[test]
    fn sidecar_can_be_disabled() {
        let path = temp_file_path("bare.wav");
        let factory = WavSinkFactory { skip_metadata: true };
        let mut sink = factory.open_sink(&request(path.clone())).unwrap();
        sink.close().unwrap();

        assert!(path.exists());
        assert!(!sidecar_path(&path).exists());
        cleanup(&path);
    }

    #[test]
    fn write_after_close_fails() {
        let path = temp_file_path("closed.wav");
        let mut sink = WavSinkFactory::default().open_sink(&request(path.clone())).unwrap();
        sink.close().unwrap();

        assert!(matches!(sink.write(&[0u8; 2]), Err(RecorderError::Storage(_))));
        assert!(matches!(sink.close(), Err(RecorderError::Storage(_))));
        cleanup(&path);
    }

    #[test]
    fn creates_missing_directories() {
        let dir = std::env::temp_dir().join(format!("recorder_core_dir_{}", Uuid::new_v4()));
        let path = dir.join("nested").join("take.wav");
        let mut sink = WavSinkFactory::default().open_sink(&request(path.clone())).unwrap();
        sink.close().unwrap();

        assert!(path.exists());
        fs::remove_dir_all(&dir).ok();
    }
}
