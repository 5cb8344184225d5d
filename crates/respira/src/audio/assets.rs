//! Cue asset decoding and caching
//!
//! Assets are decoded lazily into memory on first use and kept for the
//! process lifetime (no eviction). A file that fails to decode is
//! remembered as degraded so playback can fall back to streaming it
//! directly instead of re-probing on every cue.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::num::NonZero;
use std::path::Path;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, Source};

use super::types::{AssetPaths, CueKind, Segment};

/// A fully decoded audio asset
#[derive(Debug, Clone)]
pub struct DecodedAsset {
    pub channels: NonZero<u16>,
    pub sample_rate: NonZero<u32>,
    pub samples: Vec<f32>,
}

impl DecodedAsset {
    /// Duration of the decoded data in seconds
    pub fn duration_secs(&self) -> f32 {
        let frames = self.samples.len() / self.channels.get() as usize;
        frames as f32 / self.sample_rate.get() as f32
    }

    /// Buffer for a slice of the asset, bounds-saturated.
    ///
    /// Returns `None` when the slice falls entirely outside the data.
    pub fn segment_buffer(&self, segment: Segment) -> Option<SamplesBuffer> {
        let rate = self.sample_rate.get() as f32;
        let ch = self.channels.get() as usize;
        let start_frame = (segment.offset_secs.max(0.0) * rate) as usize;
        let frame_count = (segment.duration_secs.max(0.0) * rate) as usize;

        let start = (start_frame * ch).min(self.samples.len());
        let end = (start + frame_count * ch).min(self.samples.len());
        if start >= end {
            return None;
        }
        Some(SamplesBuffer::new(
            self.channels,
            self.sample_rate,
            self.samples[start..end].to_vec(),
        ))
    }

    /// Buffer for the whole asset
    pub fn full_buffer(&self) -> SamplesBuffer {
        SamplesBuffer::new(self.channels, self.sample_rate, self.samples.clone())
    }
}

/// Cache state per asset
enum AssetState {
    Decoded(DecodedAsset),
    /// Decode failed; stream the file directly instead
    Degraded,
}

/// Lazy, process-lifetime cache of decoded cue assets
pub struct AssetLibrary {
    paths: AssetPaths,
    cache: HashMap<CueKind, AssetState>,
}

impl AssetLibrary {
    pub fn new(paths: AssetPaths) -> Self {
        Self {
            paths,
            cache: HashMap::new(),
        }
    }

    /// Whether a path is configured for the given kind
    pub fn has_path(&self, kind: CueKind) -> bool {
        self.paths.for_kind(kind).is_some()
    }

    /// Decode every configured asset ahead of first use.
    ///
    /// Best-effort: failures are logged and leave the asset degraded.
    /// Returns the number of assets decoded.
    pub fn preload(&mut self) -> usize {
        [CueKind::Breath, CueKind::Ambient]
            .into_iter()
            .filter(|&kind| self.has_path(kind) && self.get(kind).is_some())
            .count()
    }

    /// Decoded asset for the given kind, decoding on first access
    pub fn get(&mut self, kind: CueKind) -> Option<&DecodedAsset> {
        if !self.cache.contains_key(&kind) {
            let state = match self.paths.for_kind(kind) {
                Some(path) => match decode_file(path) {
                    Ok(asset) => AssetState::Decoded(asset),
                    Err(e) => {
                        log::warn!("could not decode {} asset {:?}: {}", kind, path, e);
                        AssetState::Degraded
                    }
                },
                None => return None,
            };
            self.cache.insert(kind, state);
        }
        match self.cache.get(&kind) {
            Some(AssetState::Decoded(asset)) => Some(asset),
            _ => None,
        }
    }

    /// Streaming fallback for a degraded asset: decode the file on the
    /// fly, sliced to the segment. `None` when the file cannot be opened
    /// or probed at all.
    pub fn stream_segment(
        &self,
        kind: CueKind,
        segment: Segment,
    ) -> Option<impl Source + Send + 'static> {
        let path = self.paths.for_kind(kind)?;
        let source = open_stream(path)?;
        Some(
            source
                .skip_duration(std::time::Duration::from_secs_f32(
                    segment.offset_secs.max(0.0),
                ))
                .take_duration(std::time::Duration::from_secs_f32(
                    segment.duration_secs.max(0.0),
                )),
        )
    }

    /// Streaming fallback for the whole of a degraded asset
    pub fn stream_full(&self, kind: CueKind) -> Option<impl Source + Send + 'static> {
        let path = self.paths.for_kind(kind)?;
        open_stream(path)
    }
}

/// Decode an entire file into memory
fn decode_file(path: &Path) -> crate::error::Result<DecodedAsset> {
    let file = File::open(path)?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| crate::error::BreathError::Audio(format!("decode {:?}: {}", path, e)))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.collect();
    Ok(DecodedAsset {
        channels,
        sample_rate,
        samples,
    })
}

/// Open a file as a streaming source, logging on failure
fn open_stream(path: &Path) -> Option<Decoder<BufReader<File>>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("could not open audio file {:?}: {}", path, e);
            return None;
        }
    };
    match Decoder::new(BufReader::new(file)) {
        Ok(d) => Some(d),
        Err(e) => {
            log::warn!("could not probe audio file {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    /// Build a minimal valid WAV file in memory
    fn make_wav(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
        let block_align = channels * (bits_per_sample / 8);
        let data_size = (samples.len() * 2) as u32;
        let file_size = 36 + data_size;

        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            buf.extend_from_slice(&s.to_le_bytes());
        }
        buf
    }

    fn write_temp(name: &str, data: &[u8]) -> std::path::PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("respira_asset_{}_{}", id, name));
        let mut f = File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    /// One second of mono audio at 8kHz
    fn one_second_wav_path() -> std::path::PathBuf {
        let samples: Vec<i16> = (0..8000)
            .map(|i| ((i as f32 * 0.1).sin() * 10000.0) as i16)
            .collect();
        write_temp("1s.wav", &make_wav(8000, 1, &samples))
    }

    fn asset(channels: u16, rate: u32, frames: usize) -> DecodedAsset {
        DecodedAsset {
            channels: NonZero::new(channels).unwrap(),
            sample_rate: NonZero::new(rate).unwrap(),
            samples: vec![0.5; frames * channels as usize],
        }
    }

    // --- DecodedAsset ---

    #[test]
    fn duration_from_frames() {
        let a = asset(2, 1000, 500);
        assert!((a.duration_secs() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn segment_inside_bounds() {
        let a = asset(1, 100, 100); // 1 second
        let buf = a.segment_buffer(Segment::new(0.25, 0.5));
        assert!(buf.is_some());
        let collected: Vec<f32> = buf.unwrap().collect();
        assert_eq!(collected.len(), 50);
    }

    #[test]
    fn segment_clipped_at_end() {
        let a = asset(1, 100, 100);
        let buf = a.segment_buffer(Segment::new(0.9, 5.0)).unwrap();
        let collected: Vec<f32> = buf.collect();
        assert_eq!(collected.len(), 10);
    }

    #[test]
    fn segment_past_end_is_none() {
        let a = asset(1, 100, 100);
        assert!(a.segment_buffer(Segment::new(2.0, 1.0)).is_none());
    }

    #[test]
    fn zero_duration_segment_is_none() {
        let a = asset(1, 100, 100);
        assert!(a.segment_buffer(Segment::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn negative_offset_saturates_to_start() {
        let a = asset(1, 100, 100);
        let buf = a.segment_buffer(Segment::new(-3.0, 0.1)).unwrap();
        let collected: Vec<f32> = buf.collect();
        assert_eq!(collected.len(), 10);
    }

    #[test]
    fn stereo_segment_counts_both_channels() {
        let a = asset(2, 100, 100);
        let buf = a.segment_buffer(Segment::new(0.0, 0.5)).unwrap();
        let collected: Vec<f32> = buf.collect();
        assert_eq!(collected.len(), 100); // 50 frames * 2 channels
    }

    #[test]
    fn full_buffer_covers_everything() {
        let a = asset(1, 100, 42);
        let collected: Vec<f32> = a.full_buffer().collect();
        assert_eq!(collected.len(), 42);
    }

    // --- AssetLibrary ---

    #[test]
    fn decode_valid_wav() {
        let path = one_second_wav_path();
        let mut lib = AssetLibrary::new(AssetPaths {
            breath: Some(path.clone()),
            ambient: None,
        });
        let asset = lib.get(CueKind::Breath).expect("should decode");
        assert_eq!(asset.channels.get(), 1);
        assert_eq!(asset.sample_rate.get(), 8000);
        assert!((asset.duration_secs() - 1.0).abs() < 0.01);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_path_is_none() {
        let mut lib = AssetLibrary::new(AssetPaths::default());
        assert!(lib.get(CueKind::Breath).is_none());
        assert!(lib.get(CueKind::Ambient).is_none());
        assert!(!lib.has_path(CueKind::Breath));
    }

    #[test]
    fn garbage_file_degrades() {
        let path = write_temp("garbage.wav", &[0xDE, 0xAD, 0xBE, 0xEF]);
        let mut lib = AssetLibrary::new(AssetPaths {
            breath: Some(path.clone()),
            ambient: None,
        });
        assert!(lib.get(CueKind::Breath).is_none());
        // Second lookup hits the degraded marker, not a re-decode
        assert!(lib.get(CueKind::Breath).is_none());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn nonexistent_file_degrades() {
        let mut lib = AssetLibrary::new(AssetPaths {
            breath: Some(std::path::PathBuf::from("/nonexistent/respira.wav")),
            ambient: None,
        });
        assert!(lib.get(CueKind::Breath).is_none());
    }

    #[test]
    fn preload_counts_decoded_assets() {
        let path = one_second_wav_path();
        let mut lib = AssetLibrary::new(AssetPaths {
            breath: Some(path.clone()),
            ambient: Some(std::path::PathBuf::from("/nonexistent/ambient.ogg")),
        });
        assert_eq!(lib.preload(), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn preload_with_no_paths_is_zero() {
        let mut lib = AssetLibrary::new(AssetPaths::default());
        assert_eq!(lib.preload(), 0);
    }

    #[test]
    fn stream_segment_from_valid_file() {
        let path = one_second_wav_path();
        let lib = AssetLibrary::new(AssetPaths {
            breath: Some(path.clone()),
            ambient: None,
        });
        let source = lib.stream_segment(CueKind::Breath, Segment::new(0.1, 0.2));
        assert!(source.is_some());
        let collected: Vec<f32> = source.unwrap().collect();
        // ~0.2s at 8kHz mono; symphonia may pad slightly at block edges
        assert!(
            (1400..=1800).contains(&collected.len()),
            "got {} samples",
            collected.len()
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn stream_from_garbage_is_none() {
        let path = write_temp("noise.bin", &[0u8; 64]);
        let lib = AssetLibrary::new(AssetPaths {
            breath: Some(path.clone()),
            ambient: None,
        });
        assert!(lib.stream_full(CueKind::Breath).is_none());
        let _ = std::fs::remove_file(&path);
    }
}
