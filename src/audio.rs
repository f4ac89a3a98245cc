//! Audio analysis: detected pitches from a WAV recording
//!
//! The recording is cut into overlapping Hann-windowed frames. In each frame
//! the strongest spectral peak inside the configured band is taken as the
//! pitch of that frame, refined by parabolic interpolation on the log
//! magnitudes. Frames that are too quiet, or whose peak does not yield a
//! usable frequency, are skipped and counted.
//!
//! Detection is lazy: [`WavAnalyzer::detections`] returns an iterator that
//! analyzes one frame per step, so taking the first 20 notes only pays for
//! the frames needed to find them.

use std::f32::consts::PI;
use std::path::Path;
use std::sync::Arc;

use hound::{SampleFormat, WavReader};
use log::{debug, info};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use thiserror::Error;

use crate::pitch::{frequency_to_midi, midi_to_note_name};
use crate::tablature::Observation;

/// Default number of detections kept by [`WavAnalyzer::analyze`]
pub const DEFAULT_DETECTION_LIMIT: usize = 20;

/// Errors raised while loading audio
#[derive(Debug, Error)]
pub enum AudioError {
    /// WAV file could not be opened or decoded
    #[error("failed to read WAV: {0}")]
    Wav(#[from] hound::Error),
    /// WAV header declares zero channels or a zero sample rate
    #[error("unsupported WAV layout: {channels} channels at {sample_rate} Hz")]
    UnsupportedLayout {
        /// Channel count from the header
        channels: u16,
        /// Sample rate from the header
        sample_rate: u32,
    },
    /// Frame or hop size unusable
    #[error("invalid analysis settings: frame {frame_size}, hop {hop_size}")]
    InvalidSettings {
        /// Frame size in samples
        frame_size: usize,
        /// Hop size in samples
        hop_size: usize,
    },
}

/// Frame analysis settings
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzerConfig {
    /// Samples per analysis frame
    pub frame_size: usize,
    /// Samples between frame starts
    pub hop_size: usize,
    /// Lowest frequency considered, Hz
    pub min_freq: f32,
    /// Highest frequency considered, Hz
    pub max_freq: f32,
    /// Frames with a lower RMS level are treated as silence
    pub rms_threshold: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            min_freq: 80.0,
            max_freq: 4000.0,
            rms_threshold: 1e-3,
        }
    }
}

/// One frame's detected pitch
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Index of the analysis frame
    pub frame: usize,
    /// Refined peak frequency in Hz
    pub frequency: f64,
    /// Nearest MIDI note
    pub midi: i32,
    /// Note name of `midi`
    pub note: String,
}

/// Collected result of [`WavAnalyzer::analyze`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioAnalysis {
    /// Detected note names in frame order, at most the requested limit
    pub notes: Vec<String>,
    /// Frames examined before the limit was reached or the audio ended
    pub frames_analyzed: usize,
    /// Examined frames that produced no pitch
    pub skipped_frames: usize,
}

impl AudioAnalysis {
    /// Observations of unit duration, one per detected note
    pub fn observations(&self) -> Vec<Observation> {
        self.notes
            .iter()
            .map(|note| Observation::note(note.clone(), 1.0))
            .collect()
    }
}

/// Mono sample buffer ready for pitch detection
pub struct WavAnalyzer {
    samples: Vec<f32>,
    sample_rate: u32,
    config: AnalyzerConfig,
}

impl WavAnalyzer {
    /// Decode a WAV file, mixing all channels down to mono
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(AudioError::UnsupportedLayout {
                channels: spec.channels,
                sample_rate: spec.sample_rate,
            });
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let channels = spec.channels as usize;
        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect::<Vec<_>>();

        debug!(
            "decoded {} samples at {} Hz from {} channel(s)",
            samples.len(),
            spec.sample_rate,
            channels
        );

        Self::from_samples(samples, spec.sample_rate)
    }

    /// Analyze an in-memory mono signal
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::UnsupportedLayout {
                channels: 1,
                sample_rate,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
            config: AnalyzerConfig::default(),
        })
    }

    /// Replace the analysis settings
    pub fn with_config(mut self, config: AnalyzerConfig) -> Result<Self, AudioError> {
        if config.frame_size < 4 || config.hop_size == 0 {
            return Err(AudioError::InvalidSettings {
                frame_size: config.frame_size,
                hop_size: config.hop_size,
            });
        }
        self.config = config;
        Ok(self)
    }

    /// Sample rate of the decoded signal
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of the decoded signal in samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the signal holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Lazy frame-by-frame detections
    pub fn detections(&self) -> Detections<'_> {
        let frame_size = self.config.frame_size;
        let fft = FftPlanner::<f32>::new().plan_fft_forward(frame_size);
        let n_minus_1 = (frame_size - 1) as f32;
        let window = (0..frame_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n_minus_1).cos()))
            .collect();

        Detections {
            analyzer: self,
            fft,
            window,
            buffer: vec![Complex { re: 0.0, im: 0.0 }; frame_size],
            position: 0,
            frames: 0,
            skipped: 0,
        }
    }

    /// Collect up to `limit` detected notes
    pub fn analyze(&self, limit: usize) -> AudioAnalysis {
        let mut detections = self.detections();
        let notes: Vec<String> = detections.by_ref().take(limit).map(|d| d.note).collect();

        let analysis = AudioAnalysis {
            notes,
            frames_analyzed: detections.frames_analyzed(),
            skipped_frames: detections.skipped_frames(),
        };
        info!(
            "detected {} note(s) in {} frame(s), {} skipped",
            analysis.notes.len(),
            analysis.frames_analyzed,
            analysis.skipped_frames
        );
        analysis
    }
}

/// Iterator over per-frame detections; frames without a pitch are skipped
pub struct Detections<'a> {
    analyzer: &'a WavAnalyzer,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    position: usize,
    frames: usize,
    skipped: usize,
}

impl Detections<'_> {
    /// Frames examined so far
    pub fn frames_analyzed(&self) -> usize {
        self.frames
    }

    /// Frames examined so far that produced no pitch
    pub fn skipped_frames(&self) -> usize {
        self.skipped
    }

    fn peak_frequency(&mut self, frame: &[f32]) -> Option<f32> {
        let analyzer = self.analyzer;
        let config = &analyzer.config;
        let frame_size = config.frame_size;

        let rms = (frame.iter().map(|&s| s * s).sum::<f32>() / frame_size as f32).sqrt();
        if rms < config.rms_threshold {
            return None;
        }

        let mean = frame.iter().sum::<f32>() / frame_size as f32;
        for ((slot, &sample), &w) in self.buffer.iter_mut().zip(frame).zip(&self.window) {
            *slot = Complex {
                re: (sample - mean) * w,
                im: 0.0,
            };
        }
        self.fft.process(&mut self.buffer);

        let magnitudes: Vec<f32> = self.buffer[..frame_size / 2].iter().map(|c| c.norm()).collect();

        let bin_freq = analyzer.sample_rate as f32 / frame_size as f32;
        let low = ((config.min_freq / bin_freq).ceil() as usize).max(1);
        let high = ((config.max_freq / bin_freq).floor() as usize).min(magnitudes.len() - 2);
        if low > high {
            return None;
        }

        let (peak_bin, &peak) = magnitudes[low..=high]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(offset, m)| (low + offset, m))?;
        if peak <= 0.0 {
            return None;
        }

        let y1 = magnitudes[peak_bin - 1].ln();
        let y2 = peak.ln();
        let y3 = magnitudes[peak_bin + 1].ln();
        let denominator = 2.0 * y2 - y1 - y3;
        let shift = if y1.is_finite() && y3.is_finite() && denominator.abs() > 1e-6 {
            (y3 - y1) / (2.0 * denominator)
        } else {
            0.0
        };

        let frequency = (peak_bin as f32 + shift) * bin_freq;
        (frequency.is_finite() && frequency > 0.0).then_some(frequency)
    }
}

impl Iterator for Detections<'_> {
    type Item = Detection;

    fn next(&mut self) -> Option<Detection> {
        let analyzer = self.analyzer;
        let frame_size = analyzer.config.frame_size;

        while self.position + frame_size <= analyzer.samples.len() {
            let frame_index = self.frames;
            let frame = &analyzer.samples[self.position..self.position + frame_size];
            self.position += analyzer.config.hop_size;
            self.frames += 1;

            let Some(frequency) = self.peak_frequency(frame) else {
                self.skipped += 1;
                continue;
            };

            match frequency_to_midi(frequency as f64) {
                Ok(midi) => {
                    return Some(Detection {
                        frame: frame_index,
                        frequency: frequency as f64,
                        midi,
                        note: midi_to_note_name(midi),
                    })
                }
                Err(e) => {
                    debug!("frame {}: {}", frame_index, e);
                    self.skipped += 1;
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_detects_a3() {
        let analyzer = WavAnalyzer::from_samples(sine(220.0, 44100, 0.5), 44100).unwrap();
        let analysis = analyzer.analyze(DEFAULT_DETECTION_LIMIT);

        assert_eq!(analysis.notes.len(), DEFAULT_DETECTION_LIMIT);
        assert!(analysis.notes.iter().all(|n| n == "A3"), "{:?}", analysis.notes);
        assert_eq!(analysis.skipped_frames, 0);
        assert_eq!(analysis.frames_analyzed, DEFAULT_DETECTION_LIMIT);
    }

    #[test]
    fn test_silence_is_skipped() {
        let mut samples = vec![0.0; 44100 / 4];
        samples.extend(sine(440.0, 44100, 0.25));

        let analyzer = WavAnalyzer::from_samples(samples, 44100).unwrap();
        let analysis = analyzer.analyze(usize::MAX);

        assert!(analysis.skipped_frames > 0);
        assert_eq!(
            analysis.notes.len() + analysis.skipped_frames,
            analysis.frames_analyzed
        );
        // Frames straddling the onset may land elsewhere; the rest must be A4
        let a4 = analysis.notes.iter().filter(|n| *n == "A4").count();
        assert!(a4 + 4 >= analysis.notes.len(), "{:?}", analysis.notes);
        assert_eq!(analysis.notes.last().map(String::as_str), Some("A4"));
    }

    #[test]
    fn test_short_signal_has_no_frames() {
        let analyzer = WavAnalyzer::from_samples(vec![0.1; 100], 44100).unwrap();
        assert!(!analyzer.is_empty());
        assert_eq!(analyzer.len(), 100);
        assert_eq!(analyzer.analyze(20), AudioAnalysis::default());
    }

    #[test]
    fn test_detections_are_lazy() {
        let analyzer = WavAnalyzer::from_samples(sine(330.0, 44100, 1.0), 44100).unwrap();
        let mut detections = analyzer.detections();
        let first = detections.next().unwrap();
        assert_eq!(first.frame, 0);
        assert_eq!(first.note, "E4");
        assert_eq!(detections.frames_analyzed(), 1);
    }

    #[test]
    fn test_invalid_settings() {
        let analyzer = WavAnalyzer::from_samples(vec![], 44100).unwrap();
        assert!(analyzer.is_empty());
        let config = AnalyzerConfig {
            hop_size: 0,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(
            analyzer.with_config(config),
            Err(AudioError::InvalidSettings { .. })
        ));
        assert!(WavAnalyzer::from_samples(vec![], 0).is_err());
    }

    #[test]
    fn test_observations_have_unit_duration() {
        let analysis = AudioAnalysis {
            notes: vec!["D4".into(), "A4".into()],
            frames_analyzed: 2,
            skipped_frames: 0,
        };
        assert_eq!(
            analysis.observations(),
            [Observation::note("D4", 1.0), Observation::note("A4", 1.0)]
        );
    }
}
