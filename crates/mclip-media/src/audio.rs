//! Audio decoding and loudness envelope computation.
//!
//! Audio arrives as a WAV file (the upstream extraction step writes one per
//! video). Samples are mixed down to mono f32 and reduced to an RMS envelope
//! in dBFS at a fixed analysis rate.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use mclip_models::{AudioEnergyEnvelope, EnergySample};
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};

/// Default envelope resolution (10 samples per second).
pub const DEFAULT_ENVELOPE_WINDOW_SECS: f64 = 0.1;

/// Level reported for digital silence.
pub const SILENCE_FLOOR_DB: f64 = -100.0;

/// Mono PCM samples in `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode a WAV file and mix all channels down to mono.
pub fn load_wav_mono(path: &Path) -> AnalysisResult<DecodedAudio> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    if interleaved.is_empty() {
        return Err(AnalysisError::NoAudioData(path.to_path_buf()));
    }

    let samples: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = channels,
        samples = samples.len(),
        "Decoded WAV audio"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Reduce PCM samples to an RMS envelope in dBFS.
///
/// Each envelope sample covers `window_secs` of audio and is stamped at the
/// window centre. A trailing partial window is kept.
pub fn compute_envelope(
    samples: &[f32],
    sample_rate: u32,
    window_secs: f64,
) -> AnalysisResult<AudioEnergyEnvelope> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(sample_rate));
    }
    if !(window_secs > 0.0) {
        return Err(AnalysisError::InvalidWindow(window_secs));
    }

    let window_len = ((sample_rate as f64 * window_secs).round() as usize).max(1);
    let rate = sample_rate as f64;

    let levels = samples
        .chunks(window_len)
        .enumerate()
        .map(|(i, chunk)| {
            let mean_sq =
                chunk.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>() / chunk.len() as f64;
            let centre = (i * window_len) as f64 / rate + chunk.len() as f64 / rate / 2.0;
            EnergySample::new(centre, rms_to_db(mean_sq.sqrt()))
        })
        .collect();

    Ok(AudioEnergyEnvelope::new(window_len as f64 / rate, levels))
}

/// Reject empty envelopes and non-increasing timestamps.
pub fn validate_envelope(envelope: &AudioEnergyEnvelope) -> AnalysisResult<()> {
    if envelope.is_empty() {
        return Err(AnalysisError::EmptyEnvelope);
    }
    if !(envelope.window_secs() > 0.0) {
        return Err(AnalysisError::InvalidWindow(envelope.window_secs()));
    }
    if let Some(index) = envelope.first_non_increasing() {
        return Err(AnalysisError::NonIncreasingTimestamps { index });
    }
    Ok(())
}

fn rms_to_db(rms: f64) -> f64 {
    if rms <= 0.0 {
        return SILENCE_FLOOR_DB;
    }
    (20.0 * rms.log10()).max(SILENCE_FLOOR_DB)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    #[test]
    fn test_envelope_levels() {
        // 1 second of silence followed by 1 second at half scale
        let mut samples = vec![0.0f32; 1000];
        samples.extend(std::iter::repeat(0.5f32).take(1000));

        let envelope = compute_envelope(&samples, 1000, 0.1).unwrap();
        assert_eq!(envelope.len(), 20);
        assert_eq!(envelope.samples()[0].level_db, SILENCE_FLOOR_DB);
        assert!((envelope.samples()[0].timestamp - 0.05).abs() < 1e-9);
        assert!((envelope.samples()[15].level_db - (-6.0206)).abs() < 1e-3);
        assert!((envelope.duration() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_envelope_rejects_bad_parameters() {
        assert!(matches!(
            compute_envelope(&[0.0], 0, 0.1),
            Err(AnalysisError::InvalidSampleRate(0))
        ));
        assert!(matches!(
            compute_envelope(&[0.0], 16000, 0.0),
            Err(AnalysisError::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_load_wav_mixes_to_mono() {
        let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(file.path(), spec).unwrap();
        for _ in 0..800 {
            writer.write_sample(i16::MAX / 2).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let audio = load_wav_mono(file.path()).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.samples.len(), 800);
        assert!((audio.samples[0] - 0.25).abs() < 1e-3);
        assert!((audio.duration_secs() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_wav_mono(Path::new("/nonexistent/audio.wav"));
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }
}
