// WAV decoding - PCM bytes to normalized mono samples

use std::io::Cursor;

use hound::{SampleFormat, WavReader};

use crate::error::InputError;

/// Decoded recording before resampling
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate of the file in Hz
    pub sample_rate: u32,
    /// Channel count of the file (samples are already downmixed)
    pub channels: u16,
}

/// Decode WAV bytes and downmix to mono
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio, InputError> {
    let mut reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    if spec.channels == 0 {
        return Err(InputError::UnsupportedFormat {
            details: "WAV header declares zero channels".to_string(),
        });
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()?,
        (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
            let max = ((1i64 << (bits - 1)) - 1) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / max))
                .collect::<Result<Vec<f32>, _>>()?
        }
        (format, bits) => {
            return Err(InputError::UnsupportedFormat {
                details: format!("{:?} {}-bit audio", format, bits),
            })
        }
    };

    Ok(DecodedAudio {
        samples: downmix(&interleaved, spec.channels),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Average interleaved channels into one
fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn stereo_i16_bytes(frames: &[(i16, i16)], sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &(left, right) in frames {
                writer.write_sample(left).unwrap();
                writer.write_sample(right).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_downmixes_stereo() {
        let bytes = stereo_i16_bytes(&[(32767, 0), (0, -32767)], 8000);
        let decoded = decode_wav(&bytes).unwrap();

        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.samples.len(), 2);
        assert!((decoded.samples[0] - 0.5).abs() < 1e-6);
        assert!((decoded.samples[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_float_samples() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 4000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(0.25f32).unwrap();
            writer.write_sample(-0.75f32).unwrap();
            writer.finalize().unwrap();
        }

        let decoded = decode_wav(&cursor.into_inner()).unwrap();
        assert_eq!(decoded.samples, vec![0.25, -0.75]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        assert_eq!(downmix(&[0.1, 0.2, 0.3], 1), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_decode_rejects_truncated_header() {
        let result = decode_wav(b"RIFF");
        assert!(result.is_err());
    }
}
