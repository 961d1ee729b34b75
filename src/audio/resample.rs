//! Sample-rate conversion using Rubato
//!
//! Normalizes every recording to the analysis rate so that frame-to-time
//! mapping and segment windows are rate independent.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::InputError;

const CHUNK_SIZE: usize = 1024;

/// Resample mono audio from `source_rate` to `target_rate`
///
/// Returns a copy when the rates already match. The output is compensated for
/// the resampler delay and truncated to `floor(len * ratio)` samples.
pub fn resample(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, InputError> {
    if source_rate == 0 {
        return Err(InputError::InvalidSampleRate {
            sample_rate: source_rate,
        });
    }
    if target_rate == 0 {
        return Err(InputError::InvalidSampleRate {
            sample_rate: target_rate,
        });
    }
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = target_rate as f64 / source_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, 1).map_err(
        |err| InputError::Decode {
            reason: format!("failed to create resampler: {}", err),
        },
    )?;

    let expected_len = (samples.len() as f64 * ratio) as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected_len + delay + CHUNK_SIZE);
    let mut pos = 0;

    // Keep feeding (zero padded) chunks until the delayed tail is flushed
    while output.len() < expected_len + delay {
        let mut chunk = vec![0.0f32; CHUNK_SIZE];
        if pos < samples.len() {
            let end = (pos + CHUNK_SIZE).min(samples.len());
            chunk[..end - pos].copy_from_slice(&samples[pos..end]);
        }
        pos += CHUNK_SIZE;

        let input = vec![chunk];
        let resampled = resampler
            .process(&input, None)
            .map_err(|err| InputError::Decode {
                reason: format!("resampling failed: {}", err),
            })?;

        if let Some(channel) = resampled.first() {
            output.extend_from_slice(channel);
        }
    }

    Ok(output
        .into_iter()
        .skip(delay)
        .take(expected_len)
        .collect())
}
