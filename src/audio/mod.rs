// Audio module - recording ingestion
//
// Decodes uploaded WAV bytes, downmixes to mono and resamples to the
// analysis rate. The resulting `Signal` is immutable for the rest of the
// request.

pub mod decode;
pub mod resample;
pub mod signal;

pub use decode::{decode_wav, DecodedAudio};
pub use signal::Signal;

use std::path::Path;

use crate::error::InputError;

/// Decode WAV bytes into a mono signal at `target_rate`
pub fn load_wav(bytes: &[u8], target_rate: u32) -> Result<Signal, InputError> {
    let decoded = decode_wav(bytes)?;
    let samples = resample::resample(&decoded.samples, decoded.sample_rate, target_rate)?;
    log::debug!(
        "[SignalLoader] {} channel(s) @ {} Hz -> {} mono samples @ {} Hz",
        decoded.channels,
        decoded.sample_rate,
        samples.len(),
        target_rate
    );
    Signal::new(samples, target_rate)
}

/// Read and decode a WAV file from disk
pub fn load_wav_file<P: AsRef<Path>>(path: P, target_rate: u32) -> Result<Signal, InputError> {
    let bytes = std::fs::read(path.as_ref()).map_err(|err| InputError::Decode {
        reason: format!("reading {}: {}", path.as_ref().display(), err),
    })?;
    load_wav(&bytes, target_rate)
}
