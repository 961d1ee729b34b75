// Analysis module - DSP stages of the diagnosis pipeline
//
// Stages run in order for every recording:
// - centroid: framewise spectral-centroid curve (cycle locator)
// - segmenter: peak picking with boundary checks and suppression windows
// - features: gammatone cepstral coefficients per accepted segment
// - vote: per-segment labels collapsed into one verdict
//
// fft is shared by centroid and features.

pub mod centroid;
pub mod features;
pub mod fft;
pub mod segmenter;
pub mod vote;

pub use centroid::{CentroidCurve, CentroidTracker};
pub use features::{FeatureExtractor, FeatureTransform, FeatureVector};
pub use segmenter::{CycleSegmenter, Segment, SegmentationReport};
pub use vote::{aggregate, Outcome, Verdict, VoteTally};
