// CycleSegmenter - picks one window per cardiac/respiratory cycle
//
// The strongest remaining centroid peak is taken as the anchor of a cycle and
// converted into the window [t - pre_roll, t + post_roll). A peak whose window
// would leave the recording is rejected on its own; an accepted peak suppresses
// the frames [i - suppress_before, i + suppress_after] so the next pick lands on
// a different cycle. The asymmetric suppression skips the tail of the current
// event without blanking the lead-in of the next one.
//
// The curve is copied into a buffer owned by the call; suppression writes the
// SUPPRESSED sentinel into that buffer only.

use serde::Serialize;

use crate::analysis::centroid::CentroidCurve;
use crate::config::SegmentationConfig;

/// Value written over rejected or suppressed frames
pub const SUPPRESSED: f32 = -100.0;

/// One accepted analysis window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    /// Frame index of the anchoring centroid peak
    pub peak_index: usize,
    /// Peak time in seconds
    pub peak_time_s: f64,
    /// Window start in seconds (inclusive)
    pub start_s: f64,
    /// Window end in seconds (exclusive)
    pub end_s: f64,
}

impl Segment {
    pub fn duration_s(&self) -> f64 {
        self.end_s - self.start_s
    }
}

/// Outcome of one segmentation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentationReport {
    /// Number of cycles the recording length allows
    pub target_count: usize,
    /// Accepted windows in acceptance order
    pub accepted: Vec<Segment>,
    /// Peaks rejected because their window left the recording
    pub rejected_peaks: Vec<usize>,
    /// True when the curve ran out of candidates before `target_count`
    pub exhausted: bool,
}

/// Loop state of the peak search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchState {
    Searching,
    TargetReached,
    Exhausted,
}

/// Segments a centroid curve into fixed-length cycle windows
#[derive(Debug, Clone)]
pub struct CycleSegmenter {
    config: SegmentationConfig,
}

impl CycleSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Number of windows requested for a recording of `duration_s` seconds
    ///
    /// `floor(duration / cycle_period - 1)`, zero for short recordings or a
    /// non-positive cycle period.
    pub fn target_count(&self, duration_s: f64) -> usize {
        if self.config.cycle_period_s <= 0.0 || !duration_s.is_finite() {
            return 0;
        }
        let target = (duration_s / self.config.cycle_period_s - 1.0).floor();
        if target <= 0.0 {
            0
        } else {
            target as usize
        }
    }

    /// Accepted windows for `curve` over a recording of `duration_s` seconds
    pub fn segment(&self, curve: &CentroidCurve, duration_s: f64) -> Vec<Segment> {
        self.segment_with_report(curve, duration_s).accepted
    }

    /// Run the peak search and keep the bookkeeping
    pub fn segment_with_report(&self, curve: &CentroidCurve, duration_s: f64) -> SegmentationReport {
        let target_count = self.target_count(duration_s);
        let mut report = SegmentationReport {
            target_count,
            accepted: Vec::with_capacity(target_count),
            rejected_peaks: Vec::new(),
            exhausted: false,
        };

        if target_count == 0 {
            log::debug!(
                "[Segmenter] recording of {:.3}s is too short for a full cycle",
                duration_s
            );
            return report;
        }

        let mut working: Vec<f32> = curve.values().to_vec();
        let mut state = SearchState::Searching;

        while state == SearchState::Searching {
            let Some(peak) = strongest_candidate(&working) else {
                state = SearchState::Exhausted;
                continue;
            };

            let t = curve.frame_time(peak);
            let start = t - self.config.pre_roll_s;
            let end = t + self.config.post_roll_s;

            if start < 0.0 || end > duration_s {
                log::trace!("[Segmenter] rejected peak {} at {:.3}s", peak, t);
                working[peak] = SUPPRESSED;
                report.rejected_peaks.push(peak);
                continue;
            }

            log::debug!(
                "[Segmenter] accepted peak {} at {:.3}s -> [{:.3}, {:.3})",
                peak,
                t,
                start,
                end
            );
            report.accepted.push(Segment {
                peak_index: peak,
                peak_time_s: t,
                start_s: start,
                end_s: end,
            });
            self.suppress_around(&mut working, peak);

            if report.accepted.len() >= target_count {
                state = SearchState::TargetReached;
            }
        }

        report.exhausted = state == SearchState::Exhausted;
        if report.exhausted {
            log::info!(
                "[Segmenter] curve exhausted after {} of {} segments",
                report.accepted.len(),
                target_count
            );
        }
        report
    }

    /// Write the sentinel over `[peak - before, peak + after]`, clipped to the curve
    fn suppress_around(&self, working: &mut [f32], peak: usize) {
        if working.is_empty() {
            return;
        }
        let first = peak.saturating_sub(self.config.suppress_before);
        let last = peak
            .saturating_add(self.config.suppress_after)
            .min(working.len() - 1);
        working[first..=last].fill(SUPPRESSED);
    }
}

/// First index holding the maximum non-sentinel value
fn strongest_candidate(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in values.iter().enumerate() {
        if value <= SUPPRESSED || value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}
