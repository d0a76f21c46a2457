/// Quality trimming from per-base error probabilities
///
/// The error probabilities are smoothed with a centered moving average and
/// every position whose smoothed value falls below the threshold is
/// considered trustworthy. The trim region spans the first to the last such
/// position; positions in between are not required to qualify.
use crate::{AmpliclusterError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD: f64 = 0.001;
pub const DEFAULT_WINDOW_WIDTH: usize = 21;

/// Trim regions never start before the end of the forward primer.
pub const FORWARD_PRIMER_OFFSET: usize = 38;

/// Raw trim region, 1-based inclusive with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimRegion {
    pub start: usize,
    pub end: usize,
}

/// Trim bounds as stored with a read.
///
/// `Region` is 1-based inclusive with `start <= end + 1`; `start == end + 1`
/// is an explicitly empty region. `Undefined` marks reads whose
/// probabilities could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimBounds {
    Undefined,
    Region { start: usize, end: usize },
}

impl TrimBounds {
    /// Moves the start past the primer and turns inverted ranges into an empty region.
    ///
    /// A missing raw region becomes the empty region at the primer offset.
    pub fn clamp(raw: Option<TrimRegion>, primer_offset: usize) -> Self {
        let offset = primer_offset.max(1);
        let (start, end) = match raw {
            Some(region) => (region.start.max(offset), region.end),
            None => (offset, 0),
        };
        let end = if end < start { start - 1 } else { end };
        TrimBounds::Region { start, end }
    }

    /// Rebuilds bounds from stored column values.
    pub fn from_columns(start: Option<i64>, end: Option<i64>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) if start >= 1 && end >= start - 1 => TrimBounds::Region {
                start: start as usize,
                end: end as usize,
            },
            _ => TrimBounds::Undefined,
        }
    }

    /// Number of bases in the region, `None` when undefined.
    pub fn trimmed_len(&self) -> Option<usize> {
        match *self {
            TrimBounds::Undefined => None,
            TrimBounds::Region { start, end } => Some(end + 1 - start),
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, TrimBounds::Region { .. })
    }

    pub fn is_empty_region(&self) -> bool {
        self.trimmed_len() == Some(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityTrimmer {
    threshold: f64,
    window_width: usize,
}

impl Default for QualityTrimmer {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            window_width: DEFAULT_WINDOW_WIDTH,
        }
    }
}

impl QualityTrimmer {
    pub fn new(threshold: f64, window_width: usize) -> Result<Self> {
        if window_width == 0 {
            return Err(AmpliclusterError::InvalidInput(
                "trimming window width must be positive".to_string(),
            ));
        }
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(AmpliclusterError::InvalidInput(format!(
                "trimming threshold must be a positive number, got {}",
                threshold
            )));
        }
        Ok(Self {
            threshold,
            window_width,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn window_width(&self) -> usize {
        self.window_width
    }

    /// Computes the trim region, or `None` when no position qualifies.
    pub fn trim(&self, error_probs: &[f64]) -> Option<TrimRegion> {
        let smoothed = self.smooth(error_probs);

        let mut selected = smoothed
            .iter()
            .enumerate()
            .filter(|(_, &p)| p < self.threshold)
            .map(|(i, _)| i + 1);

        let start = selected.next()?;
        let end = selected.last().unwrap_or(start);
        Some(TrimRegion { start, end })
    }

    /// Centered moving average over the probabilities padded with the threshold.
    ///
    /// The result has one value per input position. Even widths reach one
    /// position further forward than backward.
    pub fn smooth(&self, error_probs: &[f64]) -> Vec<f64> {
        if error_probs.is_empty() {
            return Vec::new();
        }

        let pad = self.window_width / 2;
        let mut padded = Vec::with_capacity(error_probs.len() + 2 * pad);
        padded.resize(pad, self.threshold);
        padded.extend_from_slice(error_probs);
        padded.resize(error_probs.len() + 2 * pad, self.threshold);

        // Window for original position i covers padded[i + pad - back ..= i + pad + forward].
        let forward = self.window_width / 2;
        let back = self.window_width - 1 - forward;
        let width = self.window_width as f64;

        let mut sum: f64 = padded[pad - back..=pad + forward].iter().sum();
        let mut smoothed = Vec::with_capacity(error_probs.len());
        smoothed.push(sum / width);
        for i in 1..error_probs.len() {
            sum += padded[i + pad + forward] - padded[i + pad - back - 1];
            smoothed.push(sum / width);
        }
        smoothed
    }
}

/// Convenience wrapper with explicit parameters.
pub fn trim(error_probs: &[f64], threshold: f64, window_width: usize) -> Result<Option<TrimRegion>> {
    Ok(QualityTrimmer::new(threshold, window_width)?.trim(error_probs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_has_no_region() {
        assert_eq!(QualityTrimmer::default().trim(&[]), None);
    }

    #[test]
    fn test_all_zero_is_full_length() {
        let probs = vec![0.0; 150];
        assert_eq!(
            QualityTrimmer::default().trim(&probs),
            Some(TrimRegion { start: 1, end: 150 })
        );
    }

    #[test]
    fn test_noisy_ends_are_trimmed() {
        let mut probs = vec![0.5; 30];
        probs.extend(vec![0.0; 100]);
        probs.extend(vec![0.5; 30]);

        // Only positions whose whole window is clean qualify.
        assert_eq!(
            QualityTrimmer::default().trim(&probs),
            Some(TrimRegion { start: 41, end: 120 })
        );
    }

    #[test]
    fn test_region_is_not_required_to_be_contiguous() {
        // Two clean blocks separated by a long noisy stretch.
        let mut probs = vec![0.0; 40];
        probs.extend(vec![0.9; 100]);
        probs.extend(vec![0.0; 40]);

        let region = QualityTrimmer::default().trim(&probs).unwrap();
        assert_eq!(region.start, 1);
        assert_eq!(region.end, 180);
    }

    #[test]
    fn test_smooth_keeps_length() {
        let trimmer = QualityTrimmer::new(0.01, 4).unwrap();
        let probs = [0.0, 0.04, 0.0, 0.0, 0.0];
        let smoothed = trimmer.smooth(&probs);
        assert_eq!(smoothed.len(), probs.len());
        // Width 4 looks at one position back and two forward.
        assert!((smoothed[0] - (0.01 + 0.0 + 0.04 + 0.0) / 4.0).abs() < 1e-12);
        assert!((smoothed[4] - (0.0 + 0.0 + 0.01 + 0.01) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(QualityTrimmer::new(0.001, 0).is_err());
        assert!(QualityTrimmer::new(0.0, 21).is_err());
        assert!(QualityTrimmer::new(f64::NAN, 21).is_err());
        assert!(trim(&[0.0], 0.001, 1).unwrap().is_some());
    }

    #[test]
    fn test_clamp_moves_start_past_primer() {
        let raw = Some(TrimRegion { start: 1, end: 150 });
        assert_eq!(
            TrimBounds::clamp(raw, FORWARD_PRIMER_OFFSET),
            TrimBounds::Region { start: 38, end: 150 }
        );

        let late = Some(TrimRegion { start: 45, end: 150 });
        assert_eq!(
            TrimBounds::clamp(late, FORWARD_PRIMER_OFFSET),
            TrimBounds::Region { start: 45, end: 150 }
        );
    }

    #[test]
    fn test_clamp_inverted_range_becomes_empty() {
        let raw = Some(TrimRegion { start: 3, end: 20 });
        let bounds = TrimBounds::clamp(raw, FORWARD_PRIMER_OFFSET);
        assert_eq!(bounds, TrimBounds::Region { start: 38, end: 37 });
        assert!(bounds.is_empty_region());
        assert_eq!(bounds.trimmed_len(), Some(0));
    }

    #[test]
    fn test_clamp_missing_region_is_empty() {
        let bounds = TrimBounds::clamp(None, FORWARD_PRIMER_OFFSET);
        assert_eq!(bounds, TrimBounds::Region { start: 38, end: 37 });
        assert!(bounds.is_defined());
    }

    #[test]
    fn test_bounds_from_columns() {
        assert_eq!(
            TrimBounds::from_columns(Some(38), Some(200)),
            TrimBounds::Region { start: 38, end: 200 }
        );
        assert_eq!(
            TrimBounds::from_columns(Some(38), Some(37)),
            TrimBounds::Region { start: 38, end: 37 }
        );
        assert_eq!(TrimBounds::from_columns(None, None), TrimBounds::Undefined);
        assert_eq!(TrimBounds::from_columns(Some(38), Some(20)), TrimBounds::Undefined);
        assert_eq!(TrimBounds::Undefined.trimmed_len(), None);
    }

    proptest! {
        #[test]
        fn prop_above_threshold_has_no_region(
            probs in prop::collection::vec(0.002f64..=1.0, 0..300)
        ) {
            prop_assert_eq!(QualityTrimmer::default().trim(&probs), None);
        }

        #[test]
        fn prop_zero_probabilities_span_read(len in 1usize..400, width in 1usize..40) {
            let trimmer = QualityTrimmer::new(DEFAULT_THRESHOLD, width).unwrap();
            prop_assert_eq!(
                trimmer.trim(&vec![0.0; len]),
                Some(TrimRegion { start: 1, end: len })
            );
        }

        #[test]
        fn prop_region_within_read(probs in prop::collection::vec(0.0f64..0.01, 1..300)) {
            if let Some(region) = QualityTrimmer::default().trim(&probs) {
                prop_assert!(region.start >= 1);
                prop_assert!(region.start <= region.end);
                prop_assert!(region.end <= probs.len());
            }
        }

        #[test]
        fn prop_clamped_bounds_are_never_inverted(start in 1usize..500, len in 0usize..500) {
            let raw = TrimRegion { start, end: start + len };
            match TrimBounds::clamp(Some(raw), FORWARD_PRIMER_OFFSET) {
                TrimBounds::Region { start: s, end: e } => {
                    prop_assert!(s >= FORWARD_PRIMER_OFFSET);
                    prop_assert!(s <= e + 1);
                    if raw.start < FORWARD_PRIMER_OFFSET {
                        prop_assert_eq!(s, FORWARD_PRIMER_OFFSET);
                    }
                }
                TrimBounds::Undefined => prop_assert!(false, "clamping never yields undefined"),
            }
        }
    }
}
