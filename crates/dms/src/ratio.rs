//! Eye openness estimation from eye bounding boxes

use crate::detector::EyeRegion;

/// Denominator floor so zero-width boxes never divide by zero
pub const RATIO_EPSILON: f64 = 1e-6;

impl EyeRegion {
    /// Openness sample: box height over width
    pub fn openness(&self) -> f64 {
        self.bbox.height as f64 / (self.bbox.width as f64 + RATIO_EPSILON)
    }
}

/// Mean openness over all eyes of the primary face.
///
/// An empty set yields `0.0`, which reads as "no eye evidence" and classifies
/// as closed.
pub fn estimate_ratio(eyes: &[EyeRegion]) -> f64 {
    if eyes.is_empty() {
        return 0.0;
    }
    eyes.iter().map(EyeRegion::openness).sum::<f64>() / eyes.len() as f64
}
