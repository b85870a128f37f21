//! Font-size fitting.
//!
//! Picks the largest size from a descending ladder whose estimated single-line
//! width fits the available space. The width estimate is deliberately crude:
//! `characters * size * width_factor`. It does not measure glyphs.

use crate::types::POINTS_PER_INCH;
use serde::{Deserialize, Serialize};

/// Bounds and constants for [`fit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    /// Width available for the word, in inches.
    pub max_width_inches: f64,
    pub max_size: u32,
    pub min_size: u32,
    /// Decrement between candidate sizes.
    pub step: u32,
    /// Average glyph width as a fraction of the font size.
    pub width_factor: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            max_width_inches: 8.5,
            max_size: 320,
            min_size: 20,
            step: 5,
            width_factor: 0.6,
        }
    }
}

/// Estimated rendered width of `word` at `size` points, in points.
pub fn estimate_width(word: &str, size: u32, width_factor: f64) -> f64 {
    word.chars().count() as f64 * f64::from(size) * width_factor
}

/// Choose a point size for `word`.
///
/// Returns the first candidate from `max_size` down to `min_size` whose
/// estimated width fits, or `min_size` when none does. The word may overflow
/// the box in that case.
pub fn fit(word: &str, params: &FitParams) -> u32 {
    if params.max_size < params.min_size {
        return params.min_size;
    }

    let max_width_points = params.max_width_inches * POINTS_PER_INCH;
    let step = params.step.max(1) as usize;

    (params.min_size..=params.max_size)
        .rev()
        .step_by(step)
        .find(|&size| estimate_width(word, size, params.width_factor) <= max_width_points)
        .unwrap_or(params.min_size)
}
