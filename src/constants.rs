//! Global constants for the editor core

/// Minimum screen-space width and height of a draw gesture, in pixels
pub const MIN_DRAW_SIZE: f64 = 10.0;

/// Confidence assigned to user-drawn regions
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Lower bound of the confidence slider (1-100 scale)
pub const CONFIDENCE_SLIDER_MIN: f64 = 1.0;

/// Upper bound of the confidence slider (1-100 scale)
pub const CONFIDENCE_SLIDER_MAX: f64 = 100.0;

/// Smallest natural-space extent a resized region may shrink to
pub const MIN_REGION_EXTENT: f64 = 1.0;

/// CIoU below which a matched pair counts as a significant difference
pub const DEFAULT_CIOU_THRESHOLD: f64 = 0.5;

/// Confidence at or above which removing an AI region flags the case
pub const DEFAULT_REMOVAL_CONFIDENCE: f64 = 0.75;
