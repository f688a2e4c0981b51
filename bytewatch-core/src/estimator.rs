//! Byte estimation for a single network observation.
//!
//! Exact transfer sizes are not visible to the host for most requests, so an
//! explicit length header wins and everything else falls back to a fixed
//! per-category table.

use crate::models::{Direction, NetworkObservation, ResourceCategory};

/// Estimated bytes for a top-level document.
pub const MAIN_FRAME_ESTIMATE: u64 = 50_000;
/// Estimated bytes for an embedded frame.
pub const SUB_FRAME_ESTIMATE: u64 = 10_000;
/// Estimated bytes for a stylesheet.
pub const STYLESHEET_ESTIMATE: u64 = 20_000;
/// Estimated bytes for a script.
pub const SCRIPT_ESTIMATE: u64 = 30_000;
/// Estimated bytes for an image.
pub const IMAGE_ESTIMATE: u64 = 100_000;
/// Estimated bytes for audio or video.
pub const MEDIA_ESTIMATE: u64 = 500_000;
/// Estimated bytes for anything unclassified.
pub const OTHER_ESTIMATE: u64 = 5_000;

impl ResourceCategory {
    /// Returns the fallback estimate for this category.
    pub fn default_estimate(&self) -> u64 {
        match self {
            ResourceCategory::MainFrame => MAIN_FRAME_ESTIMATE,
            ResourceCategory::SubFrame => SUB_FRAME_ESTIMATE,
            ResourceCategory::Stylesheet => STYLESHEET_ESTIMATE,
            ResourceCategory::Script => SCRIPT_ESTIMATE,
            ResourceCategory::Image => IMAGE_ESTIMATE,
            ResourceCategory::Media => MEDIA_ESTIMATE,
            ResourceCategory::Other => OTHER_ESTIMATE,
        }
    }
}

/// Parses a raw length header as a base-10 byte count.
///
/// Returns `None` for empty, negative, fractional or non-numeric values.
pub fn parse_length_hint(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

/// Estimates the bytes transferred by one observation.
///
/// Never fails. Request-side observations count only an explicit length and
/// otherwise estimate to zero.
pub fn estimate(observation: &NetworkObservation) -> u64 {
    if let Some(bytes) = observation.byte_hint.as_deref().and_then(parse_length_hint) {
        return bytes;
    }

    match observation.direction {
        Direction::Response => observation.category.default_estimate(),
        Direction::Request => 0,
    }
}
