//! Viewport geometry: configuration, state and the visible-range math.

use serde::Serialize;

use crate::error::RenderError;

/// Default fixed row height in pixels
pub const DEFAULT_ITEM_HEIGHT: f64 = 60.0;
/// Default rows rendered beyond each edge of the viewport
pub const DEFAULT_BUFFER: usize = 5;

// == Viewport Config ==
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportConfig {
    /// Fixed height of every item, in pixels
    pub item_height: f64,
    /// Extra items rendered above and below the visible area
    pub buffer: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            item_height: DEFAULT_ITEM_HEIGHT,
            buffer: DEFAULT_BUFFER,
        }
    }
}

impl ViewportConfig {
    pub fn new(item_height: f64, buffer: usize) -> Self {
        Self {
            item_height,
            buffer,
        }
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        validate_item_height(self.item_height)
    }
}

pub(crate) fn validate_item_height(item_height: f64) -> Result<(), RenderError> {
    if item_height.is_finite() && item_height > 0.0 {
        Ok(())
    } else {
        Err(RenderError::InvalidConfig(format!(
            "item height must be a positive number of pixels, got {}",
            item_height
        )))
    }
}

// == Visible Range ==
/// Inclusive index range `[start, end]`, never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Computes which items to render for a scroll position.
///
/// `start = floor(scroll_top / h) - buffer` and
/// `end = ceil((scroll_top + container_height) / h) + buffer`, both clamped
/// to `[0, len - 1]`. Returns `None` for an empty list.
pub fn compute_range(
    scroll_top: f64,
    container_height: f64,
    item_height: f64,
    len: usize,
    buffer: usize,
) -> Option<VisibleRange> {
    if len == 0 || item_height.is_nan() || item_height <= 0.0 {
        return None;
    }

    let last = len - 1;
    let top = scroll_top.max(0.0);
    let bottom = top + container_height.max(0.0);

    let first_visible = (top / item_height).floor() as usize;
    let last_visible = (bottom / item_height).ceil() as usize;

    let end = last_visible.saturating_add(buffer).min(last);
    let start = first_visible.saturating_sub(buffer).min(end);

    Some(VisibleRange { start, end })
}

// == Viewport State ==
/// Snapshot of the renderer's geometry after the last recompute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportState {
    pub scroll_top: f64,
    pub container_height: f64,
    pub item_height: f64,
    pub buffer: usize,
    pub total_height: f64,
    /// Offset applied to the rendered block, `start * item_height`
    pub window_offset: f64,
    pub range: Option<VisibleRange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_window() {
        let range = compute_range(1200.0, 600.0, 60.0, 1000, 5).unwrap();
        assert_eq!(range, VisibleRange { start: 15, end: 35 });
        assert_eq!(range.len(), 21);
    }

    #[test]
    fn test_top_of_list_clamps_start() {
        let range = compute_range(0.0, 600.0, 60.0, 1000, 5).unwrap();
        assert_eq!(range, VisibleRange { start: 0, end: 15 });
    }

    #[test]
    fn test_short_list_clamps_end() {
        let range = compute_range(0.0, 600.0, 60.0, 3, 5).unwrap();
        assert_eq!(range, VisibleRange { start: 0, end: 2 });
    }

    #[test]
    fn test_empty_list_has_no_range() {
        assert_eq!(compute_range(0.0, 600.0, 60.0, 0, 5), None);
    }

    #[test]
    fn test_scroll_past_end_keeps_start_le_end() {
        let range = compute_range(1_000_000.0, 600.0, 60.0, 10, 2).unwrap();
        assert_eq!(range, VisibleRange { start: 9, end: 9 });
    }

    #[test]
    fn test_negative_scroll_treated_as_zero() {
        let range = compute_range(-50.0, 120.0, 60.0, 100, 0).unwrap();
        assert_eq!(range, VisibleRange { start: 0, end: 2 });
    }

    #[test]
    fn test_fractional_heights() {
        let range = compute_range(45.5, 100.0, 33.3, 100, 1).unwrap();
        // floor(45.5 / 33.3) = 1, ceil(145.5 / 33.3) = 5
        assert_eq!(range, VisibleRange { start: 0, end: 6 });
    }

    #[test]
    fn test_config_validation() {
        assert!(ViewportConfig::default().validate().is_ok());
        assert!(ViewportConfig::new(0.0, 5).validate().is_err());
        assert!(ViewportConfig::new(f64::NAN, 5).validate().is_err());
        assert!(ViewportConfig::new(-1.0, 5).validate().is_err());
    }
}
