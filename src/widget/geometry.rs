// SPDX-License-Identifier: MPL-2.0

//! Overlay placement and the rounded input region.

use crate::config::Config;

/// Used when the compositor has not described any output yet.
pub const FALLBACK_DISPLAY_WIDTH: i32 = 1920;

/// Position and appearance of the overlay. Only `x` changes after
/// construction, through dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub corner_radius: u32,
    pub opacity: u8,
}

impl WindowGeometry {
    /// Horizontally centered at the top of a display `display_width` wide.
    pub fn centered_top(display_width: i32, config: &Config) -> Self {
        Self {
            x: display_width / 2 - (config.width / 2) as i32,
            y: 0,
            width: config.width,
            height: config.height,
            corner_radius: config.corner_radius,
            opacity: config.opacity,
        }
    }

    /// Range of left edges that keep the whole overlay on the display.
    pub fn left_bounds(&self, display_width: i32) -> (i32, i32) {
        (0, (display_width - self.width as i32).max(0))
    }
}

/// Axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Cover a rounded rectangle with horizontal bands.
///
/// Rows sharing the same corner inset are merged, so a 35 px tall overlay
/// with 7 px corners needs only a handful of rectangles.
pub fn rounded_region(width: u32, height: u32, radius: u32) -> Vec<RegionRect> {
    let radius = radius.min(width / 2).min(height / 2);
    let mut rects: Vec<RegionRect> = Vec::new();

    for row in 0..height {
        let inset = row_inset(row, height, radius);
        let span = width.saturating_sub(2 * inset) as i32;

        match rects.last_mut() {
            Some(last) if last.x == inset as i32 && last.width == span => last.height += 1,
            _ => rects.push(RegionRect {
                x: inset as i32,
                y: row as i32,
                width: span,
                height: 1,
            }),
        }
    }

    rects
}

/// Horizontal inset of `row` caused by the corner arcs.
fn row_inset(row: u32, height: u32, radius: u32) -> u32 {
    if radius == 0 {
        return 0;
    }

    let r = radius as f64;
    let center = row as f64 + 0.5;
    let dy = if row < radius {
        r - center
    } else if row >= height - radius {
        center - (height - radius) as f64
    } else {
        return 0;
    };

    let dx = (r * r - dy * dy).max(0.0).sqrt();
    (r - dx).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_at_top_of_display() {
        let geometry = WindowGeometry::centered_top(1920, &Config::default());
        assert_eq!(geometry.x, 850);
        assert_eq!(geometry.y, 0);
        assert_eq!((geometry.width, geometry.height), (220, 35));
        assert_eq!(geometry.opacity, 180);
    }

    #[test]
    fn left_bounds_keep_overlay_on_display() {
        let geometry = WindowGeometry::centered_top(1920, &Config::default());
        assert_eq!(geometry.left_bounds(1920), (0, 1700));
        assert_eq!(geometry.left_bounds(100), (0, 0));
    }

    #[test]
    fn zero_radius_is_one_rectangle() {
        assert_eq!(
            rounded_region(220, 35, 0),
            vec![RegionRect { x: 0, y: 0, width: 220, height: 35 }]
        );
    }

    #[test]
    fn rounded_region_covers_every_row_once() {
        let rects = rounded_region(220, 35, 7);

        let rows: i32 = rects.iter().map(|r| r.height).sum();
        assert_eq!(rows, 35);
        for pair in rects.windows(2) {
            assert_eq!(pair[0].y + pair[0].height, pair[1].y);
        }
    }

    #[test]
    fn corners_are_inset_and_middle_is_full() {
        let rects = rounded_region(220, 35, 7);

        let first = rects.first().unwrap();
        let last = rects.last().unwrap();
        assert!(first.x > 0);
        assert_eq!(first.x, last.x);
        assert_eq!(first.width, 220 - 2 * first.x);

        let middle = rects.iter().find(|r| r.y <= 17 && 17 < r.y + r.height).unwrap();
        assert_eq!((middle.x, middle.width), (0, 220));
    }

    #[test]
    fn region_is_vertically_symmetric() {
        let rects = rounded_region(220, 35, 7);
        let insets: Vec<i32> = rects
            .iter()
            .flat_map(|r| std::iter::repeat(r.x).take(r.height as usize))
            .collect();
        let reversed: Vec<i32> = insets.iter().rev().copied().collect();
        assert_eq!(insets, reversed);
    }

    #[test]
    fn oversized_radius_is_limited() {
        let rects = rounded_region(20, 10, 50);
        assert!(rects.iter().all(|r| r.width >= 0 && r.x <= 10));
        assert_eq!(rects.iter().map(|r| r.height).sum::<i32>(), 10);
    }
}
