// SPDX-License-Identifier: MPL-2.0

//! Built-in overlay defaults. Nothing is read from disk.

use std::time::Duration;

/// Linear RGB triple in the 0.0..=1.0 range used by cairo.
pub type Rgb = (f64, f64, f64);

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    /// Radius of the rounded corners in pixels
    pub corner_radius: u32,
    /// Whole-window opacity, 0 = invisible, 255 = opaque
    pub opacity: u8,
    pub sample_interval: Duration,
    /// Keep the overlay inside the primary display while dragging
    pub clamp_drag: bool,
    pub font: String,
    pub label: String,
    pub background: Rgb,
    pub foreground: Rgb,
    /// Top-left corner of the label text
    pub text_origin: (f64, f64),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 220,
            height: 35,
            corner_radius: 7,
            opacity: 180,
            sample_interval: Duration::from_millis(1000),
            clamp_drag: false,
            font: String::from("Roboto 10"),
            label: String::from("Average core temperature: "),
            background: (0.0, 0.0, 1.0),
            foreground: (1.0, 1.0, 1.0),
            text_origin: (10.0, 10.0),
        }
    }
}
