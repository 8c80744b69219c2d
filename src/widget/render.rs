// SPDX-License-Identifier: MPL-2.0

//! Painting of the overlay.
//!
//! The overlay is a rounded, translucent pill:
//!
//! ```text
//! ╭──────────────────────────────────────╮
//! │ Average core temperature: 42°C       │
//! ╰──────────────────────────────────────╯
//! ```
//!
//! Everything is drawn into an offscreen group and composited once with the
//! window opacity, so text and background fade together. Pixels outside the
//! rounded rectangle stay fully transparent.

use std::f64::consts::PI;

use crate::config::{Config, Rgb};
use crate::error::RenderError;

/// Everything the painter needs besides the value text.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintStyle {
    pub label: String,
    pub font: String,
    pub background: Rgb,
    pub foreground: Rgb,
    pub text_origin: (f64, f64),
    pub corner_radius: f64,
    pub opacity: u8,
}

impl From<&Config> for PaintStyle {
    fn from(config: &Config) -> Self {
        Self {
            label: config.label.clone(),
            font: config.font.clone(),
            background: config.background,
            foreground: config.foreground,
            text_origin: config.text_origin,
            corner_radius: config.corner_radius as f64,
            opacity: config.opacity,
        }
    }
}

/// Paint the label and `value` onto a `width` x `height` area of `cr`.
pub fn paint(
    cr: &cairo::Context,
    style: &PaintStyle,
    width: f64,
    height: f64,
    value: &str,
) -> Result<(), cairo::Error> {
    // Clear to fully transparent
    cr.save()?;
    cr.set_operator(cairo::Operator::Source);
    cr.set_source_rgba(0.0, 0.0, 0.0, 0.0);
    cr.paint()?;
    cr.restore()?;

    cr.save()?;
    rounded_rectangle(cr, 0.0, 0.0, width, height, style.corner_radius);
    cr.clip();

    cr.push_group();

    let (r, g, b) = style.background;
    cr.set_source_rgb(r, g, b);
    cr.paint()?;

    let layout = pangocairo::functions::create_layout(cr);
    let font_desc = pango::FontDescription::from_string(&style.font);
    layout.set_font_description(Some(&font_desc));

    let (r, g, b) = style.foreground;
    cr.set_source_rgb(r, g, b);

    let (x, y) = style.text_origin;
    layout.set_text(&style.label);
    cr.move_to(x, y);
    pangocairo::functions::show_layout(cr, &layout);

    // Value sits right after the label on the same baseline
    let (label_width, _) = layout.pixel_size();
    layout.set_text(value);
    cr.move_to(x + label_width as f64, y);
    pangocairo::functions::show_layout(cr, &layout);

    cr.pop_group_to_source()?;
    cr.paint_with_alpha(style.opacity as f64 / 255.0)?;
    cr.restore()?;

    Ok(())
}

/// Paint into an ARGB8888 canvas, e.g. a Wayland shm buffer.
pub fn paint_canvas(
    canvas: &mut [u8],
    width: i32,
    height: i32,
    style: &PaintStyle,
    value: &str,
) -> Result<(), RenderError> {
    let row_bytes = width as usize * 4;
    let expected = row_bytes * height as usize;
    if canvas.len() < expected {
        return Err(RenderError::CanvasSize {
            expected,
            actual: canvas.len(),
        });
    }

    let mut surface = cairo::ImageSurface::create(cairo::Format::ARgb32, width, height)?;
    {
        let cr = cairo::Context::new(&surface)?;
        paint(&cr, style, width as f64, height as f64, value)?;
    }
    surface.flush();

    let stride = surface.stride() as usize;
    let data = surface.data()?;
    for (row, dst) in canvas[..expected].chunks_exact_mut(row_bytes).enumerate() {
        let src = &data[row * stride..row * stride + row_bytes];
        dst.copy_from_slice(src);
    }

    Ok(())
}

fn rounded_rectangle(cr: &cairo::Context, x: f64, y: f64, width: f64, height: f64, radius: f64) {
    let radius = radius.min(width / 2.0).min(height / 2.0);

    cr.new_sub_path();
    cr.arc(x + width - radius, y + radius, radius, -PI / 2.0, 0.0);
    cr.arc(x + width - radius, y + height - radius, radius, 0.0, PI / 2.0);
    cr.arc(x + radius, y + height - radius, radius, PI / 2.0, PI);
    cr.arc(x + radius, y + radius, radius, PI, 3.0 * PI / 2.0);
    cr.close_path();
}
