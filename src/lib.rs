// SPDX-License-Identifier: MPL-2.0

//! Temperature overlay: sensor sampling, drag handling and painting.
//!
//! The Wayland glue lives in the binary; everything here is independent of
//! the compositor connection so it can be exercised in tests.

pub mod config;
pub mod error;
pub mod signals;
pub mod widget;

pub use config::Config;
pub use error::{OverlayError, RenderError, SensorError};
