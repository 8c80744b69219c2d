// SPDX-License-Identifier: MPL-2.0

//! Widget module organization

pub mod display;
pub mod drag;
pub mod geometry;
pub mod hardware;
pub mod render;
pub mod sampler;
pub mod temperature;

pub use display::{display_state, DisplayReader, DisplayWriter, RedrawRequester};
pub use drag::{DragController, PointerButton};
pub use geometry::{rounded_region, WindowGeometry};
pub use hardware::{HardwareProvider, SysinfoProvider};
pub use render::PaintStyle;
pub use sampler::SamplingScheduler;
pub use temperature::{AggregateReading, SensorAggregator};
