// SPDX-License-Identifier: MPL-2.0

use smithay_client_toolkit::reexports::calloop;
use thiserror::Error;
use wayland_client::globals::{BindError, GlobalError};
use wayland_client::{ConnectError, DispatchError};

/// Fatal start-up failures of the overlay process.
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Failed to connect to the Wayland compositor: {0}")]
    Connect(#[from] ConnectError),

    #[error("Failed to read the Wayland registry: {0}")]
    Registry(#[from] GlobalError),

    /// A required global (compositor, shm, layer shell) is not advertised.
    #[error("Required Wayland global unavailable: {0}")]
    Bind(#[from] BindError),

    #[error("Wayland dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Event loop failure: {0}")]
    EventLoop(#[from] calloop::Error),

    #[error("Failed to start the sampling runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Hardware provider failures. Never fatal: a failed sample keeps the
/// previously displayed value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("Hardware provider is not open")]
    NotOpen,

    #[error("Hardware provider refresh failed: {0}")]
    Refresh(String),
}

/// Paint failures. Logged by the caller, the next redraw tries again.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cairo error: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("Cairo surface data unavailable: {0}")]
    SurfaceData(#[from] cairo::BorrowError),

    #[error("Canvas is {actual} bytes, expected at least {expected}")]
    CanvasSize { expected: usize, actual: usize },

    #[error("Shared memory buffer unavailable: {0}")]
    Buffer(String),
}
