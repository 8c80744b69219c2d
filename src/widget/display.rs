// SPDX-License-Identifier: MPL-2.0

//! Hand-off of the displayed text from the sampling thread to the painter.
//!
//! The text travels through a single-slot `watch` channel. Writers replace
//! the whole value and readers clone the current `Arc` under one borrow, so
//! the painter never sees a partially written string.

use std::sync::Arc;

use tokio::sync::watch;

/// Create a display slot holding `initial`.
pub fn display_state(initial: &str) -> (DisplayWriter, DisplayReader) {
    let (tx, rx) = watch::channel(Arc::<str>::from(initial));
    (DisplayWriter { tx }, DisplayReader { rx })
}

/// Sampling side of the display slot.
#[derive(Debug)]
pub struct DisplayWriter {
    tx: watch::Sender<Arc<str>>,
}

impl DisplayWriter {
    /// Replace the displayed text.
    pub fn publish(&self, text: &str) {
        self.tx.send_replace(Arc::from(text));
    }
}

/// Painting side of the display slot.
#[derive(Debug, Clone)]
pub struct DisplayReader {
    rx: watch::Receiver<Arc<str>>,
}

impl DisplayReader {
    /// The most recently published text.
    pub fn snapshot(&self) -> Arc<str> {
        Arc::clone(&self.rx.borrow())
    }
}

/// Schedules a repaint of the overlay.
///
/// Called from the sampling task, never from the thread that owns the
/// window, so implementations must only enqueue work.
pub trait RedrawRequester: Send + 'static {
    fn request_redraw(&self);
}
