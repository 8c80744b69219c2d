// SPDX-License-Identifier: MPL-2.0

//! # Sampling Scheduler
//!
//! Periodically samples the CPU temperature without ever blocking the
//! window's event loop.
//!
//! ## Threading Model
//!
//! ```text
//! ┌──────────────────┐ tick ┌──────────────────┐ spawn_blocking ┌──────────────┐
//! │ tokio interval   │─────►│ sampling loop    │───────────────►│ blocking pool│
//! └──────────────────┘      │ (tokio worker)   │◄───────────────│ sample_once  │
//!                           └────────┬─────────┘  aggregator +  └──────────────┘
//!                                    │            reading
//!                       publish text │ request_redraw
//!                                    ▼
//!                           ┌──────────────────┐
//!                           │ UI event loop    │
//!                           └──────────────────┘
//! ```
//!
//! The aggregator is moved into each blocking job and handed back with the
//! reading, so at most one sample is ever in flight. Ticks that elapse while
//! a sample is running are skipped.
//!
//! ## Cancellation
//!
//! The token is checked before a sample is dispatched, while it runs and
//! right before its result is committed. An abandoned sample keeps running
//! on the blocking pool; its result is dropped together with the
//! aggregator, which closes the provider.

use std::time::Duration;

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::display::{DisplayWriter, RedrawRequester};
use super::hardware::HardwareProvider;
use super::temperature::SensorAggregator;

pub struct SamplingScheduler {
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl SamplingScheduler {
    /// Start sampling on `runtime` every `period`. The first sample is taken
    /// immediately.
    pub fn spawn<P, R>(
        runtime: &Handle,
        aggregator: SensorAggregator<P>,
        period: Duration,
        display: DisplayWriter,
        redraw: R,
    ) -> Self
    where
        P: HardwareProvider,
        R: RedrawRequester,
    {
        let cancel_token = CancellationToken::new();
        let handle = runtime.spawn(sampling_loop(
            aggregator,
            period,
            display,
            redraw,
            cancel_token.clone(),
        ));

        log::info!("Sampling every {} ms", period.as_millis());
        Self {
            cancel_token,
            handle: Some(handle),
        }
    }

    /// Stop issuing samples. Does not wait.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Stop and wait for the sampling loop to exit. Once this returns no
    /// further display writes or redraw requests happen.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                log::error!("Sampling loop failed to join: {}", e);
            }
        }
    }

    /// Stop sampling and tear down `runtime`, waiting at most `grace` for the
    /// sampling loop to exit. Returns `false` if the loop was still running.
    ///
    /// The runtime is shut down in the background, so a sensor read stuck on
    /// the blocking pool does not hold up the caller.
    pub fn shutdown_within(self, runtime: Runtime, grace: Duration) -> bool {
        let stopped = runtime.block_on(async move {
            tokio::time::timeout(grace, self.shutdown()).await.is_ok()
        });
        if !stopped {
            log::warn!("Sampling loop did not stop within {:?}", grace);
        }

        runtime.shutdown_background();
        stopped
    }
}

impl Drop for SamplingScheduler {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn sampling_loop<P, R>(
    mut aggregator: SensorAggregator<P>,
    period: Duration,
    display: DisplayWriter,
    redraw: R,
    cancel_token: CancellationToken,
) where
    P: HardwareProvider,
    R: RedrawRequester,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    'sampling: loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if cancel_token.is_cancelled() {
            break;
        }

        let job = tokio::task::spawn_blocking(move || {
            let result = aggregator.sample_once();
            (aggregator, result)
        });

        let (returned, result) = tokio::select! {
            _ = cancel_token.cancelled() => {
                log::debug!("Abandoning in-flight sample");
                break 'sampling;
            }
            joined = job => match joined {
                Ok(pair) => pair,
                Err(e) => {
                    log::error!("Sampling job panicked, sampling stopped: {}", e);
                    break 'sampling;
                }
            },
        };
        aggregator = returned;

        if cancel_token.is_cancelled() {
            log::debug!("Discarding sample completed after shutdown");
            break;
        }

        match result {
            Ok(reading) => {
                display.publish(reading.text());
                redraw.request_redraw();
            }
            Err(e) => log::warn!("Temperature sample failed, keeping last value: {}", e),
        }
    }

    log::info!("Sampling loop stopped");
}
