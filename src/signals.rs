// SPDX-License-Identifier: MPL-2.0

//! SIGINT and SIGTERM are turned into an ordinary close request, so an
//! interrupted overlay still stops sampling and closes the sensor provider.

use std::io;

use tokio::signal::unix::{signal, Signal, SignalKind};

pub struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl ShutdownSignals {
    /// Take over SIGINT and SIGTERM. From here on they no longer kill the
    /// process. Must run inside a tokio runtime with its IO driver enabled.
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the next termination signal and return its name.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn terminate_is_delivered_as_a_request() {
        let mut signals = ShutdownSignals::install().unwrap();

        assert_eq!(unsafe { libc::raise(libc::SIGTERM) }, 0);

        let name = tokio::time::timeout(Duration::from_secs(5), signals.recv())
            .await
            .expect("signal delivered");
        assert_eq!(name, "SIGTERM");
    }
}
