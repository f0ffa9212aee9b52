//! Shutdown signal handling
//!
//! SIGINT and SIGTERM start a grace period; supervision ends once it has
//! elapsed. The wrapped command normally gets the same signal from the
//! kernel through its process group, so nothing is forwarded unless asked.

use crate::{Error, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::future::Future;
use std::time::Duration;
use tokio::signal::unix::{signal, Signal as SignalStream, SignalKind};
use tokio::time::sleep;
use tracing::{info, warn};

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Listeners for the signals that request a shutdown.
pub struct ShutdownSignals {
    sigint: SignalStream,
    sigterm: SignalStream,
}

impl ShutdownSignals {
    /// Registers the handlers. From here on SIGINT and SIGTERM no longer
    /// terminate the process directly.
    pub fn install() -> Result<Self> {
        Ok(ShutdownSignals {
            sigint: signal(SignalKind::interrupt()).map_err(Error::Signal)?,
            sigterm: signal(SignalKind::terminate()).map_err(Error::Signal)?,
        })
    }

    /// Waits for the next SIGINT or SIGTERM.
    pub async fn recv(&mut self) -> Signal {
        tokio::select! {
            _ = self.sigint.recv() => Signal::SIGINT,
            _ = self.sigterm.recv() => Signal::SIGTERM,
        }
    }
}

/// Completes `grace` after `trigger` yields a signal.
///
/// When `forward_to` is set the signal is also sent to that process before
/// the grace period starts.
pub async fn grace_period<F>(trigger: F, grace: Duration, forward_to: Option<Pid>)
where
    F: Future<Output = Signal>,
{
    let received = trigger.await;
    info!("Received {}, shutdown after {} second...", received, grace.as_secs());

    if let Some(pid) = forward_to {
        match kill(pid, received) {
            Ok(()) => info!("Forwarded {} to pid {}", received, pid),
            Err(e) => warn!("Unable to forward {} to pid {}: {}", received, pid, e),
        }
    }

    sleep(grace).await;
}
