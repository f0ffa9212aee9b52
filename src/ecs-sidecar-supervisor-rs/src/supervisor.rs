use crate::child::{child_pid, exit_code, spawn_child, terminate};
use crate::config::Settings;
use crate::metadata::MetadataApi;
use crate::poller::watch_task;
use crate::signals::{grace_period, ShutdownSignals};
use crate::{Error, Result};
use nix::sys::signal::Signal;
use std::future::Future;
use std::process::ExitStatus;
use std::sync::Arc;
use tracing::info;

/// The event that ended supervision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The wrapped command exited on its own.
    ChildExited(ExitStatus),
    /// Every relevant container in the task reached STOPPED.
    TaskStopped,
    /// A termination signal arrived and its grace period elapsed.
    ShutdownRequested,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::ChildExited(status) => exit_code(*status),
            Outcome::TaskStopped | Outcome::ShutdownRequested => 0,
        }
    }
}

/// Runs the command in `settings` until the first of: the command exits,
/// the task is fully stopped, or `shutdown` fires and the grace period
/// passes.
///
/// The command is started before anything else; if that fails nothing is
/// polled. Whatever ends supervision, the other activities are dropped
/// before this returns, and a still-running child is killed and reaped.
pub async fn supervise<F>(api: Arc<dyn MetadataApi>, settings: &Settings, shutdown: F) -> Result<Outcome>
where
    F: Future<Output = Signal>,
{
    let mut child = spawn_child(&settings.command)?;
    let forward_to = if settings.forward_signals {
        child_pid(&child)
    } else {
        None
    };

    let result = tokio::select! {
        status = child.wait() => status.map(Outcome::ChildExited).map_err(Error::Wait),
        stopped = watch_task(api.as_ref(), &settings.ignore, settings.poll_interval) => {
            stopped.map(|()| Outcome::TaskStopped)
        }
        () = grace_period(shutdown, settings.grace_period, forward_to) => Ok(Outcome::ShutdownRequested),
    };

    match &result {
        Ok(Outcome::ChildExited(status)) => info!("Command exited with {}", status),
        Ok(outcome) => {
            info!("Stopping command: {:?}", outcome);
            terminate(&mut child).await;
        }
        Err(_) => terminate(&mut child).await,
    }

    result
}

/// Supervises with the process' own SIGINT/SIGTERM as the shutdown trigger.
pub async fn run_main(api: Arc<dyn MetadataApi>, settings: Settings) -> Result<Outcome> {
    let mut signals = ShutdownSignals::install()?;
    supervise(api, &settings, async move { signals.recv().await }).await
}
