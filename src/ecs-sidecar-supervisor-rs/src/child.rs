use crate::{Error, Result};
use nix::unistd::Pid;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Starts `command[0]` with the remaining elements as arguments.
///
/// The child shares our stdout and stderr; its stdin is `/dev/null`.
/// Dropping the handle kills it.
pub fn spawn_child(command: &[String]) -> Result<Child> {
    let (program, args) = command.split_first().ok_or(Error::EmptyCommand)?;

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| Error::Launch {
            program: program.clone(),
            source,
        })?;

    info!("Started '{}' (pid {})", program, child.id().unwrap_or_default());
    Ok(child)
}

pub fn child_pid(child: &Child) -> Option<Pid> {
    child.id().and_then(|id| i32::try_from(id).ok()).map(Pid::from_raw)
}

/// Maps a child's exit status to the code we exit with ourselves.
/// Signal deaths follow the shell convention of 128 + signal number.
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

/// Kills the child if it is still running and reaps it.
pub async fn terminate(child: &mut Child) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!("Child already exited with {}", status);
            return;
        }
        Ok(None) => {}
        Err(e) => warn!("Unable to query child status: {}", e),
    }

    if let Err(e) = child.start_kill() {
        warn!("Unable to kill child: {}", e);
        return;
    }

    match child.wait().await {
        Ok(status) => info!("Child terminated with {}", status),
        Err(e) => warn!("Unable to reap child: {}", e),
    }
}
