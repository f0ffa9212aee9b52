use crate::metadata::{MetadataApi, Task};
use crate::Result;
use regex_lite::Regex;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Containers whose name matches this are run by ECS itself and never stop on their own.
pub const DEFAULT_IGNORE_PATTERN: &str = "^~internal~.*";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// True when every container not matched by `ignore` has stopped.
/// A task without relevant containers counts as stopped.
pub fn is_fully_stopped(task: &Task, ignore: &Regex) -> bool {
    task.containers
        .iter()
        .filter(|c| !ignore.is_match(&c.name))
        .all(|c| c.is_stopped())
}

/// Polls the task metadata until all relevant containers have stopped.
///
/// Returns `Ok(())` on the first tick that sees a fully stopped task; no
/// further requests are made after that. Any metadata error is returned
/// as-is.
pub async fn watch_task(api: &dyn MetadataApi, ignore: &Regex, period: Duration) -> Result<()> {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let task = api.get_task().await?;
        if is_fully_stopped(&task, ignore) {
            info!("All containers in the task have stopped");
            return Ok(());
        }

        let running = task
            .containers
            .iter()
            .filter(|c| !ignore.is_match(&c.name) && !c.is_stopped())
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>();
        debug!("Still waiting on containers: {:?}", running);
    }
}
