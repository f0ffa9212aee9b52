//! ECS sidecar supervisor
//!
//! Runs a wrapped command next to the other containers of an ECS task and
//! exits once every sibling container has stopped, the command exits, or a
//! termination signal's grace period runs out.

pub mod child;
pub mod config;
pub mod logger;
pub mod metadata;
pub mod poller;
pub mod signals;
pub mod supervisor;

pub use config::{Cli, Settings};
pub use metadata::{Container, HttpMetadataClient, MetadataApi, Task};
pub use supervisor::{run_main, supervise, Outcome};

/// Prefix for every log line written by the supervisor.
pub const APP: &str = "ecs-sidecar-supervisor";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no command to run")]
    EmptyCommand,
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("task metadata request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unable to decode task metadata: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
    #[error("unable to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
    #[error("unable to wait on child process: {0}")]
    Wait(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
