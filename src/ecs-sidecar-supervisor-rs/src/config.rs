use crate::metadata::HttpMetadataClient;
use crate::poller::{DEFAULT_IGNORE_PATTERN, DEFAULT_POLL_INTERVAL};
use crate::signals::DEFAULT_GRACE_PERIOD;
use crate::Result;
use clap::Parser;
use regex_lite::Regex;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "ecs-sidecar-supervisor-rs",
    version,
    about = "Run a sidecar command until the rest of the ECS task has stopped"
)]
pub struct Cli {
    /// Base URI of the ECS container metadata endpoint
    #[arg(long = "metadata-uri", env = "ECS_CONTAINER_METADATA_URI")]
    pub metadata_uri: String,

    /// Containers whose name matches this pattern are not waited on
    #[arg(long = "ignore-pattern", default_value = DEFAULT_IGNORE_PATTERN, value_parser = parse_pattern)]
    pub ignore_pattern: Regex,

    /// How often the task metadata is polled
    #[arg(long = "poll-interval-ms", default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Delay between a SIGINT/SIGTERM and shutting down
    #[arg(long = "grace-period-secs", default_value_t = 5)]
    pub grace_period_secs: u64,

    /// Timeout for a single metadata request
    #[arg(long = "metadata-timeout-secs", default_value_t = 5)]
    pub metadata_timeout_secs: u64,

    /// Send received SIGINT/SIGTERM on to the command
    #[arg(long = "forward-signals")]
    pub forward_signals: bool,

    /// Command to run, followed by its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

fn parse_pattern(pattern: &str) -> std::result::Result<Regex, regex_lite::Error> {
    Regex::new(pattern)
}

/// Validated supervision settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub command: Vec<String>,
    pub ignore: Regex,
    pub poll_interval: Duration,
    pub grace_period: Duration,
    pub forward_signals: bool,
}

impl Settings {
    pub fn new(command: Vec<String>) -> Result<Self> {
        Ok(Settings {
            command,
            ignore: Regex::new(DEFAULT_IGNORE_PATTERN)?,
            poll_interval: DEFAULT_POLL_INTERVAL,
            grace_period: DEFAULT_GRACE_PERIOD,
            forward_signals: false,
        })
    }

    pub fn from_cli(cli: &Cli) -> Self {
        Settings {
            command: cli.command.clone(),
            ignore: cli.ignore_pattern.clone(),
            poll_interval: Duration::from_millis(cli.poll_interval_ms.max(1)),
            grace_period: Duration::from_secs(cli.grace_period_secs),
            forward_signals: cli.forward_signals,
        }
    }
}

impl Cli {
    pub fn metadata_client(&self) -> Result<HttpMetadataClient> {
        HttpMetadataClient::new(&self.metadata_uri, Duration::from_secs(self.metadata_timeout_secs))
    }
}
