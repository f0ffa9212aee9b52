use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Writes each event as `<prefix>: <message> <fields>`, no timestamp or level.
#[derive(Debug, Clone, Copy)]
pub struct Prefixed {
    prefix: &'static str,
}

impl Prefixed {
    pub fn new(prefix: &'static str) -> Self {
        Prefixed { prefix }
    }
}

impl<S, N> FormatEvent<S, N> for Prefixed
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        write!(writer, "{}: ", self.prefix)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Level filter from `RUST_LOG`, `info` when unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Builds the subscriber used by the binary, writing to `writer`.
pub fn subscriber<W>(prefix: &'static str, filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .event_format(Prefixed::new(prefix))
        .with_env_filter(filter)
        .finish()
}

/// Installs the global subscriber logging to stderr.
pub fn init(prefix: &'static str) {
    if tracing::subscriber::set_global_default(subscriber(prefix, env_filter(), std::io::stderr)).is_err() {
        eprintln!("{}: logger already initialized", prefix);
    }
}
