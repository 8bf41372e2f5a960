//! Subscriber installation.
//!
//! One event format is rendered twice: colored for the terminal, and as
//! timestamped plain text in the per-command log file.  Events raised while
//! a config is being synced carry that config's name in the file.
use std::fmt;
use std::io::IsTerminal as _;
use std::sync::Mutex;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime as _;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

use super::file::{UtcClock, open_log_file};

/// Target used for stage headers.
pub(super) const STAGE_TARGET: &str = "thunderize::stage";
/// Target used for dry-run messages.
pub(super) const DRY_RUN_TARGET: &str = "thunderize::dry_run";

/// Span the sync engine enters around each per-config operation.  Its
/// `name` field labels file log lines.
const CONFIG_SPAN: &str = "config";

/// `EnvFilter` directives for the console, e.g. `THUNDERIZE_LOG=debug`.
/// Takes precedence over `--verbose`.
const FILTER_ENV: &str = "THUNDERIZE_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Stage,
    DryRun,
    Plain,
}

impl Line {
    fn of(target: &str) -> Self {
        match target {
            STAGE_TARGET => Self::Stage,
            DRY_RUN_TARGET => Self::DryRun,
            _ => Self::Plain,
        }
    }
}

#[derive(Default)]
struct Message(String);

impl tracing::field::Visit for Message {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Name of the innermost enclosing config span, if any.
fn config_name<S, N>(ctx: &FmtContext<'_, S, N>) -> Option<String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let span = ctx
        .event_scope()?
        .find(|span| span.name() == CONFIG_SPAN)?;
    let extensions = span.extensions();
    let fields = extensions.get::<FormattedFields<N>>()?;
    let name = fields.fields.strip_prefix("name=")?;
    Some(name.to_string())
}

#[derive(Debug, Clone, Copy)]
enum LineFormat {
    Console,
    File,
}

fn paint(ansi: bool, code: &str, text: &str) -> String {
    if ansi {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = *event.metadata().level();
        let line = Line::of(event.metadata().target());
        let mut message = Message::default();
        event.record(&mut message);
        let msg = message.0;

        match self {
            Self::File => {
                UtcClock.format_time(&mut writer)?;
                let tag = match (line, level) {
                    (Line::Stage, _) => "==>",
                    (Line::DryRun, _) => "dry-run",
                    (_, Level::ERROR) => "error",
                    (_, Level::WARN) => "warn",
                    (_, Level::DEBUG | Level::TRACE) => "debug",
                    _ => "info",
                };
                match config_name(ctx) {
                    Some(name) => writeln!(writer, " {tag:<7} [{name}] {msg}"),
                    None => writeln!(writer, " {tag:<7} {msg}"),
                }
            }
            Self::Console => {
                let ansi = writer.has_ansi_escapes();
                let rendered = match (line, level) {
                    (_, Level::ERROR) => format!("{}: {msg}", paint(ansi, "1;31", "error")),
                    (_, Level::WARN) => format!("{}: {msg}", paint(ansi, "1;33", "warning")),
                    (Line::Stage, _) => {
                        format!("{} {}", paint(ansi, "1;35", "::"), paint(ansi, "1", &msg))
                    }
                    (Line::DryRun, _) => format!("   {} {msg}", paint(ansi, "36", "(dry run)")),
                    (Line::Plain, Level::INFO) => format!("   {msg}"),
                    (Line::Plain, _) => format!("   {}", paint(ansi, "2", &msg)),
                };
                writeln!(writer, "{rendered}")
            }
        }
    }
}

/// Install the global [`tracing`] subscriber for `command`.
///
/// Warnings and errors go to stderr, everything else to stdout, colored
/// only when stdout is a terminal.  The console shows `info` and above
/// (`debug` with `verbose`) unless `THUNDERIZE_LOG` says otherwise.  The log
/// file always receives `debug` and above.  Call once at startup.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_filter = EnvFilter::try_from_env(FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let console = tracing_subscriber::fmt::layer()
        .event_format(LineFormat::Console)
        .with_ansi(std::io::stdout().is_terminal())
        .with_writer(
            std::io::stderr
                .with_max_level(Level::WARN)
                .and(std::io::stdout.with_min_level(Level::INFO)),
        )
        .with_filter(console_filter);

    let file = open_log_file(command).map(|file| {
        tracing_subscriber::fmt::layer()
            .event_format(LineFormat::File)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(LevelFilter::DEBUG)
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();
}
