// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tracing subscriber setup shared by the binaries.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
    sync::Arc,
};

use is_terminal::IsTerminal as _;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{
        self,
        format::{FmtSpan, Format, Full},
        time::FormatTime,
        FormatFields, MakeWriter,
    },
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
    EnvFilter,
};

/// Output format of the log lines, selected with `RUST_LOG_FORMAT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(format: &str) -> Option<Self> {
        match format {
            "plain" => Some(Self::Plain),
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Logging settings read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub span_events: FmtSpan,
    pub format: LogFormat,
    /// Whether colors are allowed, before checking that stderr is a terminal.
    pub color: bool,
    /// Directory where a copy of the logs is appended, from `MY_ICO_LOG_DIR`.
    pub log_dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let format = match var("RUST_LOG_FORMAT") {
            None => LogFormat::Plain,
            Some(format) => LogFormat::parse(&format).unwrap_or_else(|| {
                eprintln!(
                    "Invalid RUST_LOG_FORMAT: `{format}`. Valid values are `json` or `pretty`."
                );
                LogFormat::Plain
            }),
        };
        Self {
            span_events: var("RUST_LOG_SPAN_EVENTS")
                .map_or(FmtSpan::NONE, |events| fmt_span_from_str(&events)),
            format,
            color: !var("NO_COLOR").is_some_and(|value| !value.is_empty()),
            log_dir: var("MY_ICO_LOG_DIR").map(PathBuf::from),
        }
    }

    /// Path of the log file for `log_name`, if a log directory is configured.
    pub fn log_file_path(&self, log_name: &str) -> Option<PathBuf> {
        let mut path = self.log_dir.as_ref()?.join(log_name);
        path.set_extension("log");
        Some(path)
    }
}

/// Initializes tracing for the binary `log_name`.
///
/// `RUST_LOG` sets the verbosity (INFO by default), `RUST_LOG_SPAN_EVENTS` the span
/// events, and `RUST_LOG_FORMAT` the output format. Logs go to stderr, and are also
/// appended to `<MY_ICO_LOG_DIR>/<log_name>.log` when that variable is set.
pub fn init(log_name: &str) {
    let settings = LogSettings::from_env();
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let stderr_layer = formatted_layer(
        settings.format,
        fmt::layer()
            .with_span_events(settings.span_events.clone())
            .with_writer(std::io::stderr)
            .with_ansi(settings.color && std::io::stderr().is_terminal()),
    );
    let file_layer = settings
        .log_file_path(log_name)
        .and_then(|path| open_log_file(&path))
        .map(|file| {
            formatted_layer(
                settings.format,
                fmt::layer()
                    .with_span_events(settings.span_events.clone())
                    .with_writer(Arc::new(file))
                    .with_ansi(false),
            )
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
}

fn open_log_file(path: &Path) -> Option<File> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .inspect_err(|error| eprintln!("Failed to open log file {path:?}: {error}"))
        .ok()
}

fn formatted_layer<S, N, W, T>(
    format: LogFormat,
    layer: fmt::Layer<S, N, Format<Full, T>, W>,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    N: for<'writer> FormatFields<'writer> + Send + Sync + 'static,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
    T: FormatTime + Send + Sync + 'static,
{
    match format {
        LogFormat::Plain => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
    }
}

fn fmt_span_from_str(events: &str) -> FmtSpan {
    events
        .split(',')
        .map(|event| match event.trim() {
            "new" => FmtSpan::NEW,
            "enter" => FmtSpan::ENTER,
            "exit" => FmtSpan::EXIT,
            "close" => FmtSpan::CLOSE,
            "active" => FmtSpan::ACTIVE,
            "full" => FmtSpan::FULL,
            _ => FmtSpan::NONE,
        })
        .fold(FmtSpan::NONE, |events, event| events | event)
}
