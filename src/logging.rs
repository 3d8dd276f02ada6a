//! Logging setup.
//!
//! Events go to stdout, optionally to a plain-text log file, and into an
//! in-memory ring of recent lines that the admin API exposes.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Number of lines kept by [`RecentLogs`] unless configured otherwise.
pub const MAX_RECENT_LOGS: usize = 1000;

/// Bounded buffer of the most recent formatted log lines.
#[derive(Clone)]
pub struct RecentLogs {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl RecentLogs {
    pub fn new() -> Self {
        Self::with_capacity(MAX_RECENT_LOGS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, line: String) {
        let Ok(mut lines) = self.lines.lock() else {
            return;
        };
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// The last `count` lines, oldest first, joined with newlines.
    pub fn recent(&self, count: usize) -> String {
        let Ok(lines) = self.lines.lock() else {
            return String::new();
        };
        let skip = lines.len().saturating_sub(count);
        lines
            .iter()
            .skip(skip)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecentLogs {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Subscriber> Layer<S> for RecentLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let format = format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        );
        let ts = OffsetDateTime::now_utc().format(format).unwrap_or_default();

        let mut line = format!("[{}] [{}] {}", ts, event.metadata().level(), visitor.message);
        if !visitor.fields.is_empty() {
            line.push(' ');
            line.push_str(&visitor.fields);
        }
        self.push(line);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field, format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.push_field(field, format_args!("{:?}", value));
        }
    }
}

impl LineVisitor {
    fn push_field(&mut self, field: &Field, value: std::fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }
}

/// Installs the global subscriber and returns the recent-lines buffer.
///
/// The level defaults to `info` and can be changed with `RUST_LOG`.
pub fn init(log_file: Option<&Path>) -> anyhow::Result<RecentLogs> {
    let recent = RecentLogs::new();

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_level(true))
        .with(file_layer)
        .with(recent.clone())
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(recent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_newest_lines() {
        let logs = RecentLogs::with_capacity(3);
        for i in 0..5 {
            logs.push(format!("line {}", i));
        }

        assert_eq!(logs.len(), 3);
        assert_eq!(logs.recent(10), "line 2\nline 3\nline 4");
        assert_eq!(logs.recent(1), "line 4");
    }

    #[test]
    fn captures_events_from_a_subscriber() {
        let logs = RecentLogs::new();
        let subscriber = tracing_subscriber::registry().with(logs.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(status = 200, "Response sent");
        });

        let line = logs.recent(1);
        assert!(line.contains("[INFO] Response sent"));
        assert!(line.contains("status=200"));
    }
}
