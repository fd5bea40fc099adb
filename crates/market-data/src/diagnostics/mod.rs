//! Diagnostic events for data quality problems.
//!
//! Soft failures (a single missing point inside a valid series) never fail an
//! operation; they are reported here instead. Hard failures caused by a
//! missing array are reported here as well before the error is returned.
//!
//! The crate does not deliver events anywhere itself. Plug in a
//! [`DiagnosticSink`] to forward them to an error tracker; the default
//! [`LogSink`] writes them to the `log` facade.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use log::{error, warn};

/// Event severity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// A point was skipped; the operation still succeeded.
    Warning,
    /// The operation failed.
    Error,
}

/// What the event is about.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Subject {
    Symbol(String),
    Pair { from: String, to: String },
}

impl Subject {
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self::Symbol(symbol.into())
    }

    pub fn pair(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Pair {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(symbol) => f.write_str(symbol),
            Self::Pair { from, to } => write!(f, "{}/{}", from, to),
        }
    }
}

/// Context attached to every event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiagnosticContext {
    pub subject: Subject,
    /// Date of the offending point, when known
    pub date: Option<NaiveDate>,
}

/// A classified data quality event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiagnosticEvent {
    pub severity: Severity,
    pub message: String,
    pub context: DiagnosticContext,
}

impl DiagnosticEvent {
    pub fn warning(message: impl Into<String>, subject: Subject, date: Option<NaiveDate>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            context: DiagnosticContext { subject, date },
        }
    }

    pub fn error(message: impl Into<String>, subject: Subject, date: Option<NaiveDate>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            context: DiagnosticContext { subject, date },
        }
    }
}

/// Receiver for diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Arc<T> {
    fn record(&self, event: DiagnosticEvent) {
        (**self).record(event)
    }
}

/// Writes events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, event: DiagnosticEvent) {
        let date = event
            .context
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());

        match event.severity {
            Severity::Warning => warn!(
                "{} (subject: {}, date: {})",
                event.message, event.context.subject, date
            ),
            Severity::Error => error!(
                "{} (subject: {}, date: {})",
                event.message, event.context.subject, date
            ),
        }
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
