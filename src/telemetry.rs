//! Failure reporting.
//!
//! Reports are fire-and-forget: implementations must never fail or panic
//! back into the caller.

use std::fmt;

use crate::dialect::Platform;

/// Severity of a free-form report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Where a report came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    pub operation: &'static str,
    pub platform: Option<Platform>,
    /// Extra key/value details, in insertion order.
    pub extra: Vec<(&'static str, String)>,
}

impl ReportContext {
    pub fn new(operation: &'static str, platform: Option<Platform>) -> Self {
        Self {
            operation,
            platform,
            extra: Vec::new(),
        }
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.extra.push((key, value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ReportContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op={}", self.operation)?;
        if let Some(platform) = self.platform {
            write!(f, " platform={platform}")?;
        }
        for (key, value) in &self.extra {
            write!(f, " {key}={value:?}")?;
        }
        Ok(())
    }
}

/// The telemetry collaborator.
pub trait Telemetry {
    fn report_error(&mut self, error: &crate::Error, context: &ReportContext);
    fn report_message(&mut self, message: &str, severity: Severity, context: &ReportContext);
}

/// Writes reports through the `log` facade under the `telemetry` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn report_error(&mut self, error: &crate::Error, context: &ReportContext) {
        log::error!(target: "telemetry", "{error} ({context})");
    }

    fn report_message(&mut self, message: &str, severity: Severity, context: &ReportContext) {
        match severity {
            Severity::Info => log::info!(target: "telemetry", "{message} ({context})"),
            Severity::Warning => log::warn!(target: "telemetry", "{message} ({context})"),
            Severity::Error => log::error!(target: "telemetry", "{message} ({context})"),
        }
    }
}

/// Drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn report_error(&mut self, _error: &crate::Error, _context: &ReportContext) {}
    fn report_message(&mut self, _message: &str, _severity: Severity, _context: &ReportContext) {}
}

/// Keeps every report in memory. Handy for hosts that batch reports and for
/// tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingTelemetry {
    pub reports: Vec<Report>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub message: String,
    pub context: ReportContext,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter().filter(|r| r.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Report> {
        self.reports
            .iter()
            .filter(|r| r.severity == Severity::Warning)
    }
}

impl Telemetry for RecordingTelemetry {
    fn report_error(&mut self, error: &crate::Error, context: &ReportContext) {
        self.reports.push(Report {
            severity: Severity::Error,
            message: error.to_string(),
            context: context.clone(),
        });
    }

    fn report_message(&mut self, message: &str, severity: Severity, context: &ReportContext) {
        self.reports.push(Report {
            severity,
            message: message.to_string(),
            context: context.clone(),
        });
    }
}

impl<T: Telemetry + ?Sized> Telemetry for Box<T> {
    fn report_error(&mut self, error: &crate::Error, context: &ReportContext) {
        (**self).report_error(error, context);
    }

    fn report_message(&mut self, message: &str, severity: Severity, context: &ReportContext) {
        (**self).report_message(message, severity, context);
    }
}
