//! Logging and observability infrastructure for platform-engine
//!
//! Structured logging with `tracing`, per-capability spans, timing
//! collection for verbose output, and redaction of secret-looking values.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Matches `NAME=value` pairs whose name looks sensitive.
static SECRET_ASSIGNMENT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)\b([A-Z0-9_]*(PASSWORD|SECRET|TOKEN|KEY)[A-Z0-9_]*)=([^\s,;]+)").ok()
});

/// Initialize tracing subscriber for structured logging
///
/// `RUST_LOG` wins when set. Otherwise verbose mode enables debug output
/// for the engine crates and the default shows warnings only. Logs go to
/// stderr so that JSON on stdout stays machine-readable.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new(
                    "platform_engine=debug,platform_orchestrator=debug,platform_capabilities=debug,platform_capability_api=debug,platform_config=debug,info",
                )
            } else {
                EnvFilter::try_new("warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create a span for one capability handler invocation
pub fn capability_span(service: &str, capability: &str, phase: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "capability",
        service = %service,
        capability = %capability,
        phase = %phase,
    )
}

/// Log capability start with structured fields
pub fn log_capability_start(service: &str, capability: &str, phase: &str) {
    info!(
        service = %service,
        capability = %capability,
        phase = %phase,
        "Provisioning capability"
    );
}

/// Log capability completion with duration
pub fn log_capability_complete(service: &str, capability: &str, duration_ms: u128) {
    info!(
        service = %service,
        capability = %capability,
        duration_ms = %duration_ms,
        "Capability provisioned"
    );
}

/// Log capability failure. The message is sanitized before it is emitted.
pub fn log_capability_error(service: &str, capability: &str, error: &str, duration_ms: u128) {
    error!(
        service = %service,
        capability = %capability,
        duration_ms = %duration_ms,
        error = %sanitize(error),
        "Capability failed"
    );
}

/// Replace the value of any sensitive-looking `NAME=value` pair with `[REDACTED]`.
#[must_use]
pub fn sanitize(content: &str) -> String {
    match SECRET_ASSIGNMENT.as_ref() {
        Some(re) => re.replace_all(content, "$1=[REDACTED]").into_owned(),
        None => "[REDACTION_ERROR]".to_string(),
    }
}

/// Timing information for one operation
#[derive(Debug, Clone)]
pub struct TimingInfo {
    pub operation: String,
    pub duration: Duration,
}

/// Collects operation timings for the verbose run summary
#[derive(Debug)]
pub struct Logger {
    verbose: bool,
    start_time: Instant,
    in_flight: HashMap<String, Instant>,
    timings: Vec<TimingInfo>,
}

impl Logger {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            start_time: Instant::now(),
            in_flight: HashMap::new(),
            timings: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn start_timing(&mut self, operation: &str) {
        self.in_flight.insert(operation.to_string(), Instant::now());
    }

    /// Stop timing `operation` and return the elapsed time, if it was started.
    pub fn end_timing(&mut self, operation: &str) -> Option<Duration> {
        let started = self.in_flight.remove(operation)?;
        let duration = started.elapsed();
        self.timings.push(TimingInfo {
            operation: operation.to_string(),
            duration,
        });
        Some(duration)
    }

    /// Timings in completion order
    #[must_use]
    pub fn get_timing_summary(&self) -> &[TimingInfo] {
        &self.timings
    }

    #[must_use]
    pub fn total_elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Print the timing summary to stderr when verbose.
    pub fn print_timing_summary(&self) {
        if !self.verbose {
            return;
        }
        eprintln!("Timing summary:");
        for timing in &self.timings {
            eprintln!(
                "  {:<24} {:>8.3}ms",
                timing.operation,
                timing.duration.as_secs_f64() * 1000.0
            );
        }
        eprintln!(
            "  {:<24} {:>8.3}ms",
            "total",
            self.total_elapsed().as_secs_f64() * 1000.0
        );
    }
}
