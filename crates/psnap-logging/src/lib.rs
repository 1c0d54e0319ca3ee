//! ---
//! psnap_section: "03-logging"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Structured logging context and macros."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Structured logging helpers shared by the paramsnap crates.

pub mod macros;

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Device label (variant name or host) the event belongs to.
    pub device: Option<&'a str>,
    /// Backplane port the event belongs to.
    pub port: Option<u8>,
    /// Parameter number the event refers to.
    pub parameter: Option<u32>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device label.
    pub fn with_device(mut self, device: &'a str) -> Self {
        self.device = Some(device);
        self
    }

    /// Attach a backplane port.
    pub fn with_port(mut self, port: u8) -> Self {
        self.port = Some(port);
        self
    }

    /// Attach a parameter number.
    pub fn with_parameter(mut self, parameter: u32) -> Self {
        self.parameter = Some(parameter);
        self
    }
}

/// Outcome of a collection stage used when emitting lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage finished with every parameter accounted for.
    Complete,
    /// The stage finished but some parameters were dropped or failed.
    Degraded,
}

impl StageOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            StageOutcome::Complete => "complete",
            StageOutcome::Degraded => "degraded",
        }
    }
}

/// Emit a standardized stage event (discovery finished, port collected, ...).
pub fn log_stage_event(
    context: Option<&LogContext>,
    stage: &str,
    message: &str,
    outcome: StageOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    let device = ctx.device.unwrap_or("");
    let port = ctx.port.map(i64::from).unwrap_or(-1);
    match outcome {
        StageOutcome::Complete => tracing::info!(
            stage,
            outcome = outcome.as_str(),
            device,
            port,
            message = %message
        ),
        StageOutcome::Degraded => tracing::warn!(
            stage,
            outcome = outcome.as_str(),
            device,
            port,
            message = %message
        ),
    }
}
