//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Collection events and the observers that consume them."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
//! Protocol code never logs directly. It reports [`CollectionEvent`]s to a
//! [`CollectionObserver`]; [`TracingObserver`] turns them into structured
//! log lines and [`RecordingObserver`] keeps them for assertions.

use std::fmt;

use psnap_logging::{psnap_debug, psnap_info, psnap_warn, LogContext};

/// How loudly an event should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
}

/// Something that happened while collecting, recoverable by definition.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    /// Batching plan for one addressing domain.
    BatchPlan {
        domain: &'static str,
        parameters: usize,
        batch_size: usize,
        scattered: bool,
    },
    /// The device flagged the requested parameter `number` inside a scattered
    /// response; `echoed` is the echo with the error flag removed.
    DeviceError {
        number: u32,
        echoed: u32,
        code: Option<u16>,
    },
    /// The response ended before the record of `number` was complete.
    Truncated {
        number: u32,
        available: usize,
        needed: usize,
    },
    /// The echoed number differs from the requested one.
    Mismatch { expected: u32, echoed: u32 },
    /// A whole scattered request failed; its numbers are read one by one.
    BatchFailed {
        first: u32,
        count: usize,
        error: String,
    },
    ReadFailed { number: u32, error: String },
    DecodeFailed { number: u32, error: String },
    TypeUnresolved { number: u32, error: String },
    DefaultUnavailable { number: u32, error: String },
    IdentityUnavailable { error: String },
    /// Verbose trace of one collected value.
    ParameterValue {
        number: u32,
        name: String,
        value: String,
    },
    SlotProbeFailed { slot: u8, error: String },
    SlotExcluded { slot: u8, reason: &'static str },
    PortUnmapped { slot: u8 },
    PortDiscovered { port: u8, product_name: String },
    /// The card in this port exposes no standard parameter object.
    PortSkipped { port: u8, label: &'static str },
    EnumerationFailed { number: u32, error: String },
    EnumerationFinished { last: u32, next: u32, count: usize },
}

impl CollectionEvent {
    pub fn severity(&self) -> Severity {
        use CollectionEvent::*;
        match self {
            DeviceError { .. }
            | Truncated { .. }
            | Mismatch { .. }
            | BatchFailed { .. }
            | ReadFailed { .. }
            | DecodeFailed { .. }
            | TypeUnresolved { .. }
            | IdentityUnavailable { .. }
            | SlotProbeFailed { .. }
            | PortUnmapped { .. }
            | EnumerationFailed { .. } => Severity::Warn,
            BatchPlan { .. }
            | ParameterValue { .. }
            | SlotExcluded { .. }
            | PortDiscovered { .. }
            | PortSkipped { .. } => Severity::Info,
            DefaultUnavailable { .. } | EnumerationFinished { .. } => Severity::Debug,
        }
    }

    /// Parameter number the event is about, if any.
    pub fn parameter(&self) -> Option<u32> {
        use CollectionEvent::*;
        match self {
            DeviceError { number, .. }
            | Truncated { number, .. }
            | ReadFailed { number, .. }
            | DecodeFailed { number, .. }
            | TypeUnresolved { number, .. }
            | DefaultUnavailable { number, .. }
            | ParameterValue { number, .. }
            | EnumerationFailed { number, .. } => Some(*number),
            Mismatch { expected, .. } => Some(*expected),
            BatchFailed { first, .. } => Some(*first),
            _ => None,
        }
    }
}

impl fmt::Display for CollectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CollectionEvent::*;
        match self {
            BatchPlan {
                domain,
                parameters,
                batch_size,
                scattered,
            } => {
                if *scattered {
                    write!(
                        f,
                        "{domain}: {parameters} parameters in scattered batches of {batch_size}"
                    )
                } else {
                    write!(f, "{domain}: {parameters} parameters read individually")
                }
            }
            DeviceError {
                number,
                echoed,
                code: Some(code),
            } => write!(
                f,
                "device error on parameter {number} (echoed {echoed}, code 0x{code:04X})"
            ),
            DeviceError {
                number,
                echoed,
                code: None,
            } => write!(f, "device error on parameter {number} (echoed {echoed})"),
            Truncated {
                number,
                available,
                needed,
            } => write!(
                f,
                "response truncated at parameter {number}: {available} of {needed} bytes"
            ),
            Mismatch { expected, echoed } => {
                write!(f, "requested parameter {expected}, device answered {echoed}")
            }
            BatchFailed {
                first,
                count,
                error,
            } => write!(
                f,
                "scattered read of {count} parameters from {first} failed ({error}); reading individually"
            ),
            ReadFailed { number, error } => write!(f, "read of parameter {number} failed: {error}"),
            DecodeFailed { number, error } => {
                write!(f, "parameter {number} kept raw, decode failed: {error}")
            }
            TypeUnresolved { number, error } => {
                write!(f, "type of parameter {number} unresolved: {error}")
            }
            DefaultUnavailable { number, error } => {
                write!(f, "default of parameter {number} unavailable: {error}")
            }
            IdentityUnavailable { error } => write!(f, "identity read failed: {error}"),
            ParameterValue {
                number,
                name,
                value,
            } => write!(f, "{number} {name} = {value}"),
            SlotProbeFailed { slot, error } => write!(f, "probe of slot {slot} failed: {error}"),
            SlotExcluded { slot, reason } => write!(f, "slot {slot} excluded: {reason}"),
            PortUnmapped { slot } => write!(f, "slot {slot} has no port offset"),
            PortDiscovered { port, product_name } => {
                write!(f, "port {port} holds '{product_name}'")
            }
            PortSkipped { port, label } => {
                write!(f, "port {port} ({label}) has no parameter object")
            }
            EnumerationFailed { number, error } => {
                write!(f, "enumeration stopped at parameter {number}: {error}")
            }
            EnumerationFinished { last, next, count } => write!(
                f,
                "enumerated {count} parameters, last {last} pointed to {next}"
            ),
        }
    }
}

pub trait CollectionObserver {
    /// `port` is set while a backplane port is being collected.
    fn on_event(&mut self, port: Option<u8>, event: &CollectionEvent);
}

impl<T: CollectionObserver + ?Sized> CollectionObserver for &mut T {
    fn on_event(&mut self, port: Option<u8>, event: &CollectionEvent) {
        (**self).on_event(port, event)
    }
}

/// Forwards events to `tracing` with device, port and parameter context.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    device: String,
}

impl TracingObserver {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    pub fn set_device(&mut self, device: impl Into<String>) {
        self.device = device.into();
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("device")
    }
}

impl CollectionObserver for TracingObserver {
    fn on_event(&mut self, port: Option<u8>, event: &CollectionEvent) {
        let mut ctx = LogContext::new().with_device(&self.device);
        if let Some(port) = port {
            ctx = ctx.with_port(port);
        }
        if let Some(number) = event.parameter() {
            ctx = ctx.with_parameter(number);
        }
        match event.severity() {
            Severity::Warn => psnap_warn!(context = ctx, "{}", event),
            Severity::Info => psnap_info!(context = ctx, "{}", event),
            Severity::Debug => psnap_debug!(context = ctx, "{}", event),
        }
    }
}

/// Keeps every event in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<(Option<u8>, CollectionEvent)>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<&CollectionEvent> {
        self.events
            .iter()
            .map(|(_, event)| event)
            .filter(|event| event.severity() == Severity::Warn)
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&CollectionEvent) -> bool) -> usize {
        self.events.iter().filter(|(_, event)| predicate(event)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl CollectionObserver for RecordingObserver {
    fn on_event(&mut self, port: Option<u8>, event: &CollectionEvent) {
        self.events.push((port, event.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_filters_warnings() {
        let mut observer = RecordingObserver::new();
        observer.on_event(
            None,
            &CollectionEvent::DeviceError {
                number: 3,
                echoed: 3,
                code: Some(2),
            },
        );
        observer.on_event(
            Some(4),
            &CollectionEvent::PortDiscovered {
                port: 4,
                product_name: "20-750-ENETR".into(),
            },
        );
        assert_eq!(observer.warnings().len(), 1);
        assert_eq!(observer.events[1].0, Some(4));
        assert_eq!(
            observer.count(|e| matches!(e, CollectionEvent::PortDiscovered { .. })),
            1
        );
    }

    #[test]
    fn tracing_observer_handles_every_severity() {
        let mut observer = TracingObserver::new("powerflex-755");
        observer.on_event(Some(5), &CollectionEvent::Mismatch { expected: 7, echoed: 8 });
        observer.on_event(None, &CollectionEvent::SlotExcluded { slot: 2, reason: "operator panel" });
        observer.on_event(
            None,
            &CollectionEvent::DefaultUnavailable {
                number: 9,
                error: "timeout".into(),
            },
        );
    }

    #[test]
    fn device_error_message_names_code() {
        let event = CollectionEvent::DeviceError {
            number: 41,
            echoed: 41,
            code: Some(0x0B),
        };
        assert_eq!(
            event.to_string(),
            "device error on parameter 41 (echoed 41, code 0x000B)"
        );
        assert_eq!(event.parameter(), Some(41));
    }
}
