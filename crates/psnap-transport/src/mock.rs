//! ---
//! psnap_section: "02-transport-boundary"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Scripted in-memory transport for tests."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use std::fmt;

use bytes::Bytes;

use crate::{ExplicitMessaging, ExplicitRequest, Result};

type Handler = Box<dyn FnMut(&ExplicitRequest) -> Result<Bytes> + Send>;

/// In-memory transport that answers every request through a closure and keeps
/// a log of what was sent.
pub struct MockTransport {
    handler: Handler,
    requests: Vec<ExplicitRequest>,
}

impl MockTransport {
    /// Create a transport answering through `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: FnMut(&ExplicitRequest) -> Result<Bytes> + Send + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Vec::new(),
        }
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> &[ExplicitRequest] {
        &self.requests
    }

    /// Requests that used `service`.
    pub fn requests_with_service(&self, service: u8) -> Vec<&ExplicitRequest> {
        self.requests
            .iter()
            .filter(|request| request.service == service)
            .collect()
    }

    /// Forget the request log.
    pub fn clear(&mut self) {
        self.requests.clear();
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &self.requests.len())
            .finish()
    }
}

impl ExplicitMessaging for MockTransport {
    fn send_explicit_message(&mut self, request: ExplicitRequest) -> Result<Bytes> {
        tracing::trace!(%request, "mock transport request");
        let response = (self.handler)(&request);
        self.requests.push(request);
        response
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
