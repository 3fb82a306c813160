//! A stream-based diagnostic sink for tasks and calculators.
//!
//! A [`Log`] exposes four severity streams (`debug`, `warning`, `error` and
//! `output`). Each stream fans a message out to any number of [`Sink`]s. The
//! default log forwards everything to `tracing`, so diagnostics end up wherever
//! the application installed its subscriber. Cloning a log shares its sinks.

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Warning,
    Error,
    Output,
}

/// A destination for log messages.
#[derive(Debug, Clone)]
pub enum Sink {
    /// Emits a `tracing` event at the level matching the stream's severity.
    Tracing,
    /// Appends messages to a shared in-memory buffer.
    Buffer(Arc<Mutex<Vec<String>>>),
}

#[derive(Debug, Clone)]
pub struct Stream {
    severity: Severity,
    sinks: Vec<Sink>,
}

impl Stream {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: Sink) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Sink) {
        self.sinks.push(sink);
    }

    pub fn clear(&mut self) {
        self.sinks.clear();
    }

    pub fn is_silent(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn write(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        for sink in &self.sinks {
            match sink {
                Sink::Tracing => match self.severity {
                    Severity::Debug => debug!(target: "readuct", "{}", message),
                    Severity::Warning => warn!(target: "readuct", "{}", message),
                    Severity::Error => error!(target: "readuct", "{}", message),
                    Severity::Output => info!(target: "readuct", "{}", message),
                },
                Sink::Buffer(buffer) => buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(message.to_string()),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Log {
    pub debug: Stream,
    pub warning: Stream,
    pub error: Stream,
    pub output: Stream,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            debug: Stream::new(Severity::Debug).with_sink(Sink::Tracing),
            warning: Stream::new(Severity::Warning).with_sink(Sink::Tracing),
            error: Stream::new(Severity::Error).with_sink(Sink::Tracing),
            output: Stream::new(Severity::Output).with_sink(Sink::Tracing),
        }
    }
}

impl Log {
    /// A log whose streams have no sinks.
    pub fn silent() -> Self {
        Self {
            debug: Stream::new(Severity::Debug),
            warning: Stream::new(Severity::Warning),
            error: Stream::new(Severity::Error),
            output: Stream::new(Severity::Output),
        }
    }

    /// A log that records every stream into memory, together with the handle
    /// used to read the recorded messages back.
    pub fn capture() -> (Self, LogCapture) {
        let capture = LogCapture::default();
        let log = Self {
            debug: Stream::new(Severity::Debug).with_sink(Sink::Buffer(capture.debug.clone())),
            warning: Stream::new(Severity::Warning)
                .with_sink(Sink::Buffer(capture.warning.clone())),
            error: Stream::new(Severity::Error).with_sink(Sink::Buffer(capture.error.clone())),
            output: Stream::new(Severity::Output)
                .with_sink(Sink::Buffer(capture.output.clone())),
        };
        (log, capture)
    }
}

/// Read handle for the buffers of a log created with [`Log::capture`].
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    debug: Arc<Mutex<Vec<String>>>,
    warning: Arc<Mutex<Vec<String>>>,
    error: Arc<Mutex<Vec<String>>>,
    output: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    pub fn debug(&self) -> Vec<String> {
        snapshot(&self.debug)
    }

    pub fn warnings(&self) -> Vec<String> {
        snapshot(&self.warning)
    }

    pub fn errors(&self) -> Vec<String> {
        snapshot(&self.error)
    }

    pub fn output(&self) -> Vec<String> {
        snapshot(&self.output)
    }
}

fn snapshot(buffer: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner).clone()
}
