//! Observability setup: structured logging, optional OTLP trace export and
//! the Prometheus metrics recorder.

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
