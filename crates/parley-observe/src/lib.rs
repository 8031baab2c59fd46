//! Observability for Parley: subscriber setup and OpenTelemetry bridging.

pub mod tracing_setup;
