//! Observability for the ingestion pipeline: Prometheus metrics, OpenTelemetry
//! tracing helpers, and the health/readiness/metrics HTTP endpoints shared by
//! the orchestrator and server binaries.

pub mod health;
pub mod metrics;
pub mod tracing;

pub use health::{HealthState, ReadinessChecker, SourceStatus, health_router};
pub use metrics::Metrics;
