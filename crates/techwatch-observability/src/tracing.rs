//! OpenTelemetry distributed tracing
//!
//! This module provides utilities for distributed tracing with OpenTelemetry:
//! - Span creation and management
//! - Trace context propagation (W3C TraceContext)
//! - Attribute setting for spans
//!
//! Note: This is a simplified implementation. For production use, consider
//! using the full tracing-opentelemetry integration.

use opentelemetry::{
    KeyValue,
    trace::{Span, Status},
};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, TracerProvider},
};

/// Tracer configuration
#[derive(Debug, Clone)]
pub struct TracerConfig {
    pub service_name: String,
    pub service_version: String,
    /// Sampling rate (0.0-1.0)
    pub sampling_rate: f64,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            service_name: "techwatch".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            sampling_rate: 1.0,
        }
    }
}

/// Initialize a tracer provider
pub fn init_tracer_provider(config: TracerConfig) -> TracerProvider {
    let resource = Resource::new(vec![
        KeyValue::new("service.name", config.service_name),
        KeyValue::new("service.version", config.service_version),
    ]);

    let sampler = if config.sampling_rate >= 1.0 {
        Sampler::AlwaysOn
    } else if config.sampling_rate <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(config.sampling_rate)
    };

    TracerProvider::builder()
        .with_config(
            opentelemetry_sdk::trace::Config::default()
                .with_resource(resource)
                .with_id_generator(RandomIdGenerator::default())
                .with_sampler(sampler),
        )
        .build()
}

/// Span attributes for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestionSpanAttributes {
    pub source_type: Option<String>,
    pub task_id: Option<String>,
    pub keyword_count: Option<usize>,
}

impl IngestionSpanAttributes {
    pub fn new() -> Self {
        Self {
            source_type: None,
            task_id: None,
            keyword_count: None,
        }
    }

    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_keyword_count(mut self, count: usize) -> Self {
        self.keyword_count = Some(count);
        self
    }

    pub fn to_key_values(&self) -> Vec<KeyValue> {
        let mut kvs = Vec::new();

        if let Some(ref source_type) = self.source_type {
            kvs.push(KeyValue::new("techwatch.source_type", source_type.clone()));
        }
        if let Some(ref task_id) = self.task_id {
            kvs.push(KeyValue::new("techwatch.task_id", task_id.clone()));
        }
        if let Some(count) = self.keyword_count {
            kvs.push(KeyValue::new("techwatch.keyword_count", count as i64));
        }

        kvs
    }
}

impl Default for IngestionSpanAttributes {
    fn default() -> Self {
        Self::new()
    }
}

/// Add article scrape/save counts to a span.
pub fn record_article_counts(span: &mut impl Span, scraped: i64, saved: i64) {
    span.set_attribute(KeyValue::new("techwatch.articles_scraped", scraped));
    span.set_attribute(KeyValue::new("techwatch.articles_saved", saved));
}

/// Mark a span as failed with an error
pub fn record_error(span: &mut impl Span, error: &str) {
    span.set_status(Status::error(error.to_string()));
    span.set_attribute(KeyValue::new("error", true));
    span.set_attribute(KeyValue::new("error.message", error.to_string()));
}

/// Mark a span as successful
pub fn record_success(span: &mut impl Span) {
    span.set_status(Status::Ok);
}
