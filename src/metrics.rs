#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    global,
    KeyValue,
    metrics::{Counter, Histogram},
};

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<UndertowMetrics> = Lazy::new(UndertowMetrics::init);

#[cfg(feature = "metrics")]
pub struct UndertowMetrics {
    pub statements_total: Counter<u64>,
    pub assembly_duration: Histogram<f64>,
    pub joins_total: Counter<u64>,
    pub filter_subqueries_total: Counter<u64>,
    pub resolve_errors_total: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl UndertowMetrics {
    pub fn init() -> Self {
        let meter = global::meter("undertow");

        let statements_total = meter.u64_counter("undertow_statements_total")
            .with_description("Total statements assembled").build();

        let assembly_duration = meter.f64_histogram("undertow_assembly_duration_seconds")
            .with_description("Duration of statement assembly").build();

        let joins_total = meter.u64_counter("undertow_joins_total")
            .with_description("Relation joins emitted").build();

        let filter_subqueries_total = meter.u64_counter("undertow_filter_subqueries_total")
            .with_description("IN / NOT IN subqueries emitted for to-many conditions").build();

        let resolve_errors_total = meter.u64_counter("undertow_resolve_errors_total")
            .with_description("Column or relation paths that failed to resolve").build();

        Self {
            statements_total,
            assembly_duration,
            joins_total,
            filter_subqueries_total,
            resolve_errors_total,
        }
    }

    pub fn record_statement(&self, elapsed: std::time::Duration, joins: usize) {
        self.statements_total.add(1, &[]);
        self.assembly_duration.record(elapsed.as_secs_f64(), &[]);
        self.joins_total.add(joins as u64, &[]);
    }

    pub fn record_filter_subquery(&self, negated: bool) {
        self.filter_subqueries_total
            .add(1, &[KeyValue::new("negated", negated)]);
    }

    pub fn record_resolve_error(&self) {
        self.resolve_errors_total.add(1, &[]);
    }
}

/// Spans around statement assembly and filter processing
#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    pub fn assemble_span(table: &str) -> Span {
        tracing::debug_span!("undertow.assemble", table = %table)
    }

    pub fn filter_span(table: &str) -> Span {
        tracing::debug_span!("undertow.filter", table = %table)
    }

    pub fn resolve_span(path: &str) -> Span {
        tracing::trace_span!("undertow.resolve", path = %path)
    }
}
