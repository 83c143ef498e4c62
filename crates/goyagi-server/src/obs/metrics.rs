//! Statsd metrics client and timers.
//!
//! `Metrics` is built once at startup and cloned into every component that
//! emits samples. Every metric name is prefixed with the namespace and every
//! tag list starts with the global tags. Emission is best effort: transport
//! failures are dropped here and never reach request handling.

use std::sync::Arc;
use std::time::Instant;

use crate::obs::sink::StatsdSink;

pub const NAMESPACE: &str = "goyagi.";

const SAMPLE_RATE: f64 = 1.0;

#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    sink: Arc<dyn StatsdSink>,
    namespace: String,
    global_tags: Vec<String>,
}

impl Metrics {
    pub fn new(sink: Arc<dyn StatsdSink>, namespace: &str, global_tags: Vec<String>) -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                sink,
                namespace: namespace.to_string(),
                global_tags,
            }),
        }
    }

    /// Client with the `goyagi.` namespace and an `environment:<env>` global tag.
    pub fn for_environment(sink: Arc<dyn StatsdSink>, environment: &str) -> Self {
        Self::new(sink, NAMESPACE, vec![format!("environment:{environment}")])
    }

    /// Increment a counter, disregarding transport errors.
    pub fn count(&self, name: &str, delta: i64, tags: &[&str]) {
        let name = self.qualify(name);
        let tags = self.with_global_tags(tags);
        if let Err(e) = self.inner.sink.count(&name, delta, &tags, SAMPLE_RATE) {
            tracing::trace!(metric = %name, error = %e, "count dropped");
        }
    }

    /// Send one distribution sample, disregarding transport errors.
    pub fn histogram(&self, name: &str, value: f64, tags: &[&str]) {
        let name = self.qualify(name);
        let tags = self.with_global_tags(tags);
        if let Err(e) = self.inner.sink.histogram(&name, value, &tags, SAMPLE_RATE) {
            tracing::trace!(metric = %name, error = %e, "histogram dropped");
        }
    }

    /// Start a timer. Nothing is emitted until [`Timer::end`].
    pub fn new_timer(&self, name: &str, tags: &[&str]) -> Timer {
        Timer {
            name: name.to_string(),
            begin: Instant::now(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            metrics: self.clone(),
        }
    }

    fn qualify(&self, name: &str) -> String {
        format!("{}{}", self.inner.namespace, name)
    }

    fn with_global_tags<'a>(&'a self, tags: &[&'a str]) -> Vec<&'a str> {
        self.inner
            .global_tags
            .iter()
            .map(String::as_str)
            .chain(tags.iter().copied())
            .collect()
    }
}

/// One in-progress measurement, emitted as a histogram sample when ended.
///
/// `end` takes `self`, so a timer reports at most once. Dropping a timer
/// without ending it loses the sample.
#[must_use = "a timer emits nothing until `end` is called"]
pub struct Timer {
    name: String,
    begin: Instant,
    tags: Vec<String>,
    metrics: Metrics,
}

impl Timer {
    /// Emit the elapsed whole milliseconds (truncated) with the construction
    /// tags followed by `additional_tags`. Returns the reported duration.
    pub fn end(self, additional_tags: &[&str]) -> u64 {
        let millis = self.begin.elapsed().as_millis() as u64;

        let tags: Vec<&str> = self
            .tags
            .iter()
            .map(String::as_str)
            .chain(additional_tags.iter().copied())
            .collect();

        self.metrics.histogram(&self.name, millis as f64, &tags);
        millis
    }
}
