//! Process-wide named counters.
//!
//! Counters are looked up by a stable dotted name such as
//! `servicelog.logstash.dropped.RateExceeded`. Repeated lookups of the same
//! name return handles to the same counter. Each counter is also registered
//! with a Prometheus registry under a sanitized name so an external exporter
//! can scrape it.

use parking_lot::RwLock;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    PrometheusError(#[from] prometheus::Error),

    #[error("Metrics encoding produced invalid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Clone, Default)]
pub struct CounterRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    counters: RwLock<HashMap<String, IntCounter>>,
    prometheus: Registry,
}

static GLOBAL: OnceLock<CounterRegistry> = OnceLock::new();

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every appender in the process.
    pub fn global() -> &'static CounterRegistry {
        GLOBAL.get_or_init(CounterRegistry::new)
    }

    pub fn get_or_register_counter(&self, name: &str) -> Result<IntCounter, MetricsError> {
        if let Some(counter) = self.inner.counters.read().get(name) {
            return Ok(counter.clone());
        }

        let mut counters = self.inner.counters.write();
        // Another task may have registered it between the two locks.
        if let Some(counter) = counters.get(name) {
            return Ok(counter.clone());
        }

        let counter = IntCounter::new(exposition_name(name), name)?;
        self.inner.prometheus.register(Box::new(counter.clone()))?;
        counters.insert(name.to_string(), counter.clone());
        Ok(counter)
    }

    /// Current value, or `None` if nothing registered `name` yet.
    pub fn counter_value(&self, name: &str) -> Option<u64> {
        self.inner.counters.read().get(name).map(IntCounter::get)
    }

    /// Renders every counter in the Prometheus text exposition format.
    pub fn gather_text(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.inner.prometheus.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Maps a dotted name onto the Prometheus metric name alphabet.
fn exposition_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect();
    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_returns_same_counter() {
        let registry = CounterRegistry::new();

        let name = "servicelog.logstash.dropped.SizeExceeded";
        let first = registry.get_or_register_counter(name).unwrap();
        let second = registry.get_or_register_counter(name).unwrap();
        first.inc();
        second.inc();

        assert_eq!(registry.counter_value("servicelog.logstash.dropped.SizeExceeded"), Some(2));
        assert_eq!(registry.counter_value("servicelog.logstash.dropped.RateExceeded"), None);
    }

    #[test]
    fn test_clones_share_counters() {
        let registry = CounterRegistry::new();
        let clone = registry.clone();

        clone.get_or_register_counter("a.b").unwrap().inc_by(5);

        assert_eq!(registry.counter_value("a.b"), Some(5));
    }

    #[test]
    fn test_concurrent_increments() {
        let registry = CounterRegistry::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let counter = registry.get_or_register_counter("shared.counter").unwrap();
                    for _ in 0..1000 {
                        counter.inc();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.counter_value("shared.counter"), Some(8000));
    }

    #[test]
    fn test_gather_text_uses_sanitized_names() {
        let registry = CounterRegistry::new();
        registry
            .get_or_register_counter("servicelog.logstash.dropped.RateExceeded")
            .unwrap()
            .inc();

        let text = registry.gather_text().unwrap();

        assert!(text.contains("servicelog_logstash_dropped_RateExceeded 1"));
        let help = "# HELP servicelog_logstash_dropped_RateExceeded";
        assert!(text.contains(&format!("{help} servicelog.logstash.dropped.RateExceeded")));
    }

    #[test]
    fn test_exposition_name() {
        assert_eq!(exposition_name("a.b-c"), "a_b_c");
        assert_eq!(exposition_name("9lives"), "_9lives");
        assert_eq!(exposition_name("ok_name:sub"), "ok_name:sub");
    }

    #[test]
    fn test_global_is_singleton() {
        assert!(std::ptr::eq(CounterRegistry::global(), CounterRegistry::global()));
    }
}
