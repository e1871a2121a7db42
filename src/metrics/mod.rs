use prometheus::{Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;

/// Prometheus metrics for directory searches and the posting list index
#[derive(Clone)]
pub struct LdapdexMetrics {
    // Counters
    pub searches_total: CounterVec,
    pub search_errors: Counter,
    pub postings_inserted: Counter,
    pub tokens_folded: Counter,
    pub legacy_rows_upgraded: Counter,

    // Gauges
    pub index_rows: Gauge,

    // Histograms
    pub search_latency: Histogram,

    // Registry
    registry: Arc<Registry>,
}

impl LdapdexMetrics {
    /// Create a new LdapdexMetrics instance
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Counters
        let searches_total = CounterVec::new(
            Opts::new(
                "ldapdex_directory_searches_total",
                "Total number of directory searches by kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(searches_total.clone()))?;

        let search_errors = Counter::with_opts(Opts::new(
            "ldapdex_directory_search_errors_total",
            "Directory searches that degraded to an exception record",
        ))?;
        registry.register(Box::new(search_errors.clone()))?;

        let postings_inserted = Counter::with_opts(Opts::new(
            "ldapdex_postings_inserted_total",
            "Insert calls applied to the posting list index",
        ))?;
        registry.register(Box::new(postings_inserted.clone()))?;

        let tokens_folded = Counter::with_opts(Opts::new(
            "ldapdex_tokens_folded_total",
            "Tokens that went through the ASCII folding fallback",
        ))?;
        registry.register(Box::new(tokens_folded.clone()))?;

        let legacy_rows_upgraded = Counter::with_opts(Opts::new(
            "ldapdex_legacy_rows_upgraded_total",
            "Single-value index rows upgraded to sets",
        ))?;
        registry.register(Box::new(legacy_rows_upgraded.clone()))?;

        // Gauges
        let index_rows = Gauge::with_opts(Opts::new(
            "ldapdex_index_rows",
            "Rows created in the posting list index",
        ))?;
        registry.register(Box::new(index_rows.clone()))?;

        // Histograms
        let search_latency = Histogram::with_opts(
            HistogramOpts::new(
                "ldapdex_directory_search_latency_seconds",
                "Directory search latency",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 10.0]),
        )?;
        registry.register(Box::new(search_latency.clone()))?;

        Ok(Self {
            searches_total,
            search_errors,
            postings_inserted,
            tokens_folded,
            legacy_rows_upgraded,
            index_rows,
            search_latency,
            registry: Arc::new(registry),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record a directory search
    pub fn record_search(&self, kind: &str, duration_secs: f64) {
        self.searches_total.with_label_values(&[kind]).inc();
        self.search_latency.observe(duration_secs);
    }

    /// Record a search that degraded to an exception record
    pub fn record_search_error(&self) {
        self.search_errors.inc();
    }

    /// Record an index insert
    pub fn record_insert(&self, folded: bool) {
        self.postings_inserted.inc();
        if folded {
            self.tokens_folded.inc();
        }
    }

    pub fn record_upgrade(&self) {
        self.legacy_rows_upgraded.inc();
    }

    /// Update the row counter gauge
    pub fn set_index_rows(&self, rows: u64) {
        self.index_rows.set(rows as f64);
    }
}
