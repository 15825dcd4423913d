//! Prometheus metrics for the SDUPI node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]; [`NodeMetrics::encode`]
//! renders it in the Prometheus text exposition format for whatever
//! endpoint a deployment wires up.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Blocks this node produced and appended.
    pub blocks_produced: IntCounter,
    /// Candidate blocks the ledger refused (local or from peers).
    pub blocks_rejected: IntCounter,
    /// Blocks received from peers and appended.
    pub peer_blocks_accepted: IntCounter,
    /// Transactions accepted into the pool.
    pub transactions_submitted: IntCounter,
    /// Transactions refused at submission.
    pub transactions_rejected: IntCounter,
    /// Round ticks skipped because a round was still running.
    pub rounds_skipped: IntCounter,
    /// Blocks whose nonce search hit the iteration cap.
    pub target_misses: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub chain_height: IntGauge,
    pub pending_transactions: IntGauge,
    pub peer_count: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of one nonce search, in milliseconds.
    pub nonce_search_ms: Histogram,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        // Counters
        let blocks_produced = register_int_counter_with_registry!(
            Opts::new(
                "sdupi_blocks_produced_total",
                "Blocks produced and appended by this node"
            ),
            registry
        )
        .expect("failed to register blocks_produced counter");

        let blocks_rejected = register_int_counter_with_registry!(
            Opts::new(
                "sdupi_blocks_rejected_total",
                "Candidate blocks rejected by the ledger"
            ),
            registry
        )
        .expect("failed to register blocks_rejected counter");

        let peer_blocks_accepted = register_int_counter_with_registry!(
            Opts::new(
                "sdupi_peer_blocks_accepted_total",
                "Blocks received from peers and appended"
            ),
            registry
        )
        .expect("failed to register peer_blocks_accepted counter");

        let transactions_submitted = register_int_counter_with_registry!(
            Opts::new(
                "sdupi_transactions_submitted_total",
                "Transactions accepted into the pool"
            ),
            registry
        )
        .expect("failed to register transactions_submitted counter");

        let transactions_rejected = register_int_counter_with_registry!(
            Opts::new(
                "sdupi_transactions_rejected_total",
                "Transactions rejected at submission"
            ),
            registry
        )
        .expect("failed to register transactions_rejected counter");

        let rounds_skipped = register_int_counter_with_registry!(
            Opts::new(
                "sdupi_rounds_skipped_total",
                "Round ticks skipped while a round was in flight"
            ),
            registry
        )
        .expect("failed to register rounds_skipped counter");

        let target_misses = register_int_counter_with_registry!(
            Opts::new(
                "sdupi_target_misses_total",
                "Blocks whose nonce search hit the iteration cap"
            ),
            registry
        )
        .expect("failed to register target_misses counter");

        // Gauges
        let chain_height = register_int_gauge_with_registry!(
            Opts::new("sdupi_chain_height", "Index of the chain tip"),
            registry
        )
        .expect("failed to register chain_height gauge");

        let pending_transactions = register_int_gauge_with_registry!(
            Opts::new(
                "sdupi_pending_transactions",
                "Transactions waiting in the pool"
            ),
            registry
        )
        .expect("failed to register pending_transactions gauge");

        let peer_count = register_int_gauge_with_registry!(
            Opts::new("sdupi_peer_count", "Current number of connected peers"),
            registry
        )
        .expect("failed to register peer_count gauge");

        // Histograms: exponential buckets covering 1 ms to ~16 s.
        let nonce_search_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "sdupi_nonce_search_ms",
                "Nonce search duration in milliseconds"
            )
            .buckets(
                prometheus::exponential_buckets(1.0, 2.0, 15)
                    .expect("valid exponential bucket parameters")
            ),
            registry
        )
        .expect("failed to register nonce_search_ms histogram");

        Self {
            registry,
            blocks_produced,
            blocks_rejected,
            peer_blocks_accepted,
            transactions_submitted,
            transactions_rejected,
            rounds_skipped,
            target_misses,
            chain_height,
            pending_transactions,
            peer_count,
            nonce_search_ms,
        }
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_without_panic() {
        let m = NodeMetrics::new();
        m.blocks_produced.inc();
        m.chain_height.set(42);
        m.nonce_search_ms.observe(12.5);
        assert_eq!(m.blocks_produced.get(), 1);
        assert_eq!(m.chain_height.get(), 42);
    }

    #[test]
    fn encode_contains_metric_names() {
        let m = NodeMetrics::new();
        m.rounds_skipped.inc_by(3);
        let text = m.encode();
        assert!(text.contains("sdupi_rounds_skipped_total 3"));
        assert!(text.contains("sdupi_chain_height"));
    }

    #[test]
    fn separate_instances_do_not_collide() {
        let a = NodeMetrics::new();
        let b = NodeMetrics::new();
        a.peer_count.set(5);
        assert_eq!(b.peer_count.get(), 0);
    }
}
