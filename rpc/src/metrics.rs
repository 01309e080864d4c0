//! Prometheus metrics for the RPC surface.
//!
//! The [`RpcMetrics`] struct owns a dedicated [`Registry`] that the
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Central collection of RPC-level Prometheus metrics.
pub struct RpcMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    /// Requests by method name and outcome ("success" or the error token).
    pub requests: IntCounterVec,
    /// Time spent inside a handler, in milliseconds.
    pub handler_time_ms: Histogram,
}

impl RpcMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests = register_int_counter_vec_with_registry!(
            Opts::new("meridian_rpc_requests_total", "RPC requests by method and outcome"),
            &["method", "outcome"],
            registry
        )
        .expect("failed to register requests counter");

        let handler_time_ms = register_histogram_with_registry!(
            HistogramOpts::new("meridian_rpc_handler_time_ms", "Handler time in milliseconds")
                .buckets(prometheus::exponential_buckets(0.1, 2.0, 12).unwrap()),
            registry
        )
        .expect("failed to register handler_time_ms histogram");

        Self {
            registry,
            requests,
            handler_time_ms,
        }
    }

    /// Encode the registry in the Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buf).is_err() {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl Default for RpcMetrics {
    fn default() -> Self {
        Self::new()
    }
}
