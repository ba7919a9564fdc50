//! Prometheus Metrics Module
//!
//! Application-wide metrics for the delivery core.
//!
//! # Metrics Collected
//! - Active stream connection gauge
//! - Messages delivered over streams
//! - Reconnect frames issued
//! - Presence heartbeats accepted

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Currently open stream connections
pub static STREAM_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "stream_connections_active",
            "Number of currently open message stream connections",
        )
        .namespace("campus_stream"),
    )
    .expect("Failed to create STREAM_CONNECTIONS_ACTIVE metric")
});

/// Total messages delivered over streams
pub static STREAM_MESSAGES_DELIVERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "stream_messages_delivered_total",
            "Total messages delivered over stream connections",
        )
        .namespace("campus_stream"),
    )
    .expect("Failed to create STREAM_MESSAGES_DELIVERED_TOTAL metric")
});

/// Total reconnect frames issued at connection deadline
pub static STREAM_RECONNECTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "stream_reconnects_total",
            "Total reconnect frames issued at the connection lifetime deadline",
        )
        .namespace("campus_stream"),
    )
    .expect("Failed to create STREAM_RECONNECTS_TOTAL metric")
});

/// Total presence heartbeats accepted
pub static PRESENCE_HEARTBEATS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "presence_heartbeats_total",
            "Total presence heartbeats written to the directory",
        )
        .namespace("campus_stream"),
    )
    .expect("Failed to create PRESENCE_HEARTBEATS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(STREAM_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register STREAM_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(STREAM_MESSAGES_DELIVERED_TOTAL.clone()))
        .expect("Failed to register STREAM_MESSAGES_DELIVERED_TOTAL");
    registry
        .register(Box::new(STREAM_RECONNECTS_TOTAL.clone()))
        .expect("Failed to register STREAM_RECONNECTS_TOTAL");
    registry
        .register(Box::new(PRESENCE_HEARTBEATS_TOTAL.clone()))
        .expect("Failed to register PRESENCE_HEARTBEATS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// RAII guard tracking one open stream connection.
///
/// The gauge is decremented on drop, which also covers client-initiated
/// disconnects that abandon the stream mid-loop.
pub struct StreamConnectionGuard(());

impl StreamConnectionGuard {
    pub fn new() -> Self {
        STREAM_CONNECTIONS_ACTIVE.inc();
        Self(())
    }
}

impl Default for StreamConnectionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StreamConnectionGuard {
    fn drop(&mut self) {
        STREAM_CONNECTIONS_ACTIVE.dec();
    }
}
