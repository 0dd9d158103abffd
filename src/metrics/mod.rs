use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;


lazy_static! {
    pub static ref STATUS_WRITES: IntCounterVec = IntCounterVec::new(
        Opts::new("tenant_status_writes_total", "Status writes applied to tenant resources"),
        &["kind", "indicator"]
    )
    .expect("metric can not be created");

    pub static ref WATCHER_TIMEOUTS: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "tenant_watcher_timeouts_total",
            "Acknowledgment deadlines that expired with watchers outstanding"
        ),
        &["kind", "phase"]
    )
    .expect("metric can not be created");

    pub static ref FATAL_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("tenant_fatal_errors_total", "Fatal persist failures"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref ACK_TIMERS_ACTIVE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("tenant_ack_timers_active", "Acknowledgment timers currently running"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

/// Registers the coordinator collectors with `registry`.
pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(STATUS_WRITES.clone()))?;
    registry.register(Box::new(WATCHER_TIMEOUTS.clone()))?;
    registry.register(Box::new(FATAL_ERRORS.clone()))?;
    registry.register(Box::new(ACK_TIMERS_ACTIVE.clone()))?;
    Ok(())
}

/// Renders every metric in `registry` in the Prometheus text format.
pub fn encode_text(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        tracing::warn!("could not encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
