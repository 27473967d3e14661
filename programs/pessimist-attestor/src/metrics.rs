//! Prometheus metrics of the attestor process.

#![allow(missing_docs)]
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec, register_int_gauge_vec, Encoder, IntCounterVec, IntGaugeVec,
    TextEncoder,
};

lazy_static! {
    pub static ref CLAIMS_PRODUCED: IntCounterVec = register_int_counter_vec!(
        "pessimist_claims_produced_total",
        "Signed claims produced",
        &["chain_id"]
    )
    .unwrap();
    pub static ref COLLECTION_FAILURES: IntCounterVec = register_int_counter_vec!(
        "pessimist_collection_failures_total",
        "Failed snapshot collections or signings",
        &["chain_id"]
    )
    .unwrap();
    pub static ref CONSISTENCY_VIOLATIONS: IntCounterVec = register_int_counter_vec!(
        "pessimist_consistency_violations_total",
        "Differing roots observed at an already signed height",
        &["chain_id"]
    )
    .unwrap();
    pub static ref LATEST_ATTESTED_HEIGHT: IntGaugeVec = register_int_gauge_vec!(
        "pessimist_latest_attested_height",
        "Height of the latest signed claim",
        &["chain_id"]
    )
    .unwrap();
}

/// Record a freshly signed claim at `height`.
pub fn record_claim(chain_id: &str, height: u64) {
    CLAIMS_PRODUCED.with_label_values(&[chain_id]).inc();
    LATEST_ATTESTED_HEIGHT
        .with_label_values(&[chain_id])
        .set(i64::try_from(height).unwrap_or(i64::MAX));
}

/// Text exposition of every registered metric.
pub fn gather_text() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
