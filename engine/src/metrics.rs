//! Metric registration for the claim engine.
//!
//! The engine emits through the `metrics` facade; the host process installs
//! whatever recorder it wants (Prometheus exporter, logging recorder, none).

use metrics::describe_counter;

/// Register descriptions for every metric the engine emits.
///
/// Safe to call more than once; call it after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(
        "claim_ledger_offers_created_total",
        "Total number of offers created"
    );
    describe_counter!(
        "claim_ledger_claims_total",
        "Total number of claims successfully written"
    );
    describe_counter!(
        "claim_ledger_releases_total",
        "Total number of claims released (unclaimed)"
    );
    describe_counter!(
        "claim_ledger_completions_total",
        "Total number of offers completed"
    );
    describe_counter!(
        "claim_ledger_cancellations_total",
        "Total number of offers cancelled"
    );
    describe_counter!(
        "claim_ledger_write_conflicts_total",
        "Total number of conditional writes lost to a concurrent writer"
    );
    describe_counter!(
        "claim_ledger_retries_exhausted_total",
        "Total number of operations abandoned after the retry budget"
    );
}
