//! Metrics of the conditional submission endpoint.

use metrics::{counter, histogram, Counter, Histogram};

/// Counters and distributions for `eth_sendRawTransactionConditional`.
///
/// Observational only; they never affect the admission outcome.
#[derive(Debug, Clone)]
pub(crate) struct ConditionalApiMetrics {
    /// Number of requests received
    pub(crate) requests: Counter,
    /// Number of requests accepted into the submission pipeline
    pub(crate) accepted: Counter,
    /// Distribution of conditional validation costs
    pub(crate) cost: Histogram,
}

impl Default for ConditionalApiMetrics {
    fn default() -> Self {
        Self {
            requests: counter!("sequencer.send_raw_transaction_conditional.requests"),
            accepted: counter!("sequencer.send_raw_transaction_conditional.accepted"),
            cost: histogram!("sequencer.send_raw_transaction_conditional.cost"),
        }
    }
}
