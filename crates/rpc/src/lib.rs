//! Sequencer RPC surface for conditional transaction submission.
//!
//! Exposes `eth_sendRawTransactionConditional`: a raw transaction plus a
//! [`TransactionConditional`](sequent_conditional::TransactionConditional) is
//! admitted only after the conditional's cost is budgeted, its structure
//! validated and its preconditions checked against the latest state *and* the
//! parent block's state, then stamped and handed to the node's submission
//! pipeline.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod api;
mod error;
mod ext;
mod metrics;

pub use api::EthExtApiServer;
#[cfg(feature = "client")]
pub use api::EthExtApiClient;
pub use error::ConditionalApiError;
pub use ext::{EthExt, DEFAULT_CONDITIONAL_COST_CEILING};
