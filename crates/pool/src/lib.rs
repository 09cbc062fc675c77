//! The admission and ordering core of the sequencer's pending-transaction
//! pool.
//!
//! Transactions are kept per sender in nonce-ordered [`AccountTransactions`]
//! lists that enforce replacement rules (price bump), capacity eviction and,
//! in strict mode, gapless nonce contiguity. Transactions carrying a
//! [`TransactionConditional`](sequent_conditional::TransactionConditional)
//! are re-validated against chain state on every pool re-validation pass and
//! evicted once their preconditions no longer hold.
//!
//! The [`ConditionalPool`] wraps the per-sender lists behind a pool-wide
//! lock; each list itself is a plain single-writer structure and relies on
//! the caller's locking discipline for a linearized operation order.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod cost;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
mod config;
mod error;
mod list;
pub mod maintain;
mod metrics;
mod pool;
mod traits;
mod transaction;

pub use config::PoolConfig;
pub use error::{PoolError, PoolResult};
pub use list::AccountTransactions;
pub use pool::ConditionalPool;
pub use traits::{TransactionOrigin, TransactionPipeline};
pub use transaction::PooledConditionalTransaction;
