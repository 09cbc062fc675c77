//! `eth_` extension trait for the sequencer.

use alloy_primitives::{Bytes, B256};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use sequent_conditional::TransactionConditional;

/// Extension trait for the `eth_` namespace, served by the sequencer.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "eth"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "eth"))]
pub trait EthExtApi {
    /// Sends a signed transaction with the given inclusion preconditions.
    ///
    /// The preconditions are validated against the latest state and the
    /// parent block's state before the transaction enters the pool, and
    /// re-validated on every pool re-check until it leaves it.
    #[method(name = "sendRawTransactionConditional")]
    async fn send_raw_transaction_conditional(
        &self,
        bytes: Bytes,
        condition: TransactionConditional,
    ) -> RpcResult<B256>;
}
