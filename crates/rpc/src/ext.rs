//! Eth API extension.

use crate::{api::EthExtApiServer, error::ConditionalApiError, metrics::ConditionalApiMetrics};
use alloy_consensus::{transaction::SignerRecoverable, TxEnvelope};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{Bytes, B256};
use jsonrpsee::core::RpcResult;
use sequent_conditional::{evaluator, BlockAttributes, ConditionalCheckError, TransactionConditional};
use sequent_pool::{PooledConditionalTransaction, TransactionOrigin, TransactionPipeline};
use sequent_storage_api::{HeaderView, StateViewError, StateViewFactory};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::Semaphore;
use tracing::trace;

/// Maximum validation cost accepted for a conditional.
pub const DEFAULT_CONDITIONAL_COST_CEILING: u64 = 1000;

const MAX_CONCURRENT_CONDITIONAL_VALIDATIONS: usize = 3;

/// `eth_` extension implementation serving conditional transaction
/// submission.
///
/// Admission runs in a fixed order: the cost budget and structural checks
/// first (no state access), then the header bounds and known accounts
/// against the latest block, then the known accounts again against the
/// parent block's state. Checking the immutable parent state as well removes
/// the sequencer's incentive to include the transaction selectively only
/// when the latest state transition benefits it; collapsing the two passes
/// into one would change that guarantee.
#[derive(Debug, Clone)]
pub struct EthExt<Provider, Pipeline> {
    /// Ceiling on a conditional's validation cost.
    max_conditional_cost: u64,
    inner: Arc<EthExtInner<Provider, Pipeline>>,
}

impl<Provider, Pipeline> EthExt<Provider, Pipeline> {
    /// Creates a new extension handler over the given state view factory and
    /// submission pipeline.
    pub fn new(provider: Provider, pipeline: Pipeline) -> Self {
        Self {
            max_conditional_cost: DEFAULT_CONDITIONAL_COST_CEILING,
            inner: Arc::new(EthExtInner {
                provider,
                pipeline,
                validation_semaphore: Semaphore::new(MAX_CONCURRENT_CONDITIONAL_VALIDATIONS),
                metrics: ConditionalApiMetrics::default(),
            }),
        }
    }

    /// Overrides the ceiling on a conditional's validation cost.
    pub const fn with_max_conditional_cost(mut self, max_conditional_cost: u64) -> Self {
        self.max_conditional_cost = max_conditional_cost;
        self
    }
}

#[derive(Debug)]
struct EthExtInner<Provider, Pipeline> {
    /// The provider handing out state and header views.
    provider: Provider,
    /// The downstream submission pipeline.
    pipeline: Pipeline,
    /// Bounds the number of concurrent conditional validations.
    validation_semaphore: Semaphore,
    /// Endpoint metrics.
    metrics: ConditionalApiMetrics,
}

impl<Provider, Pipeline> EthExt<Provider, Pipeline>
where
    Provider: StateViewFactory,
    Pipeline: TransactionPipeline,
{
    async fn submit_conditional(
        &self,
        bytes: Bytes,
        mut condition: TransactionConditional,
    ) -> Result<B256, ConditionalApiError> {
        let inner = &*self.inner;
        inner.metrics.requests.increment(1);

        // budget the validation before anything else; a rejected conditional
        // must never cost a state lookup
        let cost = condition.cost();
        inner.metrics.cost.record(cost as f64);
        if cost > self.max_conditional_cost {
            return Err(ConditionalApiError::CostExceeded {
                cost,
                limit: self.max_conditional_cost,
            })
        }
        condition.validate()?;

        let _permit = inner
            .validation_semaphore
            .acquire()
            .await
            .map_err(|_| ConditionalApiError::Internal)?;

        let header =
            inner.provider.latest_header()?.ok_or(StateViewError::HeaderNotFound)?;
        let attrs = BlockAttributes::from_header(&header);
        evaluator::check_header_bounds(&condition, &attrs)
            .map_err(ConditionalApiError::HeaderCheck)?;

        let state = inner.provider.latest_state()?;
        evaluator::check_known_accounts(&condition, &state).map_err(|err| match err {
            ConditionalCheckError::Violation(violation) => {
                ConditionalApiError::StateCheck(violation)
            }
            ConditionalCheckError::StateAccess(err) => err.into(),
        })?;

        // Also check against the parent block's state: a check against the
        // latest state alone would let the sequencer include the transaction
        // selectively whenever the most recent state transition favors it.
        let parent_state = inner.provider.state_by_block_hash(header.parent_hash())?;
        evaluator::check_known_accounts(&condition, &parent_state).map_err(|err| match err {
            ConditionalCheckError::Violation(violation) => {
                ConditionalApiError::ParentStateCheck(violation)
            }
            ConditionalCheckError::StateAccess(err) => err.into(),
        })?;

        let mut transaction = recover_raw_transaction(&bytes)?;

        // Tag the transaction with the conditional and the current time,
        // overwriting whatever a client may have supplied.
        condition.set_submission_time(unix_now());
        transaction.set_conditional(condition);

        let hash =
            inner.pipeline.submit_transaction(TransactionOrigin::Private, transaction).await?;
        inner.metrics.accepted.increment(1);
        trace!(%hash, cost, "accepted conditional transaction");
        Ok(hash)
    }
}

#[async_trait::async_trait]
impl<Provider, Pipeline> EthExtApiServer for EthExt<Provider, Pipeline>
where
    Provider: StateViewFactory + 'static,
    Pipeline: TransactionPipeline + 'static,
{
    async fn send_raw_transaction_conditional(
        &self,
        bytes: Bytes,
        condition: TransactionConditional,
    ) -> RpcResult<B256> {
        Ok(self.submit_conditional(bytes, condition).await?)
    }
}

/// Decodes raw transaction bytes into a pooled transaction, recovering the
/// signer.
fn recover_raw_transaction(
    mut data: &[u8],
) -> Result<PooledConditionalTransaction, ConditionalApiError> {
    if data.is_empty() {
        return Err(ConditionalApiError::EmptyRawTransactionData)
    }
    let transaction = TxEnvelope::decode_2718(&mut data)
        .map_err(|_| ConditionalApiError::FailedToDecodeSignedTransaction)?;
    let sender = transaction
        .recover_signer()
        .map_err(|_| ConditionalApiError::InvalidTransactionSignature)?;
    Ok(PooledConditionalTransaction::new(transaction, sender))
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
