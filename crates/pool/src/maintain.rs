//! Support for maintaining the state of the transaction pool.

use crate::ConditionalPool;
use futures_util::{Stream, StreamExt};
use sequent_conditional::BlockAttributes;
use sequent_storage_api::StateViewFactory;
use std::sync::Arc;
use tracing::{debug, warn};

/// A committed block the pool re-validates against.
#[derive(Debug, Clone, Copy)]
pub struct NewBlockEvent {
    /// Attributes of the committed block.
    pub attributes: BlockAttributes,
}

/// Maintains the conditional state of the transaction pool.
///
/// Listens for committed blocks and re-validates every pooled conditional
/// against the new state, evicting transactions whose preconditions no longer
/// hold or whose header bounds can no longer be met. A failure to obtain the
/// state skips the pass rather than evicting anything.
pub async fn maintain_conditional_pool<F, St>(
    factory: F,
    pool: Arc<ConditionalPool>,
    mut events: St,
) where
    F: StateViewFactory,
    St: Stream<Item = NewBlockEvent> + Unpin,
{
    while let Some(event) = events.next().await {
        let state = match factory.latest_state() {
            Ok(state) => state,
            Err(err) => {
                warn!(%err, "failed to obtain latest state for pool maintenance");
                continue
            }
        };
        let dropped = pool.on_new_state(&event.attributes, &state);
        if !dropped.is_empty() {
            debug!(
                count = dropped.len(),
                block = event.attributes.number,
                "evicted conditional transactions"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::transaction, PoolConfig, TransactionOrigin};
    use sequent_conditional::TransactionConditional;
    use sequent_storage_api::mock::{MockHeader, MockStateView, MockStateViewFactory};

    #[tokio::test]
    async fn sweeps_on_each_block_event() {
        let pool = Arc::new(ConditionalPool::new(PoolConfig::default()));
        let conditional =
            TransactionConditional { block_number_max: Some(5), ..Default::default() };
        pool.add_transaction(
            TransactionOrigin::Private,
            transaction(0, 1000).with_conditional(conditional),
        )
        .unwrap();

        let factory = MockStateViewFactory::new(
            MockHeader { number: 6, timestamp: 0, parent_hash: Default::default() },
            MockStateView::new(),
            MockStateView::new(),
        );

        let events = tokio_stream::iter([
            NewBlockEvent { attributes: BlockAttributes::new(5, 0) },
            NewBlockEvent { attributes: BlockAttributes::new(6, 0) },
        ]);
        maintain_conditional_pool(factory, Arc::clone(&pool), events).await;

        // the max block bound was exceeded by the second block
        assert!(pool.is_empty());
    }
}
