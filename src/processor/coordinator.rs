//! # Processing Coordinator
//!
//! Adapts the partition-host lifecycle (open, batches, close) onto one
//! [`EventProcessor`] per owned partition. Partitions never share a processor
//! or a circuit breaker.

use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{CloseReason, EventProcessor, EventProcessorFactory, PartitionContext};
use crate::error::{DispatcherError, Result};
use crate::messaging::Event;

struct OwnedPartition {
    context: Arc<dyn PartitionContext>,
    processor: Arc<EventProcessor>,
}

pub struct ProcessingCoordinator {
    factory: EventProcessorFactory,
    partitions: DashMap<String, OwnedPartition>,
}

impl ProcessingCoordinator {
    pub fn new(factory: EventProcessorFactory) -> Self {
        Self {
            factory,
            partitions: DashMap::new(),
        }
    }

    /// Take ownership of a partition. Re-opening an owned partition replaces
    /// its processor.
    pub fn open_partition(&self, context: Arc<dyn PartitionContext>) -> Arc<EventProcessor> {
        let partition_id = context.partition_id().to_string();
        let processor = Arc::new(self.factory.create_event_processor(&partition_id));
        processor.on_open(context.as_ref());

        let previous = self.partitions.insert(
            partition_id.clone(),
            OwnedPartition {
                context,
                processor: processor.clone(),
            },
        );
        if previous.is_some() {
            warn!(partition_id = %partition_id, "Partition re-opened, replacing its processor");
        }

        processor
    }

    /// Deliver a batch to the processor that owns `partition_id`
    pub async fn process_batch(
        &self,
        partition_id: &str,
        events: Option<Vec<Event>>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (context, processor) = self
            .partitions
            .get(partition_id)
            .map(|owned| (owned.context.clone(), owned.processor.clone()))
            .ok_or_else(|| DispatcherError::PartitionNotOwned(partition_id.to_string()))?;

        processor
            .process_batch(context.as_ref(), events, cancel)
            .await
    }

    /// Release a partition. Returns `false` if it was not owned.
    pub fn close_partition(&self, partition_id: &str, reason: CloseReason) -> bool {
        match self.partitions.remove(partition_id) {
            Some((_, owned)) => {
                owned.processor.on_close(owned.context.as_ref(), reason);
                true
            }
            None => {
                warn!(
                    partition_id = partition_id,
                    reason = %reason,
                    "Close requested for a partition that is not owned"
                );
                false
            }
        }
    }

    pub fn is_owned(&self, partition_id: &str) -> bool {
        self.partitions.contains_key(partition_id)
    }

    /// Owned partition ids, sorted
    pub fn owned_partitions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.partitions.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Close every owned partition with [`CloseReason::Shutdown`]
    pub fn shutdown(&self) {
        let ids = self.owned_partitions();
        info!(partitions = ids.len(), "🛑 Shutting down processing coordinator");
        for id in ids {
            self.close_partition(&id, CloseReason::Shutdown);
        }
    }
}
