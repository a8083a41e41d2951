use tracing::{debug, instrument};

use super::PrefixListHandlers;
use crate::error::HandlerError;
use crate::progress::{OperationKind, ProgressSignal};
use crate::types::PrefixList;

impl PrefixListHandlers {
    /// Assemble the current model of one list. Never suspends.
    #[instrument(skip(self))]
    pub async fn read(&self, prefix_list_id: &str) -> Result<ProgressSignal<PrefixList>, HandlerError> {
        let observed = self
            .store
            .describe(prefix_list_id)
            .await
            .map_err(|e| HandlerError::from_remote(OperationKind::Read, Some(prefix_list_id), e))?;
        let entries = self.drain_entries(OperationKind::Read, prefix_list_id).await?;

        debug!(entries = entries.len(), version = observed.version, "Read");
        Ok(ProgressSignal::Done(PrefixList::from_observed(&observed, entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::memory::SimulationSettings;

    #[tokio::test]
    async fn read_assembles_model_across_entry_pages() {
        let (handlers, store) = harness(SimulationSettings {
            page_size: 1,
            ..SimulationSettings::default()
        });
        let seeded = store.seed(&create_request(&desired())).await.unwrap();

        let signal = handlers.read(&seeded.id).await.unwrap();
        let ProgressSignal::Done(model) = signal else {
            panic!("expected done, got {:?}", signal);
        };
        assert_eq!(model.entries, desired().entries);
        assert_eq!(model.tags, desired().tags);
        assert_eq!(model.id.as_deref(), Some(seeded.id.as_str()));
        assert_eq!(model.arn.as_deref(), Some(seeded.arn.as_str()));
        assert_eq!(model.version, Some(1));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (handlers, _store) = harness(SimulationSettings::default());
        let err = handlers.read("pl-00000000000000aa").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.operation(), OperationKind::Read);
    }
}
