use tracing::{info, instrument, warn};

use super::{with_computed, PrefixListHandlers};
use crate::context::{InvocationContext, MutationPhase};
use crate::error::HandlerError;
use crate::progress::{Failure, OperationKind, ProgressSignal};
use crate::status::{classify, MutationKind, StatusOutcome};
use crate::store::CreateRequest;
use crate::types::PrefixList;

const OP: OperationKind = OperationKind::Create;

impl PrefixListHandlers {
    /// Create the list on the first call, then poll until it settles.
    #[instrument(skip(self, desired, saved), fields(name = %desired.name, prefix_list_id))]
    pub async fn create(
        &self,
        desired: &PrefixList,
        saved: Option<InvocationContext>,
    ) -> Result<ProgressSignal<PrefixList>, HandlerError> {
        let mut context = InvocationContext::resume(saved);

        if context.mutation_phase() == MutationPhase::NotStarted {
            let request = CreateRequest {
                name: desired.name.clone(),
                max_entries: desired.max_entries,
                address_family: desired.address_family,
                entries: desired.entries.clone(),
                tags: desired.tags.clone(),
            };
            let created = self
                .store
                .create(&request)
                .await
                .map_err(|e| HandlerError::from_remote(OP, None, e))?;
            tracing::Span::current().record("prefix_list_id", created.id.as_str());

            context.record_resource_id(created.id.as_str());
            context.mark_mutation_started();
            info!(entries = desired.entries.len(), "Create issued");
            return Ok(ProgressSignal::continue_now(context));
        }

        let id = context
            .resource_id()
            .ok_or(HandlerError::MissingResourceId { operation: OP })?
            .to_string();
        tracing::Span::current().record("prefix_list_id", id.as_str());

        let observed = self
            .store
            .describe(&id)
            .await
            .map_err(|e| HandlerError::from_remote(OP, Some(&id), e))?;

        match classify(MutationKind::Create, &observed.state) {
            StatusOutcome::Pending => Ok(self.poll_again(context)),
            StatusOutcome::Failed => {
                warn!(state = %observed.state, "Create failed remotely");
                Ok(ProgressSignal::Failed(Failure::remote_status(
                    OP,
                    Some(id),
                    observed.state,
                )))
            }
            StatusOutcome::Success => {
                info!(version = observed.version, "Create complete");
                Ok(ProgressSignal::Done(with_computed(desired, &observed)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::error::RemoteError;
    use crate::memory::{RemoteCall, SimulationSettings};
    use crate::progress::FailureKind;
    use crate::status;
    use crate::types::Entry;

    #[tokio::test]
    async fn first_call_issues_create_and_continues_immediately() {
        let (handlers, store) = harness(SimulationSettings::default());

        let signal = handlers.create(&desired(), None).await.unwrap();
        let ProgressSignal::Continue {
            context,
            delay_seconds,
        } = signal
        else {
            panic!("expected continue, got {:?}", signal);
        };
        assert_eq!(delay_seconds, 0);
        assert!(context.mutation_started());
        let id = context.resource_id().unwrap();
        assert!(id.starts_with("pl-"));
        assert_eq!(
            store.calls().await,
            vec![RemoteCall::Create {
                name: "office".into()
            }]
        );
    }

    #[tokio::test]
    async fn pending_then_success() {
        let (handlers, store) = harness(SimulationSettings::default());
        let model = desired();

        let first = handlers.create(&model, None).await.unwrap();
        let context = first.context().cloned();

        let second = handlers.create(&model, context.clone()).await.unwrap();
        assert!(matches!(
            second,
            ProgressSignal::Continue { delay_seconds: 5, .. }
        ));

        let third = handlers.create(&model, context.clone()).await.unwrap();
        let ProgressSignal::Done(done) = third else {
            panic!("expected done, got {:?}", third);
        };
        assert_eq!(done.id.as_deref(), context.as_ref().and_then(|c| c.resource_id()));
        assert_eq!(done.version, Some(1));
        assert_eq!(done.owner_id.as_deref(), Some(store.settings().owner_id.as_str()));
        assert_eq!(done.entries, model.entries);
        assert!(done.arn.unwrap().ends_with(done.id.as_deref().unwrap()));
        assert_eq!(store.mutating_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_status_is_terminal() {
        let (handlers, store) = harness(SimulationSettings::default());
        let first = handlers.create(&desired(), None).await.unwrap();
        let context = first.context().cloned().unwrap();
        store
            .force_state(context.resource_id().unwrap(), status::CREATE_FAILED)
            .await
            .unwrap();

        let signal = handlers.create(&desired(), Some(context)).await.unwrap();
        let ProgressSignal::Failed(failure) = signal else {
            panic!("expected failure, got {:?}", signal);
        };
        assert_eq!(
            failure.kind,
            FailureKind::RemoteStatus {
                status: status::CREATE_FAILED.into()
            }
        );
        assert_eq!(failure.operation, OperationKind::Create);
    }

    #[tokio::test]
    async fn rejected_create_propagates() {
        let (handlers, _store) = harness(SimulationSettings::default());
        let too_many = desired().with_entries(
            (0..6).map(|i| Entry::bare(format!("10.0.0.{i}/32"))).collect(),
        );
        let err = handlers.create(&too_many, None).await.unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Remote {
                source: RemoteError::Rejected { .. },
                id: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn resumed_context_without_id_is_an_error() {
        let (handlers, _store) = harness(SimulationSettings::default());
        let mut context = InvocationContext::new();
        context.mark_mutation_started();
        let err = handlers.create(&desired(), Some(context)).await.unwrap_err();
        assert!(matches!(err, HandlerError::MissingResourceId { .. }));
    }
}
