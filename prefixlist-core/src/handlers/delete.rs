use tracing::{debug, info, instrument, warn};

use super::PrefixListHandlers;
use crate::context::{InvocationContext, MutationPhase};
use crate::error::HandlerError;
use crate::progress::{Failure, OperationKind, ProgressSignal};
use crate::status::{classify, MutationKind, StatusOutcome};
use crate::types::PrefixList;

const OP: OperationKind = OperationKind::Delete;

impl PrefixListHandlers {
    /// Start deleting on the first call, then poll until the id is gone.
    ///
    /// Only a `NotFound` from the poll completes the delete. Any other
    /// non-failed status keeps polling.
    #[instrument(skip(self, desired, saved), fields(prefix_list_id))]
    pub async fn delete(
        &self,
        desired: &PrefixList,
        saved: Option<InvocationContext>,
    ) -> Result<ProgressSignal<()>, HandlerError> {
        let mut context = InvocationContext::resume(saved);
        let id = context
            .resource_id()
            .or(desired.id.as_deref())
            .ok_or(HandlerError::MissingResourceId { operation: OP })?
            .to_string();
        tracing::Span::current().record("prefix_list_id", id.as_str());

        if context.mutation_phase() == MutationPhase::NotStarted {
            self.store
                .delete(&id)
                .await
                .map_err(|e| HandlerError::from_remote(OP, Some(&id), e))?;
            context.record_resource_id(id);
            context.mark_mutation_started();
            info!("Delete issued");
            return Ok(ProgressSignal::continue_now(context));
        }

        let observed = match self.store.describe(&id).await {
            Ok(observed) => observed,
            Err(e) if e.is_not_found() => {
                info!("Delete complete");
                return Ok(ProgressSignal::Done(()));
            }
            Err(e) => return Err(HandlerError::from_remote(OP, Some(&id), e)),
        };

        match classify(MutationKind::Delete, &observed.state) {
            StatusOutcome::Failed => {
                warn!(state = %observed.state, "Delete failed remotely");
                Ok(ProgressSignal::Failed(Failure::remote_status(
                    OP,
                    Some(id),
                    observed.state,
                )))
            }
            StatusOutcome::Pending | StatusOutcome::Success => {
                debug!(state = %observed.state, "Still present, polling");
                Ok(self.poll_again(context))
            }
        }
    }
}
