use tracing::{debug, info, instrument, warn};

use super::{with_computed, PrefixListHandlers};
use crate::context::{InvocationContext, UpdatePhase};
use crate::diff::diff_entries;
use crate::error::HandlerError;
use crate::progress::{Failure, OperationKind, ProgressSignal};
use crate::status::{classify, MutationKind, StatusOutcome};
use crate::store::ModifyRequest;
use crate::tags::TagPlan;
use crate::types::{PrefixList, Tag};

const OP: OperationKind = OperationKind::Update;

impl PrefixListHandlers {
    /// Converge an existing list on `desired`.
    ///
    /// Every invocation re-reads the list and re-checks the immutable fields.
    /// Tags are replaced first, then entries are modified in a single
    /// version-guarded call whose completion is polled.
    #[instrument(skip(self, desired, saved), fields(prefix_list_id))]
    pub async fn update(
        &self,
        desired: &PrefixList,
        saved: Option<InvocationContext>,
    ) -> Result<ProgressSignal<PrefixList>, HandlerError> {
        let mut context = InvocationContext::resume(saved);
        let id = context
            .resource_id()
            .or(desired.id.as_deref())
            .ok_or(HandlerError::MissingResourceId { operation: OP })?
            .to_string();
        tracing::Span::current().record("prefix_list_id", id.as_str());
        context.record_resource_id(id.as_str());

        let observed = self
            .store
            .describe(&id)
            .await
            .map_err(|e| HandlerError::from_remote(OP, Some(&id), e))?;

        if observed.max_entries != desired.max_entries
            || observed.address_family != desired.address_family
        {
            warn!(
                current_max_entries = observed.max_entries,
                desired_max_entries = desired.max_entries,
                current_family = %observed.address_family,
                desired_family = %desired.address_family,
                "Immutable field change rejected"
            );
            return Ok(ProgressSignal::Failed(Failure::not_updatable(OP, Some(id))));
        }

        if context.update_phase() == UpdatePhase::NeedsTagSync {
            self.replace_tags(&id, &observed.tags, &desired.tags).await?;
            context.mark_tags_updated();
        }

        if context.update_phase() == UpdatePhase::NeedsEntrySync {
            let current = self.drain_entries(OP, &id).await?;
            let diff = diff_entries(&current, &desired.entries);
            let rename = observed.name != desired.name;

            if diff.is_empty() {
                if rename {
                    self.store
                        .modify(&ModifyRequest::rename(id.as_str(), desired.name.as_str()))
                        .await
                        .map_err(|e| HandlerError::from_remote(OP, Some(&id), e))?;
                    info!(name = %desired.name, "Renamed");
                } else {
                    debug!("Entries already converged");
                }
                return Ok(ProgressSignal::Done(with_computed(desired, &observed)));
            }

            let request = ModifyRequest {
                id: id.clone(),
                add_entries: diff.to_add,
                remove_entries: diff.to_remove,
                name: rename.then(|| desired.name.clone()),
                expected_version: Some(observed.version),
            };
            self.store
                .modify(&request)
                .await
                .map_err(|e| HandlerError::from_remote(OP, Some(&id), e))?;
            context.mark_mutation_started();
            info!(
                added = request.add_entries.len(),
                removed = request.remove_entries.len(),
                version = observed.version,
                "Entry modification issued"
            );
            return Ok(ProgressSignal::continue_now(context));
        }

        match classify(MutationKind::Modify, &observed.state) {
            StatusOutcome::Pending => Ok(self.poll_again(context)),
            StatusOutcome::Failed => {
                warn!(state = %observed.state, "Modify failed remotely");
                Ok(ProgressSignal::Failed(Failure::remote_status(
                    OP,
                    Some(id),
                    observed.state,
                )))
            }
            StatusOutcome::Success => {
                info!(version = observed.version, "Update complete");
                Ok(ProgressSignal::Done(with_computed(desired, &observed)))
            }
        }
    }

    async fn replace_tags(
        &self,
        id: &str,
        current: &[Tag],
        desired: &[Tag],
    ) -> Result<(), HandlerError> {
        let plan = TagPlan::new(current, desired);
        if plan.is_noop() {
            return Ok(());
        }
        if let Some(tags) = plan.tags_to_delete() {
            self.store
                .delete_tags(id, tags)
                .await
                .map_err(|e| HandlerError::from_remote(OP, Some(id), e))?;
        }
        if let Some(tags) = plan.tags_to_create() {
            self.store
                .create_tags(id, tags)
                .await
                .map_err(|e| HandlerError::from_remote(OP, Some(id), e))?;
        }
        debug!(
            deleted = plan.tags_to_delete().map_or(0, <[Tag]>::len),
            created = plan.tags_to_create().map_or(0, <[Tag]>::len),
            "Tags replaced"
        );
        Ok(())
    }
}
