use tracing::{info, instrument};

use super::{walk_error, PrefixListHandlers};
use crate::error::HandlerError;
use crate::pagination::drain_pages;
use crate::progress::{OperationKind, ProgressSignal};
use crate::types::PrefixList;

const OP: OperationKind = OperationKind::List;

impl PrefixListHandlers {
    /// Every list visible to the caller, each with its full entry set.
    /// Any failing page aborts the whole listing.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<ProgressSignal<Vec<PrefixList>>, HandlerError> {
        let store = &self.store;
        let observed = drain_pages(self.config.max_pages, move |token| async move {
            store.list_all(token.as_deref()).await
        })
        .await
        .map_err(|e| walk_error(OP, None, e))?;

        let mut models = Vec::with_capacity(observed.len());
        for list in &observed {
            let entries = self.drain_entries(OP, &list.id).await?;
            models.push(PrefixList::from_observed(list, entries));
        }

        info!(count = models.len(), "Listed prefix lists");
        Ok(ProgressSignal::Done(models))
    }
}
