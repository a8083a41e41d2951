//! Cursor walker for token-paginated listings.

use std::future::Future;

use crate::types::Page;

/// Why a walk stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkError<E> {
    /// A page request failed; the partial result is discarded.
    Fetch(E),
    /// The backend kept returning tokens past the page cap.
    LimitExceeded(usize),
}

/// Fetch pages until the returned token is absent or empty, concatenating
/// items in page order. The first request carries no token.
pub async fn drain_pages<T, E, F, Fut>(max_pages: usize, mut fetch: F) -> Result<Vec<T>, WalkError<E>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;

    for _ in 0..max_pages {
        let page = fetch(token.take()).await.map_err(WalkError::Fetch)?;
        items.extend(page.items);
        match page.next_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => return Ok(items),
        }
    }

    Err(WalkError::LimitExceeded(max_pages))
}
