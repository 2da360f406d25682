use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{Res, backup::LibrarySource, info, types::Page};

/// Pause between two consecutive page requests. Keeps a full library walk under
/// the per-credential rate limit.
pub const PAGE_DELAY: Duration = Duration::from_millis(100);

/// Collects every item of a paginated collection, starting from its first page.
///
/// Pages are requested one after another in cursor order and their items are
/// appended in arrival order. Nothing is deduplicated. With `fast_mode` set the
/// first page's items are returned as they are and no further page is ever
/// requested.
///
/// Errors from [`LibrarySource::next_page`] are returned unchanged; this layer
/// does not retry.
pub async fn fetch_all<S, T>(source: &mut S, first: Page<T>, fast_mode: bool) -> Res<Vec<T>>
where
    S: LibrarySource,
    T: DeserializeOwned,
{
    let mut page = first;
    let mut items = std::mem::take(&mut page.items);

    if fast_mode {
        if page.has_next() {
            info!("   [Test Mode] Skipping pagination to save time.");
        }
        return Ok(items);
    }

    while page.has_next() {
        info!("   ...fetching next batch (Total so far: {})", items.len());
        page = source.next_page(&page).await?;
        items.append(&mut page.items);
        sleep(PAGE_DELAY).await;
    }

    Ok(items)
}
