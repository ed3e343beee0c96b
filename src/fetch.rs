//! Bounded-batch retrieval over a page-capped store.
//!
//! The backing store caps every request at a fixed row count, so "all calls
//! for these employees" is a sequence of offset pages and "all recordings for
//! these call ids" is a sequence of id-list batches. Both loops share the
//! partial-result policy: a failed request is logged, the loop stops (or the
//! batch is skipped), and whatever accumulated so far flows downstream with
//! `complete = false`. Availability over completeness: the report renders
//! from partial data rather than failing outright, and the flag lets callers
//! tell the two apart.

use crate::store::StoreError;

/// Page size for unfiltered scans over an id set (the store's per-request
/// row cap).
pub const CALL_PAGE_SIZE: usize = 1000;

/// Batch size when the filter itself is an id list, keeping request payloads
/// bounded.
pub const ID_BATCH_SIZE: usize = 200;

/// A fetch result plus whether every page/batch succeeded.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub records: Vec<T>,
    pub complete: bool,
}

impl<T> Fetched<T> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            complete: true,
        }
    }
}

/// Drain a paged source. Pages are requested sequentially; page N+1 only
/// exists if page N came back full, so the exhaustion check (a short page)
/// requires the previous page's length.
///
/// On a page error the loop stops and returns what accumulated so far with
/// `complete = false`.
pub fn fetch_paged<T, F>(label: &str, page_size: usize, mut page_fn: F) -> Fetched<T>
where
    F: FnMut(usize, usize) -> Result<Vec<T>, StoreError>,
{
    let mut records: Vec<T> = Vec::new();
    let mut offset = 0;

    loop {
        match page_fn(offset, page_size) {
            Ok(page) => {
                let len = page.len();
                records.extend(page);
                if len < page_size {
                    break;
                }
                offset += page_size;
            }
            Err(err) => {
                log::warn!(
                    "{label}: page fetch failed at offset {offset}, \
                     continuing with {} records: {err}",
                    records.len()
                );
                return Fetched {
                    records,
                    complete: false,
                };
            }
        }
    }

    log::debug!("{label}: fetched {} records", records.len());
    Fetched {
        records,
        complete: true,
    }
}

/// Fetch records keyed by membership in `ids`, one store request per
/// `batch_size` chunk, concatenating results. A failed chunk is logged and
/// skipped; later chunks still run (each chunk is independent).
pub fn fetch_id_batched<T, F>(label: &str, ids: &[String], batch_size: usize, mut fetch_fn: F) -> Fetched<T>
where
    F: FnMut(&[String]) -> Result<Vec<T>, StoreError>,
{
    let mut records: Vec<T> = Vec::new();
    let mut complete = true;

    for batch in ids.chunks(batch_size) {
        match fetch_fn(batch) {
            Ok(found) => records.extend(found),
            Err(err) => {
                log::warn!("{label}: id batch of {} failed, skipping: {err}", batch.len());
                complete = false;
            }
        }
    }

    log::debug!(
        "{label}: fetched {} records for {} ids",
        records.len(),
        ids.len()
    );
    Fetched { records, complete }
}
