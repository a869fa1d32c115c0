//! Splits a selected frontier into contiguous worker chunks

/// Splits `items` into chunks of `ceil(len / workers)` elements
///
/// Chunks are contiguous and in order, so concatenating them reproduces the
/// input. Returns fewer than `workers` chunks when there are not enough items
/// to fill them, and no chunks for an empty input.
pub fn partition<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }

    let chunk_size = items.len().div_ceil(workers.max(1));
    let mut chunks = Vec::with_capacity(workers.max(1));
    let mut remaining = items.into_iter().peekable();

    while remaining.peek().is_some() {
        chunks.push(remaining.by_ref().take(chunk_size).collect());
    }

    chunks
}
