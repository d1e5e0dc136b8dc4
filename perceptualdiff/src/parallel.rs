//! Row-parallel dispatch.
//!
//! Every parallel phase in the metric has the same shape: split a row-major
//! buffer into disjoint chunks, run a closure on each chunk, and wait for all
//! of them. With the `rayon` feature the chunks run on rayon's global pool;
//! without it they run in order on the calling thread. Results are identical
//! either way.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Runs `f(chunk_index, chunk)` over `chunk_len`-sized pieces of `data`.
///
/// The last chunk may be shorter. Blocks until every chunk is done.
pub(crate) fn for_each_chunk_mut<T, F>(data: &mut [T], chunk_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if data.is_empty() {
        return;
    }
    let chunk_len = chunk_len.max(1);

    #[cfg(feature = "rayon")]
    data.par_chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(i, chunk)| f(i, chunk));

    #[cfg(not(feature = "rayon"))]
    data.chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(i, chunk)| f(i, chunk));
}

/// Like [`for_each_chunk_mut`], but collects one value per chunk, in chunk
/// order.
pub(crate) fn map_chunks_mut<T, R, F>(data: &mut [T], chunk_len: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(usize, &mut [T]) -> R + Sync + Send,
{
    if data.is_empty() {
        return Vec::new();
    }
    let chunk_len = chunk_len.max(1);

    #[cfg(feature = "rayon")]
    let out = data
        .par_chunks_mut(chunk_len)
        .enumerate()
        .map(|(i, chunk)| f(i, chunk))
        .collect();

    #[cfg(not(feature = "rayon"))]
    let out = data
        .chunks_mut(chunk_len)
        .enumerate()
        .map(|(i, chunk)| f(i, chunk))
        .collect();

    out
}

/// Evaluates `f(i)` for every `i` in `0..n`, returning results in index order.
pub(crate) fn map_range<R, F>(n: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    #[cfg(feature = "rayon")]
    let out = (0..n).into_par_iter().map(f).collect();

    #[cfg(not(feature = "rayon"))]
    let out = (0..n).map(f).collect();

    out
}
