//! Order-preserving chunking for combined transmission.

/// Iterator adapter yielding chunks of at most `size` items.
///
/// Lazily consumes a forward-only source one chunk at a time, so callers
/// may stop early without materializing the rest. The final chunk may be
/// shorter than `size`; a size of zero yields nothing.
pub struct Batched<I: Iterator> {
    source: Option<I>,
    size: usize,
}

impl<I: Iterator> Iterator for Batched<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source.as_mut()?;
        let chunk: Vec<I::Item> = source.by_ref().take(self.size).collect();
        if chunk.is_empty() {
            self.source = None;
            return None;
        }
        Some(chunk)
    }
}

/// Chunking extension for iterators.
pub trait BatchedExt: Iterator + Sized {
    /// Split this iterator into groups of at most `size`, preserving
    /// order. `size == 0` produces an empty sequence.
    fn batched(self, size: usize) -> Batched<Self> {
        Batched {
            source: if size == 0 { None } else { Some(self) },
            size,
        }
    }
}

impl<I: Iterator> BatchedExt for I {}
