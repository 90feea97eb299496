use crate::foundation::core::{FrameIndex, FrameRange};
use crate::frame_cache::frame::CachedFrame;
use std::collections::BTreeMap;

/// A run of consecutive cached frames, as reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBlock {
    /// First frame of the run.
    pub start: FrameIndex,
    /// Number of frames in the run (always > 0).
    pub len: u64,
}

impl FrameBlock {
    /// The frames covered, as `[start, start + len)`.
    pub fn range(self) -> FrameRange {
        FrameRange {
            start: self.start,
            end: FrameIndex(self.start.0 + self.len),
        }
    }
}

/// Ordered, non-overlapping runs of cached frames.
///
/// Keyed by block start. Adjacent blocks are always merged, so two blocks never touch.
#[derive(Debug, Default)]
pub struct FrameCacheStore {
    blocks: BTreeMap<u64, Vec<CachedFrame>>,
}

impl FrameCacheStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn block_containing(&self, frame: u64) -> Option<(u64, &Vec<CachedFrame>)> {
        self.blocks
            .range(..=frame)
            .next_back()
            .filter(|(start, frames)| frame < *start + frames.len() as u64)
            .map(|(start, frames)| (*start, frames))
    }

    /// Cached frame, if present.
    pub fn get(&self, frame: FrameIndex) -> Option<&CachedFrame> {
        let (start, frames) = self.block_containing(frame.0)?;
        frames.get((frame.0 - start) as usize)
    }

    /// Return `true` when `frame` is cached.
    pub fn contains(&self, frame: FrameIndex) -> bool {
        self.block_containing(frame.0).is_some()
    }

    /// Insert or replace a frame, joining it with the blocks it touches.
    pub fn set(&mut self, frame: FrameIndex, cached: CachedFrame) {
        let f = frame.0;
        if let Some((start, _)) = self.block_containing(f) {
            if let Some(frames) = self.blocks.get_mut(&start) {
                frames[(f - start) as usize] = cached;
            }
            return;
        }

        let following = f.checked_add(1).and_then(|next| self.blocks.remove(&next));
        let preceding = self
            .blocks
            .range(..f)
            .next_back()
            .filter(|(start, frames)| *start + frames.len() as u64 == f)
            .map(|(start, _)| *start);

        match preceding {
            Some(start) => {
                if let Some(frames) = self.blocks.get_mut(&start) {
                    frames.push(cached);
                    frames.extend(following.unwrap_or_default());
                }
            }
            None => {
                let mut frames = vec![cached];
                frames.extend(following.unwrap_or_default());
                self.blocks.insert(f, frames);
            }
        }
    }

    /// Drop every frame inside `range`, shrinking or splitting blocks that straddle its ends.
    /// Returns the number of frames dropped.
    pub fn delete_range(&mut self, range: FrameRange) -> usize {
        if range.is_empty() {
            return 0;
        }
        let (lo, hi) = (range.start.0, range.end.0);

        // Block ends ascend with their starts, so scanning back from `hi` can stop at the first
        // block ending at or before `lo`.
        let hit: Vec<u64> = self
            .blocks
            .range(..hi)
            .rev()
            .take_while(|(start, frames)| *start + frames.len() as u64 > lo)
            .map(|(start, _)| *start)
            .collect();

        let mut dropped = 0;
        for start in hit {
            let Some(mut frames) = self.blocks.remove(&start) else {
                continue;
            };
            let end = start + frames.len() as u64;

            if end > hi {
                let tail = frames.split_off((hi - start) as usize);
                self.blocks.insert(hi, tail);
            }
            let keep = lo.saturating_sub(start) as usize;
            dropped += frames.len() - keep;
            frames.truncate(keep);
            if !frames.is_empty() {
                self.blocks.insert(start, frames);
            }
        }
        dropped
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Current runs in frame order.
    pub fn blocks(&self) -> Vec<FrameBlock> {
        self.blocks
            .iter()
            .map(|(start, frames)| FrameBlock {
                start: FrameIndex(*start),
                len: frames.len() as u64,
            })
            .collect()
    }

    /// Number of runs.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of cached frames.
    pub fn frame_count(&self) -> usize {
        self.blocks.values().map(Vec::len).sum()
    }

    /// Bytes held by cached frames.
    pub fn byte_len(&self) -> usize {
        self.blocks
            .values()
            .flatten()
            .map(CachedFrame::byte_len)
            .sum()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame_cache/block.rs"]
mod tests;
