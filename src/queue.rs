use std::collections::VecDeque;

use crate::segment::WriteBuffer;

/// A queue of [`WriteBuffer`]s. Used both as `write_q` (FIFO, mutated only
/// through [`SegmentQueue::enqueue_tail`]/[`SegmentQueue::pop_head`]) and as
/// `unacked_q` (kept ascending by `seqno`, mutated only through
/// [`SegmentQueue::ordered_insert`]).
#[derive(Default)]
pub struct SegmentQueue {
    buffers: VecDeque<WriteBuffer>,
}

impl SegmentQueue {
    pub fn new() -> Self {
        Self { buffers: VecDeque::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn enqueue_tail(&mut self, w: WriteBuffer) {
        self.buffers.push_back(w);
    }

    pub fn pop_head(&mut self) -> Option<WriteBuffer> {
        self.buffers.pop_front()
    }

    pub fn head(&self) -> Option<&WriteBuffer> {
        self.buffers.front()
    }

    pub fn head_mut(&mut self) -> Option<&mut WriteBuffer> {
        self.buffers.front_mut()
    }

    pub fn pop_tail(&mut self) -> Option<WriteBuffer> {
        self.buffers.pop_back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WriteBuffer> {
        self.buffers.iter()
    }

    /// Removes and returns every buffer held, in FIFO order, emptying the queue.
    pub fn drain_all(&mut self) -> impl Iterator<Item = WriteBuffer> + '_ {
        self.buffers.drain(..)
    }

    /// Places `w` so that every predecessor has a strictly smaller `seqno`
    /// and every successor has a `seqno` greater than or equal to `w`'s.
    /// Buffers without an assigned `seqno` are treated as sorting after
    /// every assigned one (they belong at the tail of `write_q` and never
    /// appear in `unacked_q`).
    pub fn ordered_insert(&mut self, w: WriteBuffer) {
        let key = w.seqno;
        let pos = self
            .buffers
            .iter()
            .position(|existing| match (key, existing.seqno) {
                (Some(k), Some(e)) => k < e,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .unwrap_or(self.buffers.len());
        self.buffers.insert(pos, w);
    }

    /// `true` if every entry's `seqno` is non-decreasing and non-overlapping
    /// with its successor. Used by tests to assert the ordering invariant
    /// after every mutation.
    pub fn is_ordered(&self) -> bool {
        self.buffers.iter().zip(self.buffers.iter().skip(1)).all(|(a, b)| {
            match (a.seqno, a.lastseq(), b.seqno) {
                (Some(_), Some(end_a), Some(start_b)) => end_a <= start_b,
                _ => true,
            }
        })
    }
}
