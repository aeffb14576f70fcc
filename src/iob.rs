//! A fixed-capacity pool of byte-chain nodes backing [`crate::segment::WriteBuffer`]
//! payloads, standing in for the embedded stack's `iob` pool: no allocator,
//! a bounded node budget, chains returned to the pool on drop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::err::EngineError;

/// Allocates [`IoChain`] handles against a bounded node budget.
pub trait BufferPool {
    fn alloc(&self) -> Result<IoChain, EngineError>;
}

struct PoolState {
    node_capacity: usize,
    free_nodes: AtomicUsize,
}

/// Reference [`BufferPool`] implementation: a process-wide node counter,
/// no real slab, since the engine only needs the accounting discipline to
/// be testable, not a zero-copy allocator.
#[derive(Clone)]
pub struct FixedIobPool {
    state: Arc<PoolState>,
}

impl FixedIobPool {
    pub fn new(pool_capacity: usize, node_capacity: usize) -> Self {
        Self {
            state: Arc::new(PoolState {
                node_capacity,
                free_nodes: AtomicUsize::new(pool_capacity),
            }),
        }
    }
}

impl BufferPool for FixedIobPool {
    fn alloc(&self) -> Result<IoChain, EngineError> {
        Ok(IoChain {
            data: Vec::new(),
            nodes_held: 0,
            state: Arc::clone(&self.state),
        })
    }
}

/// An owned, pool-backed byte chain. Dropping it returns every node it
/// held to the pool's free list.
pub struct IoChain {
    data: Vec<u8>,
    nodes_held: usize,
    state: Arc<PoolState>,
}

fn nodes_for(byte_len: usize, node_capacity: usize) -> usize {
    if byte_len == 0 {
        0
    } else {
        (byte_len + node_capacity - 1) / node_capacity
    }
}

impl IoChain {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Appends `bytes`, reserving additional pool nodes as needed.
    pub fn copy_in(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        let wanted = nodes_for(self.data.len() + bytes.len(), self.state.node_capacity);
        let extra = wanted.saturating_sub(self.nodes_held);
        if extra > 0 {
            self.reserve_nodes(extra)?;
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Drops the first `k` bytes, returning any pool nodes no longer needed.
    pub fn trim_head(&mut self, k: usize) {
        let k = k.min(self.data.len());
        self.data.drain(0..k);
        let wanted = nodes_for(self.data.len(), self.state.node_capacity);
        let freed = self.nodes_held.saturating_sub(wanted);
        if freed > 0 {
            self.state.free_nodes.fetch_add(freed, Ordering::AcqRel);
            self.nodes_held -= freed;
        }
    }

    fn reserve_nodes(&mut self, count: usize) -> Result<(), EngineError> {
        let mut current = self.state.free_nodes.load(Ordering::Acquire);
        loop {
            if current < count {
                return Err(EngineError::NoMemory);
            }
            match self.state.free_nodes.compare_exchange_weak(
                current,
                current - count,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.nodes_held += count;
                    return Ok(());
                }
                Err(observed) => current = observed,
            }
        }
    }
}

impl Drop for IoChain {
    fn drop(&mut self) {
        if self.nodes_held > 0 {
            self.state.free_nodes.fetch_add(self.nodes_held, Ordering::AcqRel);
        }
    }
}
