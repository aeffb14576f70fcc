use crate::err::EngineError;
use crate::iob::{BufferPool, IoChain};

/// A unit of user bytes copied into the engine and tracked until acknowledged.
///
/// Exclusively owned by at most one queue (`write_q` or `unacked_q`) at a
/// time; moving between queues transfers ownership rather than aliasing it.
pub struct WriteBuffer {
    iob: IoChain,
    /// Sequence number of the first byte still held, assigned at first
    /// transmission attempt. `None` is this crate's sentinel for "unassigned".
    pub seqno: Option<u32>,
    /// Bytes of this buffer already handed to the device since the last
    /// retransmission reset.
    pub sent: usize,
    /// Retransmission counter.
    pub nrtx: u8,
}

impl WriteBuffer {
    /// Allocates an empty buffer from `pool`.
    pub fn alloc(pool: &impl BufferPool) -> Result<Self, EngineError> {
        Ok(Self {
            iob: pool.alloc()?,
            seqno: None,
            sent: 0,
            nrtx: 0,
        })
    }

    /// Copies `bytes` into the backing chain.
    pub fn copy_in(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        self.iob.copy_in(bytes)
    }

    pub fn pktlen(&self) -> usize {
        self.iob.len()
    }

    pub fn payload(&self) -> &[u8] {
        self.iob.as_bytes()
    }

    /// Bytes of this buffer not yet handed to the device.
    pub fn remaining(&self) -> usize {
        self.pktlen() - self.sent
    }

    /// Drops the first `k` bytes from the chain, advancing `seqno` (if
    /// assigned) and retreating `sent` by the same amount.
    pub fn trim_head(&mut self, k: usize) {
        if k == 0 {
            return;
        }
        self.iob.trim_head(k);
        if let Some(seqno) = self.seqno.as_mut() {
            *seqno = seqno.wrapping_add(k as u32);
        }
        self.sent = self.sent.saturating_sub(k);
    }

    /// The sequence number one past the last byte currently held, if the
    /// buffer has been assigned a `seqno`.
    pub fn lastseq(&self) -> Option<u32> {
        self.seqno.map(|s| s.wrapping_add(self.pktlen() as u32))
    }
}
