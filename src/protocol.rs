//! Narrow seams onto the collaborators this engine does not own: the TCP
//! state machine and header construction (`ProtocolLayer`) and the link
//! device (`NetworkDevice`). A real stack implements both against its own
//! connection and driver state; the reference implementations here exist so
//! the engine can be driven end to end in this crate's own tests and demos.

use std::net::IpAddr;

/// Read/write seam onto the owning TCP connection's protocol-layer state.
pub trait ProtocolLayer {
    /// Acknowledgement number carried by the segment that triggered this event.
    fn ackno(&self) -> u32;
    /// Maximum segment size negotiated for this connection.
    fn mss(&self) -> usize;
    /// Peer-advertised receive window, in bytes.
    fn winsize(&self) -> usize;
    /// Initial sequence number chosen at connection establishment.
    fn isn(&self) -> u32;
    /// `true` once the connection has completed its handshake.
    fn established(&self) -> bool;
    /// Overwrites the sequence number field of the next outgoing segment.
    /// Called immediately before a first transmission of a buffer, since an
    /// ACK-path update earlier in the same event may have left a stale value.
    fn set_sndseq(&mut self, seqno: u32);
}

/// Read/write seam onto the link-layer device for this connection's peer.
pub trait NetworkDevice {
    /// Wakes the driver for a poll cycle on behalf of `dest`.
    fn notify_tx_available(&mut self, dest: IpAddr);
    /// `true` if the device already has a resolved link-layer address for `dest`.
    fn arp_resolved(&self, dest: IpAddr) -> bool;
    /// `true` if this poll tick's single outbound slot was already claimed
    /// by another connection's transmission. A connection must not call
    /// `transmit` while this holds.
    fn slot_claimed(&self) -> bool;
    /// Hands `len` bytes of `payload` (starting at `offset`) to the device.
    fn transmit(&mut self, payload: &[u8], offset: usize, len: usize);
}

/// A [`ProtocolLayer`] whose fields are set directly by the caller, for
/// tests and demos that drive the engine without a real TCP state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProtocolLayer {
    pub ackno: u32,
    pub mss: usize,
    pub winsize: usize,
    pub isn: u32,
    pub established: bool,
    pub sndseq: u32,
}

impl ProtocolLayer for StaticProtocolLayer {
    fn ackno(&self) -> u32 {
        self.ackno
    }

    fn mss(&self) -> usize {
        self.mss
    }

    fn winsize(&self) -> usize {
        self.winsize
    }

    fn isn(&self) -> u32 {
        self.isn
    }

    fn established(&self) -> bool {
        self.established
    }

    fn set_sndseq(&mut self, seqno: u32) {
        self.sndseq = seqno;
    }
}

/// A [`NetworkDevice`] that records every transmission in memory and
/// reports every destination as ARP-resolved, for tests and demos.
#[derive(Debug, Default)]
pub struct LoopbackDevice {
    pub notified: Vec<IpAddr>,
    pub transmissions: Vec<Vec<u8>>,
    slot_claimed: bool,
}

impl NetworkDevice for LoopbackDevice {
    fn notify_tx_available(&mut self, dest: IpAddr) {
        self.notified.push(dest);
    }

    fn arp_resolved(&self, _dest: IpAddr) -> bool {
        true
    }

    fn slot_claimed(&self) -> bool {
        self.slot_claimed
    }

    fn transmit(&mut self, payload: &[u8], offset: usize, len: usize) {
        self.transmissions.push(payload[offset..offset + len].to_vec());
        self.slot_claimed = true;
    }
}

impl LoopbackDevice {
    /// Simulates the driver completing the outstanding transmission and
    /// freeing the device's single outbound slot for the next poll tick.
    pub fn reset_slot(&mut self) {
        self.slot_claimed = false;
    }
}
