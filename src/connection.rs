use std::net::{IpAddr, Ipv4Addr};

use tracing::{debug, trace};

use crate::err::EngineError;
use crate::flags::EventFlags;
use crate::iob::BufferPool;
use crate::protocol::{NetworkDevice, ProtocolLayer};
use crate::queue::SegmentQueue;
use crate::seq::{wrapping_le, wrapping_lt};
use crate::EngineConfig;

/// Event subscription a connection holds with the protocol layer. Detached
/// during teardown so in-flight events delivered after loss become no-ops.
#[derive(Debug, Clone, Copy)]
struct Subscription {
    mask: EventFlags,
    attached: bool,
}

impl Default for Subscription {
    fn default() -> Self {
        Self { mask: EventFlags::empty(), attached: false }
    }
}

/// Result of a single [`Connection::on_event`] invocation.
#[derive(Debug, Clone, Copy)]
pub struct PollOutcome {
    /// The flags the caller passed in, with `POLL` cleared if a segment was
    /// emitted this invocation.
    pub flags: EventFlags,
    /// `true` if this event tore the connection's send state down.
    pub lost: bool,
}

/// Engine-visible state for one TCP connection's write path: the two
/// segment queues, their flow-control counters, and the event subscription
/// that drives them. Generic over the buffer pool so tests can swap in a
/// small pool without pulling in the engine's default sizing.
pub struct Connection<P: BufferPool> {
    write_q: SegmentQueue,
    unacked_q: SegmentQueue,
    /// Bytes transmitted and not yet acknowledged.
    unacked_bytes: usize,
    /// Cumulative bytes enqueued into the stream since the connection's ISN.
    sent_bytes: usize,
    /// Segments dropped after exhausting their retransmission budget.
    expired: u64,
    peer: IpAddr,
    pool: P,
    config: EngineConfig,
    subscription: Subscription,
}

impl<P: BufferPool> Connection<P> {
    pub fn new(peer: IpAddr, pool: P, config: EngineConfig) -> Self {
        Self {
            write_q: SegmentQueue::new(),
            unacked_q: SegmentQueue::new(),
            unacked_bytes: 0,
            sent_bytes: 0,
            expired: 0,
            peer,
            pool,
            config,
            subscription: Subscription::default(),
        }
    }

    pub fn unacked(&self) -> usize {
        self.unacked_bytes
    }

    pub fn sent(&self) -> usize {
        self.sent_bytes
    }

    pub fn expired(&self) -> u64 {
        self.expired
    }

    pub fn write_q_len(&self) -> usize {
        self.write_q.len()
    }

    pub fn unacked_q_len(&self) -> usize {
        self.unacked_q.len()
    }

    /// Copies `bytes` into a freshly allocated buffer and appends it to
    /// `write_q`. Returns the number of bytes accepted (always `bytes.len()`
    /// on success, since partial acceptance is not a concept at this layer).
    pub fn send(&mut self, bytes: &[u8], dev: &mut impl NetworkDevice) -> Result<usize, EngineError> {
        if bytes.is_empty() {
            return Ok(0);
        }

        if !self.subscription.attached {
            self.subscription.mask = EventFlags::ACK
                | EventFlags::REXMIT
                | EventFlags::POLL
                | EventFlags::CLOSE
                | EventFlags::ABORT
                | EventFlags::TIMEDOUT;
            self.subscription.attached = true;
        }

        let mut w = crate::segment::WriteBuffer::alloc(&self.pool)?;
        w.copy_in(bytes)?;
        self.write_q.enqueue_tail(w);
        trace!(len = bytes.len(), "enqueued write buffer");
        dev.notify_tx_available(self.peer);
        Ok(bytes.len())
    }

    /// Dispatches one poll/interrupt occasion. Always called with exclusive
    /// access to this connection; never suspends.
    pub fn on_event(
        &mut self,
        flags: EventFlags,
        proto: &mut impl ProtocolLayer,
        dev: &mut impl NetworkDevice,
    ) -> PollOutcome {
        if flags.contains(EventFlags::ACK) {
            self.apply_ack(proto.ackno());
        }

        if flags.is_loss() {
            debug!(?flags, "connection lost, tearing down send state");
            self.teardown();
            return PollOutcome { flags, lost: true };
        }

        if flags.contains(EventFlags::REXMIT) {
            self.process_rexmit();
        }

        let out_flags = self.try_transmit(flags, proto, dev);
        PollOutcome { flags: out_flags, lost: false }
    }

    fn apply_ack(&mut self, ackno: u32) {
        while let Some(front) = self.unacked_q.head() {
            let Some(seqno) = front.seqno else { break };
            if !wrapping_lt(seqno, ackno) {
                // ordered_insert keeps unacked_q ascending by seqno, so once
                // one buffer is unreachable by this ack, so is everything
                // after it.
                break;
            }
            let lastseq = front.lastseq().expect("assigned seqno implies lastseq");
            if wrapping_le(lastseq, ackno) {
                let w = self.unacked_q.pop_head().expect("front checked above");
                trace!(seqno, "buffer fully acknowledged");
                drop(w);
                continue;
            }
            // ackno falls strictly inside this buffer: trim and stop, since
            // unacked_q is ordered and nothing past this buffer can be acked.
            let trimlen = (ackno.wrapping_sub(seqno) as usize).min(front.sent);
            let w = self.unacked_q.head_mut().expect("front checked above");
            w.trim_head(trimlen);
            w.seqno = Some(ackno);
            break;
        }

        if let Some(w) = self.write_q.head_mut() {
            if w.sent > 0 {
                if let Some(seqno) = w.seqno {
                    if wrapping_lt(seqno, ackno) {
                        let nacked = (ackno.wrapping_sub(seqno) as usize).min(w.sent);
                        w.trim_head(nacked);
                        w.seqno = Some(ackno);
                    }
                }
            }
        }
    }

    fn process_rexmit(&mut self) {
        let max_rtx = self.config.max_rtx;

        if let Some(w) = self.write_q.head_mut() {
            if w.sent > 0 {
                let sent = w.sent;
                self.unacked_bytes = self.unacked_bytes.saturating_sub(sent);
                self.sent_bytes = self.sent_bytes.saturating_sub(sent);
                w.sent = 0;
                w.nrtx += 1;
                if w.nrtx >= max_rtx {
                    let expired = self.write_q.pop_head().expect("head checked above");
                    debug!(nrtx = expired.nrtx, "write_q head expired on rexmit");
                    drop(expired);
                    self.expired += 1;
                }
            }
        }

        while let Some(mut w) = self.unacked_q.pop_tail() {
            let sent = w.sent;
            self.unacked_bytes = self.unacked_bytes.saturating_sub(sent);
            self.sent_bytes = self.sent_bytes.saturating_sub(sent);
            w.sent = 0;
            w.nrtx += 1;
            if w.nrtx >= max_rtx {
                debug!(seqno = ?w.seqno, "unacked buffer expired on rexmit");
                drop(w);
                self.expired += 1;
            } else {
                self.write_q.ordered_insert(w);
            }
        }
    }

    fn try_transmit(
        &mut self,
        flags: EventFlags,
        proto: &mut impl ProtocolLayer,
        dev: &mut impl NetworkDevice,
    ) -> EventFlags {
        let mut flags = flags;

        // the device's single outbound slot may already be claimed by
        // another connection's transmission this same poll tick.
        if dev.slot_claimed() {
            return flags;
        }
        if !proto.established() {
            return flags;
        }
        if !(flags.contains(EventFlags::POLL) || flags.contains(EventFlags::REXMIT)) {
            return flags;
        }
        if self.write_q.is_empty() {
            return flags;
        }
        if !dev.arp_resolved(self.peer) {
            return flags;
        }

        let full = {
            let mss = proto.mss();
            let winsize = proto.winsize();
            let w = self.write_q.head_mut().expect("checked non-empty above");
            let sndlen = w.remaining().min(mss).min(winsize);
            if sndlen == 0 {
                return flags;
            }

            if w.sent == 0 {
                if w.seqno.is_none() {
                    w.seqno = Some(proto.isn().wrapping_add(self.sent_bytes as u32));
                }
                // overwrite sndseq here: the ack path above may already have
                // advanced it for a different buffer this same event.
                proto.set_sndseq(w.seqno.expect("just assigned"));
            }

            let offset = w.sent;
            dev.transmit(w.payload(), offset, sndlen);
            self.unacked_bytes += sndlen;
            self.sent_bytes += sndlen;
            w.sent += sndlen;
            w.sent == w.pktlen()
        };

        if full {
            let w = self.write_q.pop_head().expect("just transmitted from head");
            trace!(seqno = ?w.seqno, "buffer fully transmitted, moving to unacked_q");
            self.unacked_q.ordered_insert(w);
        }

        flags.remove(EventFlags::POLL);
        flags
    }

    fn teardown(&mut self) {
        self.subscription.mask = EventFlags::empty();
        self.subscription.attached = false;
        for w in self.unacked_q.drain_all() {
            drop(w);
        }
        for w in self.write_q.drain_all() {
            drop(w);
        }
        self.sent_bytes = 0;
    }
}
