use bitflags::bitflags;

bitflags! {
    /// Event flags delivered to [`crate::connection::Connection::on_event`] by
    /// the protocol layer on each poll or interrupt occasion.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventFlags: u16 {
        /// New data has been acknowledged.
        const ACK      = 0b0000_0001;
        /// The peer or timer has requested a retransmission.
        const REXMIT   = 0b0000_0010;
        /// A transmit opportunity on the device; no other event occurred.
        const POLL     = 0b0000_0100;
        /// Connection is being closed gracefully.
        const CLOSE    = 0b0000_1000;
        /// Connection was aborted (RST).
        const ABORT    = 0b0001_0000;
        /// Connection timed out.
        const TIMEDOUT = 0b0010_0000;
    }
}

impl EventFlags {
    /// True if any of the loss-signalling flags are set.
    pub fn is_loss(self) -> bool {
        self.intersects(EventFlags::CLOSE | EventFlags::ABORT | EventFlags::TIMEDOUT)
    }
}
