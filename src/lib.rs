//! Write-buffer queue engine for a single-threaded, poll-driven TCP/IP stack.
//!
//! A connection accumulates outbound bytes in [`connection::Connection`],
//! which fragments them into MSS- and window-bounded segments, tracks their
//! acknowledgement, and retransmits on request. The lower TCP state machine
//! and link device are modeled behind the [`protocol::ProtocolLayer`] and
//! [`protocol::NetworkDevice`] traits so this crate can be exercised without
//! a real network stack.

pub mod config;
pub mod connection;
pub mod err;
pub mod flags;
pub mod iob;
pub mod protocol;
pub mod queue;
pub mod seq;
pub mod segment;

pub use config::EngineConfig;
pub use connection::{Connection, PollOutcome};
pub use err::EngineError;
pub use flags::EventFlags;
pub use iob::{BufferPool, FixedIobPool, IoChain};
pub use protocol::{LoopbackDevice, NetworkDevice, ProtocolLayer, StaticProtocolLayer};
pub use queue::SegmentQueue;
pub use segment::WriteBuffer;
