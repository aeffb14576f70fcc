use std::net::{IpAddr, Ipv4Addr};

use sendbuf::{
    Connection, EngineConfig, EventFlags, FixedIobPool, LoopbackDevice, PollOutcome, StaticProtocolLayer,
};

fn peer() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))
}

fn harness(mss: usize, winsize: usize, isn: u32) -> (Connection<FixedIobPool>, StaticProtocolLayer, LoopbackDevice) {
    let config = EngineConfig::default();
    let pool = FixedIobPool::new(config.pool_capacity, config.node_capacity);
    let conn = Connection::new(peer(), pool, config);
    let proto = StaticProtocolLayer {
        mss,
        winsize,
        isn,
        established: true,
        ..Default::default()
    };
    (conn, proto, LoopbackDevice::default())
}

/// Starts a new poll tick (freeing the device's outbound slot, as the
/// driver would once the prior tick's transmission went out) and dispatches
/// `flags` through it.
fn tick(
    conn: &mut Connection<FixedIobPool>,
    flags: EventFlags,
    proto: &mut StaticProtocolLayer,
    dev: &mut LoopbackDevice,
) -> PollOutcome {
    dev.reset_slot();
    conn.on_event(flags, proto, dev)
}

/// S1 - happy path, single segment.
#[test]
fn s1_single_segment_happy_path() {
    let (mut conn, mut proto, mut dev) = harness(1460, 65535, 1000);

    conn.send(b"HELLO", &mut dev).unwrap();
    let outcome = tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    assert!(!outcome.flags.contains(EventFlags::POLL));
    assert_eq!(dev.transmissions, vec![b"HELLO".to_vec()]);
    assert_eq!(conn.unacked_q_len(), 1);
    assert_eq!(conn.write_q_len(), 0);

    proto.ackno = 1005;
    tick(&mut conn, EventFlags::ACK, &mut proto, &mut dev);

    assert_eq!(conn.write_q_len(), 0);
    assert_eq!(conn.unacked_q_len(), 0);
    assert_eq!(conn.sent(), 5);
}

/// S2 - fragmentation by MSS.
#[test]
fn s2_fragmentation_by_mss() {
    let (mut conn, mut proto, mut dev) = harness(4, 65535, 0);

    conn.send(b"ABCDEFGHIJ", &mut dev).unwrap();

    tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    assert_eq!(dev.transmissions.last().unwrap(), b"ABCD");
    assert_eq!(conn.write_q_len(), 1);

    tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    assert_eq!(dev.transmissions.last().unwrap(), b"EFGH");
    assert_eq!(conn.write_q_len(), 1);

    tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    assert_eq!(dev.transmissions.last().unwrap(), b"IJ");
    assert_eq!(conn.write_q_len(), 0);
    assert_eq!(conn.unacked_q_len(), 1);

    proto.ackno = 10;
    tick(&mut conn, EventFlags::ACK, &mut proto, &mut dev);
    assert_eq!(conn.unacked_q_len(), 0);
}

/// S3 - partial ACK trims the head of unacked_q.
#[test]
fn s3_partial_ack_trims_head() {
    let (mut conn, mut proto, mut dev) = harness(4, 65535, 0);

    conn.send(b"ABCDEFGHIJ", &mut dev).unwrap();
    for _ in 0..3 {
        tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    }
    assert_eq!(conn.unacked_q_len(), 1);

    proto.ackno = 4;
    tick(&mut conn, EventFlags::ACK, &mut proto, &mut dev);
    assert_eq!(conn.unacked_q_len(), 1);

    proto.ackno = 10;
    tick(&mut conn, EventFlags::ACK, &mut proto, &mut dev);
    assert_eq!(conn.unacked_q_len(), 0);
}

/// S4 - window-bounded transmission.
#[test]
fn s4_window_bounded_transmission() {
    let (mut conn, mut proto, mut dev) = harness(1460, 3, 0);

    conn.send(b"ABCDE", &mut dev).unwrap();

    tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    assert_eq!(dev.transmissions.last().unwrap(), b"ABC");
    assert_eq!(conn.write_q_len(), 1, "buffer not fully sent yet, stays in write_q");
    assert_eq!(conn.unacked_q_len(), 0);

    tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    assert_eq!(dev.transmissions.last().unwrap(), b"DE");
    assert_eq!(conn.write_q_len(), 0);
    assert_eq!(conn.unacked_q_len(), 1);
}

/// S5 - REXMIT reorders buffers by seqno.
#[test]
fn s5_rexmit_reorders_by_seqno() {
    let (mut conn, mut proto, mut dev) = harness(4, 65535, 100);

    conn.send(b"AAAA", &mut dev).unwrap();
    tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    conn.send(b"BBBB", &mut dev).unwrap();
    tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);

    assert_eq!(conn.unacked_q_len(), 2);
    assert_eq!(conn.write_q_len(), 0);

    dev.transmissions.clear();
    tick(&mut conn, EventFlags::REXMIT, &mut proto, &mut dev);
    // the rexmit handler reorders both buffers into write_q (A ahead of B,
    // by seqno) and then, within the same invocation, re-emits exactly one
    // segment - the new head, A - which moves back to unacked_q.
    assert_eq!(dev.transmissions.last().unwrap(), b"AAAA", "A has the smaller seqno and resends first");
    assert_eq!(conn.unacked_q_len(), 1);
    assert_eq!(conn.write_q_len(), 1, "B awaits the next poll");

    tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    assert_eq!(dev.transmissions.last().unwrap(), b"BBBB");
    assert_eq!(conn.unacked_q_len(), 2);
    assert_eq!(conn.write_q_len(), 0);
}

/// S6 - retransmit expiry after MAX_RTX consecutive REXMITs.
#[test]
fn s6_retransmit_expiry() {
    let (mut conn, mut proto, mut dev) = harness(1460, 65535, 0);

    conn.send(b"PAYLOAD", &mut dev).unwrap();
    tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    assert_eq!(conn.unacked_q_len(), 1);

    for _ in 0..EngineConfig::default().max_rtx {
        tick(&mut conn, EventFlags::REXMIT, &mut proto, &mut dev);
    }

    assert_eq!(conn.unacked_q_len(), 0);
    assert_eq!(conn.write_q_len(), 0);
    assert_eq!(conn.expired(), 1);
}

/// A second connection sharing the same device slot this tick must not
/// transmit; its flags come back with `POLL` still set since nothing was
/// emitted on its behalf.
#[test]
fn shared_device_slot_blocks_second_connection() {
    let config = EngineConfig::default();
    let pool_a = FixedIobPool::new(config.pool_capacity, config.node_capacity);
    let pool_b = FixedIobPool::new(config.pool_capacity, config.node_capacity);
    let mut conn_a = Connection::new(peer(), pool_a, config);
    let mut conn_b = Connection::new(peer(), pool_b, config);
    let mut proto = StaticProtocolLayer {
        mss: 1460,
        winsize: 65535,
        established: true,
        ..Default::default()
    };
    let mut dev = LoopbackDevice::default();

    conn_a.send(b"FIRST", &mut dev).unwrap();
    conn_b.send(b"SECOND", &mut dev).unwrap();

    dev.reset_slot();
    let outcome_a = conn_a.on_event(EventFlags::POLL, &mut proto, &mut dev);
    assert!(!outcome_a.flags.contains(EventFlags::POLL));

    // same tick, slot already claimed by conn_a: conn_b must not transmit.
    let outcome_b = conn_b.on_event(EventFlags::POLL, &mut proto, &mut dev);
    assert!(outcome_b.flags.contains(EventFlags::POLL));
    assert_eq!(conn_b.write_q_len(), 1);
    assert_eq!(dev.transmissions, vec![b"FIRST".to_vec()]);

    // next tick, the driver frees the slot and conn_b gets its turn.
    dev.reset_slot();
    conn_b.on_event(EventFlags::POLL, &mut proto, &mut dev);
    assert_eq!(dev.transmissions, vec![b"FIRST".to_vec(), b"SECOND".to_vec()]);
}

/// Loss flags tear the send state down and the teardown is idempotent.
#[test]
fn loss_tears_down_and_teardown_is_idempotent() {
    let (mut conn, mut proto, mut dev) = harness(1460, 65535, 0);

    conn.send(b"UNSENT", &mut dev).unwrap();
    tick(&mut conn, EventFlags::POLL, &mut proto, &mut dev);
    assert_eq!(conn.unacked_q_len(), 1);

    let outcome = tick(&mut conn, EventFlags::ABORT, &mut proto, &mut dev);
    assert!(outcome.lost);
    assert_eq!(conn.write_q_len(), 0);
    assert_eq!(conn.unacked_q_len(), 0);
    assert_eq!(conn.sent(), 0);

    // tearing an already-torn-down connection down again is a no-op.
    let outcome = tick(&mut conn, EventFlags::CLOSE, &mut proto, &mut dev);
    assert!(outcome.lost);
    assert_eq!(conn.write_q_len(), 0);
    assert_eq!(conn.unacked_q_len(), 0);
    assert_eq!(conn.sent(), 0);
}
