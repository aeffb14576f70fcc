use std::net::{IpAddr, Ipv4Addr};

use sendbuf::{Connection, EngineConfig, EventFlags, FixedIobPool, LoopbackDevice, StaticProtocolLayer};

/// Walks through MSS fragmentation followed by a retransmission request,
/// to show the write-buffer engine reordering an in-flight segment.
fn main() {
    tracing_subscriber::fmt::init();

    let peer = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
    let config = EngineConfig::default();
    let pool = FixedIobPool::new(config.pool_capacity, config.node_capacity);
    let mut conn = Connection::new(peer, pool, config);

    let mut proto = StaticProtocolLayer {
        mss: 4,
        winsize: 65535,
        isn: 0,
        established: true,
        ..Default::default()
    };
    let mut dev = LoopbackDevice::default();

    conn.send(b"ABCDEFGHIJ", &mut dev).unwrap();

    println!(">>> fragmenting across MSS-sized polls:");
    while conn.write_q_len() > 0 {
        dev.reset_slot();
        conn.on_event(EventFlags::POLL, &mut proto, &mut dev);
        println!("    write_q={} unacked_q={}", conn.write_q_len(), conn.unacked_q_len());
    }

    println!(">>> peer requests retransmission");
    dev.reset_slot();
    conn.on_event(EventFlags::REXMIT, &mut proto, &mut dev);
    println!(
        "    after rexmit: write_q={} unacked_q={} expired={}",
        conn.write_q_len(),
        conn.unacked_q_len(),
        conn.expired()
    );

    while conn.write_q_len() > 0 {
        dev.reset_slot();
        conn.on_event(EventFlags::POLL, &mut proto, &mut dev);
    }

    println!(">>> total transmissions (including the resend): {}", dev.transmissions.len());
}
