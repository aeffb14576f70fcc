use std::net::{IpAddr, Ipv4Addr};

use sendbuf::{Connection, EngineConfig, EventFlags, FixedIobPool, LoopbackDevice, StaticProtocolLayer};

fn main() {
    tracing_subscriber::fmt::init();

    let peer = IpAddr::V4(Ipv4Addr::new(10, 10, 10, 10));
    let config = EngineConfig::default();
    let pool = FixedIobPool::new(config.pool_capacity, config.node_capacity);
    let mut conn = Connection::new(peer, pool, config);

    let mut proto = StaticProtocolLayer {
        mss: 1460,
        winsize: 65535,
        isn: rand::random::<u32>(),
        established: true,
        ..Default::default()
    };
    let mut dev = LoopbackDevice::default();

    println!(">>> Queuing message for {peer}");
    conn.send(b"hello from the write-buffer engine", &mut dev).unwrap();

    while conn.write_q_len() > 0 {
        dev.reset_slot();
        let outcome = conn.on_event(EventFlags::POLL, &mut proto, &mut dev);
        println!(">>> poll outcome: {:?}", outcome.flags);
    }

    for segment in &dev.transmissions {
        println!(">>> transmitted: {:?}", String::from_utf8_lossy(segment));
    }

    println!(
        ">>> unacked_q depth: {}, bytes in flight: {}",
        conn.unacked_q_len(),
        conn.unacked()
    );
}
