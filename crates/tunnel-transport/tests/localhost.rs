//! Integration tests: two TcpHost instances on localhost.

use std::time::Duration;

use tunnel_transport::identity::peer_id_from_seed;
use tunnel_transport::{
    dial_target, DialHost, Direction, HostConfig, Multiaddr, PeerAddrInfo, PeerId, TcpHost,
    TransportError,
};

fn local_config() -> HostConfig {
    HostConfig::new()
        .listen_addrs(vec!["/ip4/127.0.0.1/tcp/0".parse().unwrap()])
        .dial_timeout(Duration::from_secs(2))
        .handshake_timeout(Duration::from_secs(2))
}

fn record(host: &TcpHost) -> PeerAddrInfo {
    PeerAddrInfo::new(host.id(), host.addrs())
}

async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check().await {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Agent dials the relay; both sides see the connection.
#[tokio::test]
async fn connect_registers_both_sides() {
    let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();

    let relay = TcpHost::bind(local_config()).await.unwrap();
    let agent = TcpHost::bind(local_config().listen_addrs(vec![])).await.unwrap();

    agent.connect(&record(&relay)).await.unwrap();

    let conns = agent.conns_to_peer(&relay.id()).await;
    assert_eq!(conns.len(), 1);
    assert_eq!(conns[0].direction, Direction::Outbound);

    let agent_id = agent.id();
    let relay_ref = &relay;
    wait_for(|| async move { !relay_ref.conns_to_peer(&agent_id).await.is_empty() }).await;
    assert_eq!(relay.connected_peers().await, vec![agent_id]);

    agent.shutdown().await;
    relay.shutdown().await;
}

/// A second connect while connected does not open another connection.
#[tokio::test]
async fn connect_is_noop_when_connected() {
    let relay = TcpHost::bind(local_config()).await.unwrap();
    let agent = TcpHost::bind(local_config().listen_addrs(vec![])).await.unwrap();
    let info = record(&relay);

    agent.connect(&info).await.unwrap();
    agent.connect(&info).await.unwrap();
    assert_eq!(agent.conns_to_peer(&relay.id()).await.len(), 1);
}

/// Dialing a record whose identity does not match the listener fails.
#[tokio::test]
async fn connect_rejects_wrong_identity() {
    let relay = TcpHost::bind(local_config()).await.unwrap();
    let agent = TcpHost::bind(local_config().listen_addrs(vec![])).await.unwrap();

    let wrong = PeerAddrInfo::new(PeerId::random(), relay.addrs());
    let err = agent.connect(&wrong).await.unwrap_err();
    assert!(matches!(err, TransportError::PeerMismatch { .. }));
    assert!(agent.conns_to_peer(&wrong.id).await.is_empty());
}

/// Records with only circuit addresses cannot be dialed directly.
#[tokio::test]
async fn connect_without_dialable_address() {
    let agent = TcpHost::bind(local_config().listen_addrs(vec![])).await.unwrap();
    let target = PeerId::random();
    let circuit: Multiaddr = format!("/ip4/127.0.0.1/tcp/1/p2p/{}/p2p-circuit", PeerId::random())
        .parse()
        .unwrap();

    let err = agent
        .connect(&PeerAddrInfo::new(target, vec![circuit]))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::NoDialableAddress(id) if id == target));

    let err = agent.connect(&PeerAddrInfo::new(target, vec![])).await.unwrap_err();
    assert!(matches!(err, TransportError::NoDialableAddress(_)));
}

/// Refused connections surface as dial errors.
#[tokio::test]
async fn connect_refused() {
    let agent = TcpHost::bind(local_config().listen_addrs(vec![])).await.unwrap();

    // Bind then drop to get a port nobody listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let addr: Multiaddr = format!("/ip4/127.0.0.1/tcp/{port}").parse().unwrap();
    let err = agent
        .connect(&PeerAddrInfo::new(PeerId::random(), vec![addr]))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Dial { .. }));
}

#[tokio::test]
async fn connect_to_self_is_refused() {
    let host = TcpHost::bind(local_config()).await.unwrap();
    let err = host.connect(&record(&host)).await.unwrap_err();
    assert!(matches!(err, TransportError::DialSelf));
}

/// When the relay goes away the agent's connection disappears on its own.
#[tokio::test]
async fn remote_shutdown_drops_connection() {
    let relay = TcpHost::bind(local_config()).await.unwrap();
    let agent = TcpHost::bind(local_config().listen_addrs(vec![])).await.unwrap();
    let relay_id = relay.id();

    agent.connect(&record(&relay)).await.unwrap();
    let agent_id = agent.id();
    let relay_ref = &relay;
    wait_for(|| async move { !relay_ref.conns_to_peer(&agent_id).await.is_empty() }).await;

    relay.shutdown().await;
    let agent_ref = &agent;
    wait_for(|| async move { agent_ref.conns_to_peer(&relay_id).await.is_empty() }).await;
}

#[tokio::test]
async fn fixed_seed_gives_fixed_identity() {
    let a = TcpHost::bind(local_config().secret_seed([42; 32])).await.unwrap();
    assert_eq!(a.id(), peer_id_from_seed([42; 32]).unwrap());
}

#[tokio::test]
async fn announce_addrs_override_listen_addrs() {
    let announce: Multiaddr = "/dns4/edge.example.com/tcp/20006".parse().unwrap();
    let host = TcpHost::bind(local_config().announce_addrs(vec![announce.clone()]))
        .await
        .unwrap();
    assert_eq!(host.addrs(), vec![announce]);
}

#[tokio::test]
async fn bind_rejects_non_ip_listen_address() {
    let config = local_config().listen_addrs(vec!["/dns4/localhost/tcp/0".parse().unwrap()]);
    let err = TcpHost::bind(config).await.err().unwrap();
    assert!(matches!(err, TransportError::Bind { .. }));
}

/// Wildcard listen addresses are advertised as concrete interface addresses.
#[tokio::test]
async fn wildcard_listen_advertises_interfaces() {
    let host = TcpHost::bind(local_config().listen_addrs(vec!["/ip4/0.0.0.0/tcp/0".parse().unwrap()]))
        .await
        .unwrap();

    let addrs = host.addrs();
    let targets: Vec<_> = addrs.iter().map(|a| dial_target(a).unwrap()).collect();
    assert!(!targets.is_empty());
    for target in &targets {
        let DialHost::Ip(ip) = target.host else {
            panic!("advertised a non-IP address: {target}");
        };
        assert!(ip.is_ipv4());
        assert!(!ip.is_unspecified(), "advertised {target}");
        assert_ne!(target.port, 0);
    }
    assert!(targets
        .iter()
        .any(|t| t.host == DialHost::Ip("127.0.0.1".parse().unwrap())));

    // Every advertised address actually reaches the host.
    let agent = TcpHost::bind(local_config().listen_addrs(vec![])).await.unwrap();
    agent.connect(&record(&host)).await.unwrap();
}
