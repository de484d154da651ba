//! Integration tests: a real relay and agent on localhost.

use std::sync::Arc;
use std::time::Duration;

use tunnel_agent::{
    AgentConfig, AgentMode, FileDirectory, Maintainer, MaintainerEvent, MemoryDirectory,
    PeerDirectory, SERVER_ADDR_NAME,
};
use tunnel_transport::{is_circuit, HostConfig, PeerAddrInfo, Protocol, TcpHost};

fn local_config() -> HostConfig {
    HostConfig::new()
        .listen_addrs(vec!["/ip4/127.0.0.1/tcp/0".parse().unwrap()])
        .dial_timeout(Duration::from_secs(2))
        .handshake_timeout(Duration::from_secs(2))
}

fn fast_config(mode: AgentMode) -> AgentConfig {
    AgentConfig::new("edge-1")
        .mode(mode)
        .relay_name(SERVER_ADDR_NAME)
        .retry_connect_duration(Duration::from_millis(20))
        .heartbeat_duration(Duration::from_millis(20))
        .resolve_backoff(Duration::from_millis(20))
}

fn record(host: &TcpHost) -> PeerAddrInfo {
    PeerAddrInfo::new(host.id(), host.addrs())
}

fn has(events: &[MaintainerEvent], pred: impl Fn(&MaintainerEvent) -> bool) -> bool {
    events.iter().any(pred)
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

/// First cycle dials and publishes; the next one finds the link healthy.
#[tokio::test]
async fn agent_attaches_and_publishes_circuit_record() {
    let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();

    let relay = TcpHost::bind(local_config()).await.unwrap();
    let agent = Arc::new(TcpHost::bind(local_config()).await.unwrap());
    let dir = Arc::new(MemoryDirectory::new());
    dir.set_peer_addr_info(SERVER_ADDR_NAME, &record(&relay)).await.unwrap();

    let mut maintainer = Maintainer::new(
        agent.clone(),
        dir.clone(),
        fast_config(AgentMode::ServerClient),
    );

    let events = maintainer.run_cycle().await;
    assert!(has(&events, |e| matches!(e, MaintainerEvent::Connected { attempt: 1, .. })));
    assert!(has(&events, |e| matches!(e, MaintainerEvent::Published { .. })));
    assert_eq!(agent.conns_to_peer(&relay.id()).await.len(), 1);

    let agent_id = agent.id();
    let relay_ref = &relay;
    wait_for(|| async move { !relay_ref.conns_to_peer(&agent_id).await.is_empty() }).await;

    let published = dir.get_peer_addr_info("edge-1").await.unwrap();
    assert_eq!(published.id, agent.id());
    assert_eq!(published.addrs.len(), 2);
    assert_eq!(published.addrs[0], agent.addrs()[0]);
    let circuit = &published.addrs[1];
    assert!(is_circuit(circuit));
    let expected = relay.addrs()[0]
        .clone()
        .with(Protocol::P2p(relay.id()))
        .with(Protocol::P2pCircuit);
    assert_eq!(circuit, &expected);

    let events = maintainer.run_cycle().await;
    assert!(has(&events, |e| matches!(e, MaintainerEvent::AlreadyConnected { .. })));
    assert_eq!(agent.conns_to_peer(&relay.id()).await.len(), 1);

    let snap = maintainer.metrics().snapshot();
    assert_eq!(snap.cycles, 2);
    assert_eq!(snap.dial_attempts, 1);
    assert_eq!(snap.publishes, 1);
}

/// A relay that restarts on a new port is found again through the directory.
#[tokio::test]
async fn relay_restart_is_picked_up_next_cycle() {
    let seed = [7; 32];
    let relay = TcpHost::bind(local_config().secret_seed(seed)).await.unwrap();
    let relay_id = relay.id();
    let agent = Arc::new(TcpHost::bind(local_config().listen_addrs(vec![])).await.unwrap());
    let dir = Arc::new(MemoryDirectory::new());
    dir.set_peer_addr_info(SERVER_ADDR_NAME, &record(&relay)).await.unwrap();

    let mut maintainer = Maintainer::new(agent.clone(), dir.clone(), fast_config(AgentMode::ClientOnly));
    maintainer.run_cycle().await;
    assert_eq!(agent.conns_to_peer(&relay_id).await.len(), 1);

    relay.shutdown().await;
    let agent_ref = &agent;
    wait_for(|| async move { agent_ref.conns_to_peer(&relay_id).await.is_empty() }).await;

    let relay = TcpHost::bind(local_config().secret_seed(seed)).await.unwrap();
    dir.set_peer_addr_info(SERVER_ADDR_NAME, &record(&relay)).await.unwrap();

    let events = maintainer.run_cycle().await;
    assert!(has(&events, |e| matches!(e, MaintainerEvent::NotConnected { .. })));
    assert!(has(&events, |e| matches!(e, MaintainerEvent::Connected { .. })));
    assert_eq!(agent.conns_to_peer(&relay_id).await.len(), 1);
    assert!(dir.get_peer_addr_info("edge-1").await.is_err());
}

/// Nothing listens at the relay address: the budget runs out, nothing is published.
#[tokio::test]
async fn unreachable_relay_exhausts_budget() {
    let closed_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let relay = PeerAddrInfo::new(
        tunnel_transport::PeerId::random(),
        vec![format!("/ip4/127.0.0.1/tcp/{closed_port}").parse().unwrap()],
    );

    let agent = Arc::new(TcpHost::bind(local_config()).await.unwrap());
    let dir = Arc::new(MemoryDirectory::new());
    dir.set_peer_addr_info(SERVER_ADDR_NAME, &relay).await.unwrap();

    let mut maintainer = Maintainer::new(
        agent,
        dir.clone(),
        fast_config(AgentMode::ServerClient).retry_connect_time(2),
    );
    let events = maintainer.run_cycle().await;

    assert!(has(&events, |e| matches!(e, MaintainerEvent::RetriesExhausted { attempts: 2, .. })));
    let snap = maintainer.metrics().snapshot();
    assert_eq!(snap.dial_attempts, 2);
    assert_eq!(snap.dial_failures, 2);
    assert_eq!(snap.publishes, 0);
    assert_eq!(dir.len(), 1);
}

/// Relay and agent share one directory file through separate handles.
#[tokio::test]
async fn file_directory_shared_with_relay() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("peers.json");

    let relay = TcpHost::bind(local_config()).await.unwrap();
    FileDirectory::new(&path)
        .set_peer_addr_info(SERVER_ADDR_NAME, &record(&relay))
        .await
        .unwrap();

    let agent = Arc::new(TcpHost::bind(local_config()).await.unwrap());
    let mut maintainer = Maintainer::new(
        agent.clone(),
        Arc::new(FileDirectory::new(&path)),
        fast_config(AgentMode::ServerClient),
    );
    maintainer.run_cycle().await;

    let json: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(json[SERVER_ADDR_NAME]["ID"], relay.id().to_string());
    assert_eq!(json["edge-1"]["ID"], agent.id().to_string());
    assert_eq!(json["edge-1"]["Addrs"].as_array().unwrap().len(), 2);
}
