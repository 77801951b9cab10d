use std::sync::{Arc, Mutex};
use std::time::Duration;

use ecplink_frame::{BlockCodec, LogicCommand, LOGIC_STATE};
use ecplink_transport::{
    ConnectionStatus, Endpoint, HostHooks, InstanceStatus, LogicStore, Transport, TransportConfig,
    TransportError, CONNECTION_STATUS_VARIABLE,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::codec::Framed;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct StatusHooks {
    statuses: Mutex<Vec<InstanceStatus>>,
    variables: Mutex<Vec<String>>,
}

impl HostHooks for StatusHooks {
    fn update_status(&self, status: InstanceStatus, _detail: Option<&str>) {
        self.statuses.lock().unwrap().push(status);
    }

    fn set_variable_values(&self, values: &[(&str, String)]) {
        for (name, value) in values {
            if *name == CONNECTION_STATUS_VARIABLE {
                self.variables.lock().unwrap().push(value.clone());
            }
        }
    }
}

fn fast_config() -> TransportConfig {
    TransportConfig {
        reconnect_delay: Duration::from_millis(50),
        connect_timeout: Some(Duration::from_secs(2)),
        ..TransportConfig::default()
    }
}

async fn local_listener() -> (TcpListener, Endpoint) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let port = listener.local_addr().expect("local addr").port();
    (listener, Endpoint::new("127.0.0.1", port))
}

async fn wait_for_status(transport: &Transport, wanted: fn(&ConnectionStatus) -> bool) {
    let mut status = transport.subscribe_status();
    timeout(WAIT, status.wait_for(|s| wanted(s)))
        .await
        .expect("status change should arrive")
        .expect("status sender alive");
}

#[tokio::test]
async fn connect_reports_ok_to_host() {
    let (listener, endpoint) = local_listener().await;
    let hooks = Arc::new(StatusHooks::default());
    let transport =
        Transport::with_config(endpoint, LogicStore::new(), hooks.clone(), fast_config());

    transport.connect();
    let (_socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    timeout(WAIT, transport.connected()).await.unwrap().unwrap();

    assert_eq!(transport.status(), ConnectionStatus::Connected);
    assert_eq!(
        hooks.statuses.lock().unwrap().last(),
        Some(&InstanceStatus::Ok)
    );
    assert_eq!(
        hooks.variables.lock().unwrap().last().map(String::as_str),
        Some("Connected")
    );
    transport.disconnect();
}

#[tokio::test]
async fn writes_blocks_and_reads_reports() {
    let (listener, endpoint) = local_listener().await;
    let store = LogicStore::new();
    let transport = Transport::with_config(
        endpoint,
        store.clone(),
        Arc::new(StatusHooks::default()),
        fast_config(),
    );
    let mut reports = transport.subscribe_reports();

    transport.connect();
    let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    timeout(WAIT, transport.connected()).await.unwrap().unwrap();
    let mut console = Framed::new(socket, BlockCodec);

    transport
        .send(LOGIC_STATE, &[0x00, 0x07, 0x01])
        .expect("send should be accepted");
    let received = timeout(WAIT, console.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(received.command_id(), LOGIC_STATE);
    assert_eq!(received.data(), &[0x00, 0x07, 0x01]);

    let report = LogicCommand::Set {
        logic_id: 7,
        state: true,
    }
    .to_block()
    .unwrap();
    console.send(report).await.unwrap();

    let seen = timeout(WAIT, reports.recv()).await.unwrap().unwrap();
    assert_eq!((seen.logic_id, seen.state), (7, true));
    assert_eq!(store.get(7), Some(true));
    transport.disconnect();
}

#[tokio::test]
async fn closed_connection_reconnects() {
    let (listener, endpoint) = local_listener().await;
    let hooks = Arc::new(StatusHooks::default());
    let transport =
        Transport::with_config(endpoint, LogicStore::new(), hooks.clone(), fast_config());

    transport.connect();
    let (first, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    timeout(WAIT, transport.connected()).await.unwrap().unwrap();

    drop(first);
    wait_for_status(&transport, |s| !s.is_connected()).await;
    assert!(hooks
        .variables
        .lock()
        .unwrap()
        .iter()
        .any(|v| v == "Disconnected"));

    let (_second, _) = timeout(WAIT, listener.accept())
        .await
        .expect("transport should reconnect")
        .unwrap();
    timeout(WAIT, transport.connected()).await.unwrap().unwrap();
    assert!(!transport.reconnect_pending());
    transport.disconnect();
}

#[tokio::test]
async fn refused_connection_fails_and_schedules_retry() {
    let (listener, endpoint) = local_listener().await;
    drop(listener);

    let hooks = Arc::new(StatusHooks::default());
    let config = TransportConfig {
        reconnect_delay: Duration::from_secs(60),
        ..fast_config()
    };
    let transport = Transport::with_config(endpoint, LogicStore::new(), hooks.clone(), config);

    transport.connect();
    wait_for_status(&transport, |s| matches!(s, ConnectionStatus::Failed(_))).await;

    assert!(transport.reconnect_pending());
    assert!(hooks
        .statuses
        .lock()
        .unwrap()
        .contains(&InstanceStatus::ConnectionFailure));
    assert!(hooks
        .variables
        .lock()
        .unwrap()
        .iter()
        .any(|v| v.starts_with("Error: ")));

    transport.disconnect();
    assert!(!transport.reconnect_pending());
    assert_eq!(transport.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn sends_after_disconnect_are_dropped() {
    let (listener, endpoint) = local_listener().await;
    let transport = Transport::with_config(
        endpoint,
        LogicStore::new(),
        Arc::new(StatusHooks::default()),
        fast_config(),
    );

    transport.connect();
    let (_socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    timeout(WAIT, transport.connected()).await.unwrap().unwrap();

    transport.disconnect();
    let err = transport.send(LOGIC_STATE, &[0, 1, 1]).unwrap_err();
    assert!(matches!(err, TransportError::WriteDropped));
    assert!(!transport.reconnect_pending());
}

#[tokio::test]
async fn reconnect_replaces_owned_socket() {
    let (listener, endpoint) = local_listener().await;
    let transport = Transport::with_config(
        endpoint,
        LogicStore::new(),
        Arc::new(StatusHooks::default()),
        fast_config(),
    );

    transport.connect();
    let (first, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    timeout(WAIT, transport.connected()).await.unwrap().unwrap();

    transport.connect();
    let (_second, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    timeout(WAIT, transport.connected()).await.unwrap().unwrap();

    // The first socket was closed by us, so the console sees EOF on it.
    let mut first = Framed::new(first, BlockCodec);
    assert!(timeout(WAIT, first.next()).await.unwrap().is_none());
    assert!(!transport.reconnect_pending());
    transport.disconnect();
}
