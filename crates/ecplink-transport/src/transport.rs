use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ecplink_frame::{command_name, Block, BlockAssembler, BlockCodec, LogicReport};
use futures_util::SinkExt;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpSocket, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::TransportConfig;
use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::hooks::{HostHooks, HostLogLevel, CONNECTION_STATUS_VARIABLE, LOGIC_STATE_FEEDBACK};
use crate::status::ConnectionStatus;
use crate::store::LogicStore;

const READ_CHUNK_SIZE: usize = 4 * 1024;
const REPORT_CHANNEL_CAPACITY: usize = 256;

/// Reconnecting TCP connection to one ECP console.
///
/// A transport owns at most one socket at a time. It turns incoming bytes into
/// blocks, records logic reports in its [`LogicStore`] and writes outgoing
/// blocks. Cloning yields another handle to the same connection.
///
/// All methods that start background work ([`connect`](Self::connect),
/// [`schedule`](Self::schedule), [`schedule_reconnect`](Self::schedule_reconnect))
/// must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct Transport {
    shared: Arc<Shared>,
}

struct Shared {
    endpoint: Endpoint,
    config: TransportConfig,
    store: LogicStore,
    hooks: Arc<dyn HostHooks>,
    state: Mutex<State>,
    status: watch::Sender<ConnectionStatus>,
    reports: broadcast::Sender<LogicReport>,
}

struct State {
    link: Option<Link>,
    generation: u64,
    reconnect: Option<CancellationToken>,
    reconnects_armed: u64,
    scheduled: CancellationToken,
    assembler: BlockAssembler,
}

/// The socket currently owned by the transport.
struct Link {
    generation: u64,
    cancel: CancellationToken,
    /// Set once the connection is established.
    outgoing: Option<mpsc::Sender<Outgoing>>,
}

enum Outgoing {
    Block(Block),
    Flush(oneshot::Sender<()>),
}

enum LinkEnd {
    Cancelled,
    Closed,
    Failed(TransportError),
}

impl Transport {
    /// Create a transport with default configuration. Does not connect.
    pub fn new(endpoint: Endpoint, store: LogicStore, hooks: Arc<dyn HostHooks>) -> Self {
        Self::with_config(endpoint, store, hooks, TransportConfig::default())
    }

    /// Create a transport with explicit configuration. Does not connect.
    pub fn with_config(
        endpoint: Endpoint,
        store: LogicStore,
        hooks: Arc<dyn HostHooks>,
        config: TransportConfig,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                endpoint,
                config,
                store,
                hooks,
                state: Mutex::new(State {
                    link: None,
                    generation: 0,
                    reconnect: None,
                    reconnects_armed: 0,
                    scheduled: CancellationToken::new(),
                    assembler: BlockAssembler::new(),
                }),
                status,
                reports,
            }),
        }
    }

    /// Open a new connection, closing any socket currently owned.
    pub fn connect(&self) {
        let (generation, cancel) = Self::replace_link(&mut self.lock());
        self.start_link(generation, cancel);
    }

    /// Supersede the current link with a fresh one. The caller holds the lock.
    fn replace_link(state: &mut State) -> (u64, CancellationToken) {
        if let Some(link) = state.link.take() {
            debug!(generation = link.generation, "closing previous socket");
            link.cancel.cancel();
        }
        state.generation += 1;
        state.assembler.clear();
        let cancel = CancellationToken::new();
        state.link = Some(Link {
            generation: state.generation,
            cancel: cancel.clone(),
            outgoing: None,
        });
        (state.generation, cancel)
    }

    fn start_link(&self, generation: u64, cancel: CancellationToken) {
        let endpoint = &self.shared.endpoint;
        info!(%endpoint, generation, "connecting");
        self.shared.hooks.log(
            HostLogLevel::Info,
            &format!("Connecting to DHD at {endpoint}"),
        );
        self.shared.status.send_replace(ConnectionStatus::Connecting);

        tokio::spawn(self.clone().run_link(generation, cancel));
    }

    /// Cancel the pending reconnect and all scheduled tasks, then close the socket.
    ///
    /// The transport can be connected again afterwards. A socket closed this
    /// way does not report a close to the host and does not schedule a reconnect.
    pub fn disconnect(&self) {
        {
            let mut state = self.lock();
            if let Some(timer) = state.reconnect.take() {
                timer.cancel();
            }
            state.scheduled.cancel();
            state.scheduled = CancellationToken::new();
            if let Some(link) = state.link.take() {
                link.cancel.cancel();
            }
            state.assembler.clear();
        }
        debug!(endpoint = %self.shared.endpoint, "disconnected");
        self.shared
            .status
            .send_replace(ConnectionStatus::Disconnected);
    }

    /// Arm the reconnect timer unless one is already pending.
    ///
    /// Retries use a fixed delay with no backoff and no attempt limit.
    pub fn schedule_reconnect(&self) {
        let (timer, armed) = {
            let mut state = self.lock();
            if state.reconnect.is_some() {
                trace!("reconnect already pending");
                return;
            }
            let timer = CancellationToken::new();
            state.reconnect = Some(timer.clone());
            state.reconnects_armed += 1;
            (timer, state.reconnects_armed)
        };

        let delay = self.shared.config.reconnect_delay;
        debug!(?delay, attempt = armed, "reconnect scheduled");

        let transport = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // Link installed under the lock; a racing disconnect() cancels it.
                    let (generation, cancel) = {
                        let mut state = transport.lock();
                        if timer.is_cancelled() {
                            return;
                        }
                        state.reconnect = None;
                        Self::replace_link(&mut state)
                    };
                    transport.start_link(generation, cancel);
                }
            }
        });
    }

    /// Whether a reconnect timer is armed.
    pub fn reconnect_pending(&self) -> bool {
        self.lock().reconnect.is_some()
    }

    /// Feed raw bytes from the socket.
    ///
    /// Incomplete trailing bytes are kept for the next call. Every completed
    /// block is handled in arrival order.
    pub fn on_bytes(&self, chunk: &[u8]) {
        let blocks = self.lock().assembler.push(chunk);
        for block in &blocks {
            self.on_block(block);
        }
    }

    /// Bytes read by the link `generation`. Dropped once that link is superseded.
    fn on_link_bytes(&self, generation: u64, chunk: &[u8]) {
        let blocks = {
            let mut state = self.lock();
            if !matches!(&state.link, Some(link) if link.generation == generation) {
                trace!(generation, len = chunk.len(), "dropping bytes from stale link");
                return;
            }
            state.assembler.push(chunk)
        };
        for block in &blocks {
            self.on_block(block);
        }
    }

    fn on_block(&self, block: &Block) {
        let Some(report) = LogicReport::from_block(block) else {
            trace!(
                command = %format_args!("0x{:08X}", block.command_id()),
                name = command_name(block.command_id()),
                declared_len = block.declared_len(),
                "ignoring block"
            );
            return;
        };

        self.shared.store.set(report.logic_id, report.state);
        debug!(
            logic_id = report.logic_id,
            state = report.state,
            "logic state report"
        );
        self.shared.hooks.log(
            HostLogLevel::Debug,
            &format!("Logic {} state: {}", report.logic_id, report.state),
        );
        // No subscribers is fine.
        let _ = self.shared.reports.send(report);
        self.shared
            .hooks
            .notify_feedback_class_changed(LOGIC_STATE_FEEDBACK);
    }

    /// Encode and send one command.
    ///
    /// When no writable connection is open the command is dropped: a warning is
    /// logged and [`TransportError::WriteDropped`] returned. Nothing is queued
    /// for later or retried.
    pub fn send(&self, command_id: u32, payload: &[u8]) -> Result<()> {
        let block = Block::new(command_id, payload)?;
        self.send_block(block)
    }

    /// Send an already encoded block.
    pub fn send_block(&self, block: Block) -> Result<()> {
        let outgoing = self
            .lock()
            .link
            .as_ref()
            .and_then(|link| link.outgoing.clone());
        let Some(outgoing) = outgoing else {
            return Err(self.dropped("not connected"));
        };

        if outgoing.try_send(Outgoing::Block(block)).is_err() {
            return Err(self.dropped("socket not writable"));
        }

        debug!(
            command = command_name(block.command_id()),
            data = ?block.data(),
            "sent block"
        );
        self.shared.hooks.log(
            HostLogLevel::Debug,
            &format!(
                "Sent ECP block: ID=0x{:08x}, Data={:?}",
                block.command_id(),
                block.data()
            ),
        );
        Ok(())
    }

    fn dropped(&self, reason: &str) -> TransportError {
        warn!(reason, "cannot send command");
        self.shared
            .hooks
            .log(HostLogLevel::Warn, "Cannot send command: not connected");
        TransportError::WriteDropped
    }

    /// Run `task` after `delay` unless the transport is disconnected first.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.lock().scheduled.child_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => trace!("scheduled task cancelled"),
                _ = tokio::time::sleep(delay) => task(),
            }
        });
    }

    /// Wait until every block accepted so far has been written to the socket.
    ///
    /// Returns immediately when nothing is connected.
    pub async fn flush(&self) -> Result<()> {
        let outgoing = self
            .lock()
            .link
            .as_ref()
            .and_then(|link| link.outgoing.clone());
        let Some(outgoing) = outgoing else {
            return Ok(());
        };

        let (done, written) = oneshot::channel();
        outgoing
            .send(Outgoing::Flush(done))
            .await
            .map_err(|_| TransportError::Shutdown)?;
        written.await.map_err(|_| TransportError::Shutdown)
    }

    /// Wait until the transport reports [`ConnectionStatus::Connected`].
    pub async fn connected(&self) -> Result<()> {
        let mut status = self.shared.status.subscribe();
        status
            .wait_for(ConnectionStatus::is_connected)
            .await
            .map(|_| ())
            .map_err(|_| TransportError::Shutdown)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.borrow().clone()
    }

    /// Observe connection status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Observe logic reports as they are decoded.
    pub fn subscribe_reports(&self) -> broadcast::Receiver<LogicReport> {
        self.shared.reports.subscribe()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }

    pub fn store(&self) -> &LogicStore {
        &self.shared.store
    }

    pub fn config(&self) -> &TransportConfig {
        &self.shared.config
    }

    /// The host collaborator this transport reports to.
    pub fn hooks(&self) -> &Arc<dyn HostHooks> {
        &self.shared.hooks
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_link(self, generation: u64, cancel: CancellationToken) {
        let opened = tokio::select! {
            _ = cancel.cancelled() => return,
            opened = self.open_stream() => opened,
        };
        let stream = match opened {
            Ok(stream) => stream,
            Err(err) => {
                self.link_failed(generation, err);
                return;
            }
        };

        let (tx, rx) = mpsc::channel(self.shared.config.send_queue.max(1));
        if !self.link_established(generation, tx) {
            return;
        }

        match self.pump(stream, rx, generation, &cancel).await {
            LinkEnd::Cancelled => trace!(generation, "link cancelled"),
            LinkEnd::Closed => self.link_closed(generation),
            LinkEnd::Failed(err) => self.link_failed(generation, err),
        }
    }

    async fn open_stream(&self) -> Result<TcpStream> {
        let endpoint = &self.shared.endpoint;
        let connect = connect_stream(endpoint, &self.shared.config);
        let opened = match self.shared.config.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .map_err(|_| TransportError::ConnectTimeout(endpoint.clone()))?,
            None => connect.await,
        };
        let stream = opened.map_err(|source| TransportError::Connect {
            endpoint: endpoint.clone(),
            source,
        })?;
        if self.shared.config.nodelay {
            stream.set_nodelay(true)?;
        }
        Ok(stream)
    }

    async fn pump(
        &self,
        stream: TcpStream,
        mut outgoing: mpsc::Receiver<Outgoing>,
        generation: u64,
        cancel: &CancellationToken,
    ) -> LinkEnd {
        let (mut reader, writer) = stream.into_split();
        let mut writer = FramedWrite::new(writer, BlockCodec);
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return LinkEnd::Cancelled,
                read = reader.read(&mut chunk) => match read {
                    Ok(0) => return LinkEnd::Closed,
                    Ok(n) => self.on_link_bytes(generation, &chunk[..n]),
                    Err(err) => return LinkEnd::Failed(err.into()),
                },
                Some(item) = outgoing.recv() => match item {
                    Outgoing::Block(block) => {
                        tokio::select! {
                            _ = cancel.cancelled() => return LinkEnd::Cancelled,
                            written = writer.send(block) => {
                                if let Err(err) = written {
                                    return LinkEnd::Failed(err.into());
                                }
                            }
                        }
                    }
                    Outgoing::Flush(done) => {
                        let _ = done.send(());
                    }
                },
            }
        }
    }

    fn link_established(&self, generation: u64, outgoing: mpsc::Sender<Outgoing>) -> bool {
        {
            let mut state = self.lock();
            match state.link.as_mut() {
                Some(link) if link.generation == generation => link.outgoing = Some(outgoing),
                _ => return false,
            }
            if let Some(timer) = state.reconnect.take() {
                timer.cancel();
            }
        }

        info!(endpoint = %self.shared.endpoint, generation, "connected");
        self.shared
            .hooks
            .log(HostLogLevel::Info, "Connected to DHD console");
        self.publish(ConnectionStatus::Connected, None);
        true
    }

    fn link_failed(&self, generation: u64, err: TransportError) {
        if !self.retire(generation) {
            return;
        }
        let reason = match &err {
            TransportError::Connect { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        error!(endpoint = %self.shared.endpoint, error = %err, "connection error");
        self.shared
            .hooks
            .log(HostLogLevel::Error, &format!("Connection error: {reason}"));
        self.publish(ConnectionStatus::Failed(reason.clone()), Some(&reason));
        self.schedule_reconnect();
    }

    fn link_closed(&self, generation: u64) {
        if !self.retire(generation) {
            return;
        }
        warn!(endpoint = %self.shared.endpoint, "connection closed");
        self.shared
            .hooks
            .log(HostLogLevel::Warn, "Connection closed");
        self.publish(ConnectionStatus::Disconnected, None);
        self.schedule_reconnect();
    }

    /// Release the link if it is still the current one.
    fn retire(&self, generation: u64) -> bool {
        let mut state = self.lock();
        match &state.link {
            Some(link) if link.generation == generation => {
                state.link = None;
                true
            }
            _ => false,
        }
    }

    fn publish(&self, status: ConnectionStatus, detail: Option<&str>) {
        let hooks = &self.shared.hooks;
        hooks.update_status(status.instance_status(), detail);
        hooks.set_variable_values(&[(CONNECTION_STATUS_VARIABLE, status.variable_text())]);
        self.shared.status.send_replace(status);
    }
}

/// Resolve the endpoint and connect to the first address that accepts.
async fn connect_stream(endpoint: &Endpoint, config: &TransportConfig) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in tokio::net::lookup_host(endpoint.socket_addr()).await? {
        let attempt = match socket_for(addr, config) {
            Ok(socket) => socket.connect(addr).await,
            Err(err) => Err(err),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                trace!(%addr, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{endpoint} did not resolve to any address"),
        )
    }))
}

fn socket_for(addr: SocketAddr, config: &TransportConfig) -> io::Result<TcpSocket> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_keepalive(config.keepalive)?;
    Ok(socket)
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.shared.endpoint)
            .field("status", &*self.shared.status.borrow())
            .field("known_logics", &self.shared.store.len())
            .finish()
    }
}
