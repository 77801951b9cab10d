use std::time::Duration;

/// Fixed delay between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Blocks that may wait in the outgoing queue before sends are dropped.
pub const DEFAULT_SEND_QUEUE: usize = 64;

/// Configuration for a transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Delay before a scheduled reconnect fires.
    pub reconnect_delay: Duration,
    /// Upper bound on one connect attempt. `None` leaves it to the OS.
    pub connect_timeout: Option<Duration>,
    /// Capacity of the outgoing block queue.
    pub send_queue: usize,
    /// Disable Nagle's algorithm on the socket.
    pub nodelay: bool,
    /// Enable TCP keepalive so a console that vanishes while idle is noticed.
    pub keepalive: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: None,
            send_queue: DEFAULT_SEND_QUEUE,
            nodelay: true,
            keepalive: true,
        }
    }
}
