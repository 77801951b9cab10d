//! Client for the DHD ECP logic control protocol.
//!
//! ecplink keeps a reconnecting TCP connection to one DHD mixing console,
//! drives logic signals and caches the states the console reports.
//!
//! # Crate Structure
//!
//! - [`frame`]: 16-byte block codec and stream reassembly
//! - [`transport`]: reconnecting connection, logic state store, host hooks
//! - [`control`]: set/request/pulse/toggle facade, actions and feedbacks (behind `control` feature)

/// Re-export frame types.
pub mod frame {
    pub use ecplink_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use ecplink_transport::*;
}

/// Re-export control types (requires `control` feature).
#[cfg(feature = "control")]
pub mod control {
    pub use ecplink_control::*;
}
