mod backoff;
mod config;
mod connection;
mod protocol;
mod stats;

pub use backoff::{DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_ATTEMPTS, ReconnectPolicy};
pub use config::{ConnectionConfig, DEFAULT_ENDPOINT};
pub use connection::{
    Connection, ConnectionError, ConnectionState, DisconnectReason, Inbound, validate_endpoint,
};
pub use protocol::{
    CodecError, Envelope, KIND_CARRIER, KIND_CONNECT, KIND_SCORECARD, Message, encode,
};
pub use stats::ConnectionStats;
