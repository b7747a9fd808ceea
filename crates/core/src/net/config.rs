use std::time::Duration;

use super::backoff::ReconnectPolicy;

pub const DEFAULT_ENDPOINT: &str = "wss://koesterventures.com/contest/ws";

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub device_id: String,
    pub connect_timeout_secs: u64,
    pub reconnect: ReconnectPolicy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            device_id: uuid::Uuid::new_v4().to_string(),
            connect_timeout_secs: 10,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
