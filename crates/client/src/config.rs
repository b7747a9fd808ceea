use std::time::Duration;

use wakejudge::contest::DEFAULT_CARRIER_COUNT;
use wakejudge::net::{DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_ATTEMPTS};
use wakejudge::{ConnectionConfig, DEFAULT_BASE_URL, DEFAULT_ENDPOINT, ReconnectPolicy};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub base_url: String,
    pub device_id: String,
    pub judge: Option<String>,
    pub park: Option<String>,
    pub carrier_count: u32,
    pub connect_timeout_secs: u64,
    pub backoff_unit_ms: u64,
    pub max_attempts: u32,
    pub offline: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            device_id: uuid::Uuid::new_v4().to_string(),
            judge: None,
            park: None,
            carrier_count: DEFAULT_CARRIER_COUNT,
            connect_timeout_secs: 10,
            backoff_unit_ms: DEFAULT_BACKOFF_UNIT.as_millis() as u64,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            offline: false,
        }
    }
}

impl ClientConfig {
    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            device_id: self.device_id.clone(),
            connect_timeout_secs: self.connect_timeout_secs,
            reconnect: ReconnectPolicy {
                unit: Duration::from_millis(self.backoff_unit_ms),
                max_attempts: self.max_attempts,
            },
        }
    }
}
