//! Channel configuration
//!
//! Fixed at construction. Overrides can be persisted in LocalStorage so a
//! deployment can point the client at another endpoint without a rebuild.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::endpoint;

/// LocalStorage key for persisted overrides
pub const STORAGE_KEY: &str = "tarot_link_channel";

/// Construction-time channel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Server endpoint (`ws://` or `wss://`)
    #[serde(default = "endpoint::default_url")]
    pub url: String,

    // === Reconnection ===
    /// Reconnect automatically after an unexpected close
    #[serde(default = "default_reconnect")]
    pub reconnect: bool,
    /// Consecutive failed attempts before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first reconnect attempt (ms)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on any reconnect delay (ms)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Upper bound (exclusive) of the random jitter added to each delay (ms)
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    /// Fixed jitter seed; `None` seeds from the clock
    #[serde(default)]
    pub jitter_seed: Option<u64>,

    // === Heartbeat ===
    /// Ping period while open (ms). 0 disables the heartbeat.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

fn default_reconnect() -> bool {
    true
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

fn default_jitter_ms() -> u64 {
    JITTER_MS
}

fn default_heartbeat_interval_ms() -> u64 {
    HEARTBEAT_INTERVAL_MS
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: endpoint::default_url(),
            reconnect: true,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_ms: JITTER_MS,
            jitter_seed: None,
            heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,
        }
    }
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self::default().with_url(url)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_reconnect(mut self, enabled: bool) -> Self {
        self.reconnect = enabled;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set base and maximum reconnect delay (ms)
    pub fn with_backoff(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn with_jitter_ms(mut self, jitter_ms: u64) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    pub fn with_heartbeat_interval_ms(mut self, interval_ms: u64) -> Self {
        self.heartbeat_interval_ms = interval_ms;
        self
    }

    /// Parse a (possibly partial) JSON override; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded channel config from LocalStorage ({})", config.url);
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored channel config: {}", e),
                }
            }
        }

        Self::default()
    }

    /// Save config to LocalStorage (WASM only). Returns false if nothing was stored.
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> bool {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        let Some(storage) = storage else {
            log::warn!("LocalStorage unavailable, channel config not saved");
            return false;
        };

        match serde_json::to_string(self) {
            Ok(json) => match storage.set_item(STORAGE_KEY, &json) {
                Ok(()) => {
                    log::info!("Channel config saved");
                    true
                }
                Err(e) => {
                    log::warn!("Failed to save channel config: {:?}", e);
                    false
                }
            },
            Err(e) => {
                log::warn!("Failed to encode channel config: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChannelConfig::default();
        assert!(config.reconnect);
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.max_delay_ms, 30_000);
        assert_eq!(config.heartbeat_interval_ms, 30_000);
        assert_eq!(config.url, endpoint::DEV_ENDPOINT);
    }

    #[test]
    fn test_partial_json_override() {
        let config =
            ChannelConfig::from_json(r#"{"url":"wss://tarot.example/ws","max_retries":3}"#)
                .unwrap();
        assert_eq!(config.url, "wss://tarot.example/ws");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, DEFAULT_BASE_DELAY_MS);
        assert!(config.jitter_seed.is_none());
    }

    #[test]
    fn test_builder() {
        let config = ChannelConfig::new("ws://10.0.0.2:3000/ws")
            .with_reconnect(false)
            .with_backoff(250, 5000)
            .with_jitter_seed(9)
            .with_heartbeat_interval_ms(0);
        assert_eq!(config.url, "ws://10.0.0.2:3000/ws");
        assert!(!config.reconnect);
        assert_eq!((config.base_delay_ms, config.max_delay_ms), (250, 5000));
        assert_eq!(config.jitter_seed, Some(9));
        assert_eq!(config.heartbeat_interval_ms, 0);
    }
}
