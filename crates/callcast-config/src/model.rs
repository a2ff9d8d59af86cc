//! Configuration schema for callcast.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transcript entries kept in memory before the oldest are evicted.
pub const DEFAULT_TRANSCRIPT_CAPACITY: usize = 1000;
/// Transcripts replayed to a subscriber when it connects.
pub const DEFAULT_SNAPSHOT_SIZE: usize = 20;
/// Seconds an ended or failed call stays visible before removal.
pub const DEFAULT_CALL_EXPIRY_SECS: u64 = 30;
/// Width of the "recent activity" stats window in seconds.
pub const DEFAULT_RECENT_ACTIVITY_SECS: u64 = 300;
/// Outbound messages buffered per subscriber before it is considered dead.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Root config for callcast.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CallcastConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub hub: HubConfig,
}

impl CallcastConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> CallcastConfigBuilder {
        CallcastConfigBuilder::new()
    }
}

/// Builder for assembling a `CallcastConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct CallcastConfigBuilder {
    config: CallcastConfig,
}

impl CallcastConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: CallcastConfig::default(),
        }
    }

    /// Replace the HTTP server configuration.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Replace the hub configuration.
    pub fn hub(mut self, hub: HubConfig) -> Self {
        self.config.hub = hub;
        self
    }

    /// Finalize and return the built `CallcastConfig`.
    pub fn build(self) -> CallcastConfig {
        self.config
    }
}

/// HTTP/WebSocket listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL advertised to clients; derived from host and port when unset.
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            cors: true,
        }
    }
}

impl ServerConfig {
    /// HTTP base URL without a trailing slash.
    pub fn http_base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    /// WebSocket base URL derived from the HTTP base URL.
    pub fn ws_base_url(&self) -> String {
        let http = self.http_base_url();
        if let Some(rest) = http.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = http.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            http
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

/// Limits and timings for the session/broadcast hub.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HubConfig {
    #[serde(default = "default_transcript_capacity")]
    pub transcript_capacity: usize,
    #[serde(default = "default_snapshot_size")]
    pub snapshot_size: usize,
    #[serde(default = "default_call_expiry_secs")]
    pub call_expiry_secs: u64,
    #[serde(default = "default_recent_activity_secs")]
    pub recent_activity_secs: u64,
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            transcript_capacity: DEFAULT_TRANSCRIPT_CAPACITY,
            snapshot_size: DEFAULT_SNAPSHOT_SIZE,
            call_expiry_secs: DEFAULT_CALL_EXPIRY_SECS,
            recent_activity_secs: DEFAULT_RECENT_ACTIVITY_SECS,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

impl HubConfig {
    /// Delay between a terminal status and removal of the call.
    pub fn call_expiry(&self) -> Duration {
        Duration::from_secs(self.call_expiry_secs)
    }

    /// Window used for the recent-activity counter.
    pub fn recent_activity_window(&self) -> Duration {
        Duration::from_secs(self.recent_activity_secs)
    }
}

fn default_transcript_capacity() -> usize {
    DEFAULT_TRANSCRIPT_CAPACITY
}

fn default_snapshot_size() -> usize {
    DEFAULT_SNAPSHOT_SIZE
}

fn default_call_expiry_secs() -> u64 {
    DEFAULT_CALL_EXPIRY_SECS
}

fn default_recent_activity_secs() -> u64 {
    DEFAULT_RECENT_ACTIVITY_SECS
}

fn default_subscriber_buffer() -> usize {
    DEFAULT_SUBSCRIBER_BUFFER
}
