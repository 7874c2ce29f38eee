//! Client configuration.

use std::time::Duration;

use poker_core::DEFAULT_COUNTDOWN_SECS;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Session server WebSocket URL
    pub server_url: String,
    /// Countdown start and reset value, in seconds
    pub countdown_secs: u32,
    /// Period between countdown ticks
    pub tick_interval: Duration,
    /// Capacity of the reconciler input queue and transport channels
    pub channel_capacity: usize,
    /// How long to wait for the WebSocket handshake
    pub connect_timeout: Duration,
    /// Acknowledgments not received within this window are logged and forgotten
    pub ack_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:3001".to_string(),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            tick_interval: Duration::from_secs(1),
            channel_capacity: 256,
            connect_timeout: Duration::from_secs(10),
            ack_timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Set the WebSocket URL.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Set the countdown reset value in seconds.
    pub fn with_countdown_secs(mut self, secs: u32) -> Self {
        self.countdown_secs = secs;
        self
    }

    /// Set the countdown tick period.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}
