//! Runtime configuration.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Where the relay publishes local streams and how device URLs are shaped.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Public address of the relay, e.g. `192.168.1.10:1935`.
    pub public_addr: String,
    /// URL template; `{publicAddr}` and `{deviceUid}` are substituted.
    pub template: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            public_addr: "127.0.0.1:1935".to_string(),
            template: "rtmp://{publicAddr}/local/{deviceUid}".to_string(),
        }
    }
}

/// Top-level runtime configuration.
///
/// # Example
/// ```
/// use camvisor::Config;
/// use std::time::Duration;
///
/// let cfg = Config {
///     grace: Duration::from_secs(10),
///     ..Config::default()
/// };
/// assert_eq!(cfg.grace, Duration::from_secs(10));
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// How long to wait for tasks to stop after shutdown begins.
    pub grace: Duration,
    /// Capacity of the broadcast event bus.
    pub bus_capacity: usize,
    /// Default retry policy for supervised tasks.
    pub retry: RetryPolicy,
    /// Pause between liveness probe rounds.
    pub watchdog_delay: Duration,
    /// Number of diagnostic lines kept for probe failure reports.
    pub tail_capacity: usize,
    /// Decode tool launched by the probe.
    pub probe_program: String,
    /// Relay addressing.
    pub relay: RelayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            retry: RetryPolicy::default(),
            watchdog_delay: Duration::from_secs(5),
            tail_capacity: 3,
            probe_program: "ffmpeg".to_string(),
            relay: RelayConfig::default(),
        }
    }
}

impl Config {
    /// Resolves the local stream URL for one device.
    pub fn local_stream_url(&self, device_id: &str) -> String {
        self.relay
            .template
            .replace("{publicAddr}", &self.relay.public_addr)
            .replace("{deviceUid}", device_id)
    }
}
