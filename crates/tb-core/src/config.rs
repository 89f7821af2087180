//! Configuration parsing for the trade bridge.
//!
//! All settings are read from a single JSON config file. Only the `forward`
//! section is mandatory; every other section falls back to defaults that
//! match the reference board bring-up.
//!
//! # Example config
//!
//! ```json
//! {
//!   "module_name": "trade_bridge",
//!   "log_path": "/var/log/trade_bridge",
//!   "fifo": { "base_addr": 1136656384, "on_invalid_length": "skip" },
//!   "forward": { "ip": "192.168.1.50", "port": 5001 },
//!   "timers": { "fast_interval_ms": 250, "slow_interval_ms": 500 },
//!   "loop": { "cpu_affinity": 1, "self_test_interval": null }
//! }
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;

use crate::error::BridgeError;
use crate::types::ForwardEndpoint;

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Used as the log file prefix.
    #[serde(default = "default_module_name")]
    pub module_name: String,

    /// Directory for daily-rotating log files.
    pub log_path: Option<String>,

    #[serde(default)]
    pub fifo: FifoConfig,

    pub forward: ForwardConfig,

    #[serde(default)]
    pub timers: TimerConfig,

    #[serde(default, rename = "loop")]
    pub loop_cfg: LoopConfig,
}

fn default_module_name() -> String {
    "trade_bridge".to_string()
}

/// What the FIFO reader does after rejecting an out-of-range length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidLengthPolicy {
    /// Leave the FIFO untouched. Words belonging to the rejected entry stay
    /// queued and are read as part of whatever comes next.
    #[default]
    Skip,
    /// Write the reset key to the Reset register, discarding everything
    /// queued so the next packet starts on a boundary.
    Reset,
}

/// AXI-Stream FIFO peripheral settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FifoConfig {
    /// Physical base address of the peripheral.
    #[serde(default = "default_base_addr")]
    pub base_addr: u64,

    /// Memory device used to map the register window.
    #[serde(default = "default_mem_device")]
    pub mem_device: String,

    #[serde(default)]
    pub on_invalid_length: InvalidLengthPolicy,

    /// Clear the receive FIFO once before entering the loop.
    #[serde(default)]
    pub reset_on_start: bool,
}

fn default_base_addr() -> u64 {
    0x43C0_0000
}

fn default_mem_device() -> String {
    "/dev/mem".to_string()
}

impl Default for FifoConfig {
    fn default() -> Self {
        Self {
            base_addr: default_base_addr(),
            mem_device: default_mem_device(),
            on_invalid_length: InvalidLengthPolicy::default(),
            reset_on_start: false,
        }
    }
}

/// Telemetry destination.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardConfig {
    pub ip: String,
    pub port: u16,
    /// Local address the sending socket binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:0".to_string()
}

impl ForwardConfig {
    /// Parse the destination into a [`ForwardEndpoint`].
    pub fn endpoint(&self) -> Result<ForwardEndpoint, BridgeError> {
        let address: Ipv4Addr = self
            .ip
            .parse()
            .map_err(|e| BridgeError::Config(format!("forward.ip '{}': {e}", self.ip)))?;
        Ok(ForwardEndpoint { address, port: self.port })
    }

    /// Parse the local bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, BridgeError> {
        self.bind
            .parse()
            .map_err(|e| BridgeError::Config(format!("forward.bind '{}': {e}", self.bind)))
    }
}

/// Periods of the emulated timer interrupts.
#[derive(Debug, Clone, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_fast_ms")]
    pub fast_interval_ms: u64,
    #[serde(default = "default_slow_ms")]
    pub slow_interval_ms: u64,
}

fn default_fast_ms() -> u64 {
    250
}

fn default_slow_ms() -> u64 {
    500
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self { fast_interval_ms: default_fast_ms(), slow_interval_ms: default_slow_ms() }
    }
}

impl TimerConfig {
    pub fn fast_interval(&self) -> Duration {
        Duration::from_millis(self.fast_interval_ms)
    }

    pub fn slow_interval(&self) -> Duration {
        Duration::from_millis(self.slow_interval_ms)
    }
}

/// Cooperative loop settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoopConfig {
    /// CPU core to pin the loop thread to.
    pub cpu_affinity: Option<i32>,

    /// Send a `TEST,123,456` datagram every this many iterations.
    pub self_test_interval: Option<u64>,

    /// Log loop statistics every this many iterations (0 disables).
    #[serde(default = "default_stats_interval")]
    pub stats_interval_iterations: u64,
}

fn default_stats_interval() -> u64 {
    10_000_000
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            cpu_affinity: None,
            self_test_interval: None,
            stats_interval_iterations: default_stats_interval(),
        }
    }
}

impl AppConfig {
    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), BridgeError> {
        self.forward.endpoint()?;
        self.forward.bind_addr()?;
        if self.timers.fast_interval_ms == 0 || self.timers.slow_interval_ms == 0 {
            return Err(BridgeError::Config("timer intervals must be non-zero".into()));
        }
        if self.loop_cfg.self_test_interval == Some(0) {
            return Err(BridgeError::Config("loop.self_test_interval must be non-zero".into()));
        }
        Ok(())
    }
}

/// Parse and validate a JSON config document.
pub fn parse_config(content: &str) -> anyhow::Result<AppConfig> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load, parse and validate a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config(r#"{ "forward": { "ip": "192.168.1.50", "port": 5001 } }"#).unwrap();
        assert_eq!(cfg.module_name, "trade_bridge");
        assert_eq!(cfg.fifo.base_addr, 0x43C0_0000);
        assert_eq!(cfg.fifo.mem_device, "/dev/mem");
        assert_eq!(cfg.fifo.on_invalid_length, InvalidLengthPolicy::Skip);
        assert!(!cfg.fifo.reset_on_start);
        assert_eq!(cfg.timers.fast_interval(), Duration::from_millis(250));
        assert_eq!(cfg.timers.slow_interval(), Duration::from_millis(500));
        assert!(cfg.loop_cfg.self_test_interval.is_none());

        let ep = cfg.forward.endpoint().unwrap();
        assert_eq!(ep.address, Ipv4Addr::new(192, 168, 1, 50));
        assert_eq!(ep.port, 5001);
        assert_eq!(cfg.forward.bind_addr().unwrap().port(), 0);
    }

    #[test]
    fn full_config() {
        let cfg = parse_config(
            r#"{
                "module_name": "bridge0",
                "log_path": "/tmp/log",
                "fifo": { "base_addr": 1136656384, "on_invalid_length": "reset", "reset_on_start": true },
                "forward": { "ip": "10.0.0.2", "port": 7000, "bind": "127.0.0.1:0" },
                "timers": { "fast_interval_ms": 100, "slow_interval_ms": 1000 },
                "loop": { "cpu_affinity": 2, "self_test_interval": 1000000, "stats_interval_iterations": 0 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.module_name, "bridge0");
        assert_eq!(cfg.log_path.as_deref(), Some("/tmp/log"));
        assert_eq!(cfg.fifo.on_invalid_length, InvalidLengthPolicy::Reset);
        assert!(cfg.fifo.reset_on_start);
        assert_eq!(cfg.loop_cfg.cpu_affinity, Some(2));
        assert_eq!(cfg.loop_cfg.self_test_interval, Some(1_000_000));
        assert_eq!(cfg.loop_cfg.stats_interval_iterations, 0);
    }

    #[test]
    fn shipped_config_parses() {
        let cfg = parse_config(include_str!("../../../config/trade_bridge.json")).unwrap();
        assert_eq!(cfg.forward.port, 5001);
        assert_eq!(cfg.loop_cfg.cpu_affinity, Some(1));
        assert!(cfg.log_path.is_none());
    }

    #[test]
    fn missing_forward_is_rejected() {
        assert!(parse_config("{}").is_err());
    }

    #[test]
    fn non_ipv4_endpoint_is_rejected() {
        assert!(parse_config(r#"{ "forward": { "ip": "::1", "port": 5001 } }"#).is_err());
        assert!(parse_config(r#"{ "forward": { "ip": "pc.local", "port": 5001 } }"#).is_err());
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let zero_timer = r#"{ "forward": { "ip": "10.0.0.1", "port": 1 }, "timers": { "fast_interval_ms": 0 } }"#;
        assert!(parse_config(zero_timer).is_err());

        let zero_self_test = r#"{ "forward": { "ip": "10.0.0.1", "port": 1 }, "loop": { "self_test_interval": 0 } }"#;
        assert!(parse_config(zero_self_test).is_err());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let cfg = r#"{ "forward": { "ip": "10.0.0.1", "port": 1 }, "fifo": { "on_invalid_length": "drain" } }"#;
        assert!(parse_config(cfg).is_err());
    }
}
