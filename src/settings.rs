//! Settings file for `nodectl`.
//!
//! Every section is optional; anything left out falls back to the built-in
//! deployment defaults. Command line flags are applied afterwards.

use anyhow::{Context, Result};
use dispatch::{CommandEntry, CommandTable, ConfigBatch, ConfigKey, Dispatcher, NodeRegistry, Timing};
use link::MqttConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BROKER_HOST: &str = "fagotto.asterix.cloud";
pub const DEFAULT_BROKER_PORT: u16 = 1317;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub mqtt: MqttSection,
    pub timing: TimingSection,
    pub nodes: Option<Vec<String>>,
    pub commands: Option<Vec<CommandEntry>>,
    pub config_batch: Option<Vec<ConfigKey>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MqttSection {
    pub host: String,
    pub port: u16,
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: u64,
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_BROKER_HOST.to_string(),
            port: DEFAULT_BROKER_PORT,
            client_id: None,
            username: None,
            password: None,
            keep_alive: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingSection {
    pub settle_delay_ms: u64,
    pub publish_interval_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self { settle_delay_ms: 1000, publish_interval_ms: 1000, connect_timeout_ms: 10_000 }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn mqtt_config(&self) -> MqttConfig {
        let defaults = MqttConfig::default();
        MqttConfig {
            broker_host: self.mqtt.host.clone(),
            broker_port: self.mqtt.port,
            client_id: self.mqtt.client_id.clone().unwrap_or(defaults.client_id),
            username: self.mqtt.username.clone(),
            password: self.mqtt.password.clone(),
            keep_alive: self.mqtt.keep_alive,
            clean_session: defaults.clean_session,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.timing.connect_timeout_ms)
    }

    pub fn dispatcher(&self) -> Result<Dispatcher> {
        let registry = match &self.nodes {
            Some(nodes) => NodeRegistry::new(nodes.clone())?,
            None => NodeRegistry::default(),
        };
        let commands = match &self.commands {
            Some(entries) => CommandTable::new(entries.clone())?,
            None => CommandTable::default(),
        };
        let batch = match &self.config_batch {
            Some(keys) => ConfigBatch::new(keys.clone()),
            None => ConfigBatch::default(),
        };
        let timing = Timing {
            settle_delay: Duration::from_millis(self.timing.settle_delay_ms),
            publish_interval: Duration::from_millis(self.timing.publish_interval_ms),
        };
        Ok(Dispatcher::new(registry, commands, batch, timing))
    }
}
