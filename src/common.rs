use anyhow::{anyhow, Result};
use clap::Args;
use dispatch::DispatchError;
use link::MqttConfig;

pub mod settings;

pub use settings::Settings;

#[derive(Args, Debug, Clone)]
pub struct MqttArgs {
    /// MQTT broker URL (mqtt://host:port), overrides the settings file
    #[arg(short, long)]
    pub mqtt_broker: Option<String>,

    /// MQTT username, Optional
    #[arg(long, env = "RADIOLOG_MQTT_USERNAME")]
    pub mqtt_username: Option<String>,

    /// MQTT password, Optional
    #[arg(long, env = "RADIOLOG_MQTT_PASSWORD", hide_env_values = true)]
    pub mqtt_password: Option<String>,
}

impl MqttArgs {
    /// Applies command line overrides on top of `config`.
    pub fn apply(&self, mut config: MqttConfig) -> Result<MqttConfig> {
        if let Some(url) = &self.mqtt_broker {
            let (host, port) = parse_broker_url(url)?;
            config.broker_host = host;
            config.broker_port = port;
        }
        if let Some(user) = &self.mqtt_username {
            config.username = Some(user.clone());
        }
        if let Some(pass) = &self.mqtt_password {
            config.password = Some(pass.clone());
        }
        Ok(config)
    }
}

/// Parses `mqtt://host[:port]`, defaulting the port to 1883.
pub fn parse_broker_url(url: &str) -> Result<(String, u16)> {
    let url = url.trim();
    let without_proto = url
        .strip_prefix("mqtt://")
        .ok_or_else(|| anyhow!("Broker URL must start with mqtt://"))?;

    let parts: Vec<&str> = without_proto.split(':').collect();
    let host = parts.first().filter(|h| !h.is_empty()).ok_or_else(|| anyhow!("Invalid broker URL"))?;
    let port = parts.get(1).map(|p| p.parse()).transpose()?.unwrap_or(1883);

    Ok((host.to_string(), port))
}

/// Process exit status for a failed run: 2 for usage errors, 1 otherwise.
pub fn exit_status(err: &DispatchError) -> u8 {
    match err {
        DispatchError::Usage => 2,
        _ => 1,
    }
}

/// Whether the usage line should follow the error message.
pub fn shows_usage(err: &DispatchError) -> bool {
    matches!(err, DispatchError::Usage | DispatchError::InvalidNodeSelector { .. })
}

pub fn init_runtime() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rumqttc=warn".into()),
        )
        .init();
}
