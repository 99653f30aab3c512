mod config;
mod link;
mod message;

pub mod topics;

pub use config::MqttConfig;
pub use link::{wait_connected, LinkEvent, NodeLink};
pub use message::{CoverPosition, NodeMessage, ReportKind};
