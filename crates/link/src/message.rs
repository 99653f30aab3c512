use serde::Deserialize;
use std::borrow::Cow;
use strum::{AsRefStr, Display, EnumString};

use crate::topics;

/// Report topics a node publishes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ReportKind {
    Announce,
    Status,
    Measure,
    Switch,
}

/// Cover position report, `{"position":"42", "ticks":"17"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoverPosition {
    pub position: String,
    pub ticks: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl NodeMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self { topic: topic.into(), payload: payload.into() }
    }

    pub fn payload_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    pub fn report_kind(&self) -> Option<ReportKind> {
        let (_, suffix) = topics::split_node_topic(&self.topic)?;
        suffix.parse().ok()
    }

    pub fn cover_position(&self) -> Option<CoverPosition> {
        serde_json::from_slice(&self.payload).ok()
    }
}
