use serde::Deserialize;

use crate::error::{DispatchError, Result};

/// One publish relative to a node's topic namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishStep {
    pub suffix: String,
    pub payload: String,
}

impl PublishStep {
    pub fn new(suffix: impl Into<String>, payload: impl Into<String>) -> Self {
        Self { suffix: suffix.into(), payload: payload.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSpec {
    Literal(String),
    /// The command line argument, substituted verbatim
    Argument,
}

impl Default for PayloadSpec {
    fn default() -> Self {
        PayloadSpec::Literal(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandAction {
    Publish {
        topic: String,
        #[serde(default)]
        payload: PayloadSpec,
    },
    ConfigBatch,
    Script,
    Listen,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandEntry {
    pub keyword: String,
    #[serde(flatten)]
    pub action: CommandAction,
}

impl CommandEntry {
    pub fn publish(keyword: &str, topic: &str, payload: PayloadSpec) -> Self {
        Self {
            keyword: keyword.to_string(),
            action: CommandAction::Publish { topic: topic.to_string(), payload },
        }
    }

    fn mode(keyword: &str, action: CommandAction) -> Self {
        Self { keyword: keyword.to_string(), action }
    }
}

impl PayloadSpec {
    pub fn resolve(&self, keyword: &str, argument: Option<&str>) -> Result<String> {
        match self {
            PayloadSpec::Literal(payload) => Ok(payload.clone()),
            PayloadSpec::Argument => argument
                .map(str::to_string)
                .ok_or_else(|| DispatchError::MissingArgument(keyword.to_string())),
        }
    }
}

/// Keyword registry. Order is kept for usage output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
}

impl CommandTable {
    pub fn new(entries: Vec<CommandEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(DispatchError::InvalidTable("no commands defined".to_string()));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entry.keyword.trim().is_empty() {
                return Err(DispatchError::InvalidTable("empty command keyword".to_string()));
            }
            if entries[..i].iter().any(|e| e.keyword == entry.keyword) {
                return Err(DispatchError::InvalidTable(format!(
                    "duplicate command '{}'",
                    entry.keyword
                )));
            }
            if let CommandAction::Publish { topic, .. } = &entry.action {
                if topic.trim_matches('/').is_empty() || topic.contains(&['+', '#'][..]) {
                    return Err(DispatchError::InvalidTable(format!(
                        "command '{}' has invalid topic '{}'",
                        entry.keyword, topic
                    )));
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn resolve(&self, keyword: &str) -> Result<&CommandEntry> {
        self.entries
            .iter()
            .find(|e| e.keyword == keyword)
            .ok_or_else(|| DispatchError::UnknownCommand(keyword.to_string()))
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.keyword.as_str())
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        use PayloadSpec::{Argument, Literal};

        let entries = vec![
            CommandEntry::publish("reset", "reset", Literal(String::new())),
            CommandEntry::publish("open", "cover/set", Literal("open".to_string())),
            CommandEntry::publish("close", "cover/set", Literal("close".to_string())),
            CommandEntry::publish("stop", "cover/set", Literal("stop".to_string())),
            CommandEntry::publish("go", "cover/set/position", Argument),
            CommandEntry::publish("r", "cfg/read", Argument),
            CommandEntry::publish("w", "cfg/write", Argument),
            CommandEntry::publish("dump", "cfg/dump", Literal(String::new())),
            CommandEntry::publish("sw", "switch/set", Argument),
            CommandEntry::mode("cfg", CommandAction::ConfigBatch),
            CommandEntry::mode("file", CommandAction::Script),
            CommandEntry::mode("log", CommandAction::Listen),
        ];
        Self { entries }
    }
}
