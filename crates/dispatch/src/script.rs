//! Replay scripts for the `file` command.
//!
//! A script is plain text with one directive per line:
//!
//! ```text
//! # comment
//! TOPIC=cfg/write
//! cover_open:0
//! TOPIC=cfg/read
//! cover_open
//! ```
//!
//! `TOPIC=<suffix>` selects the topic for the payload lines that follow it.
//! Payload lines seen before any topic line are dropped.

use std::io::ErrorKind;
use std::path::Path;

use crate::commands::PublishStep;
use crate::error::{DispatchError, Result};

const TOPIC_TOKEN: &str = "TOPIC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptDirective {
    Blank,
    Comment,
    /// New active topic suffix; `None` when the suffix is empty
    Topic(Option<String>),
    Payload(String),
}

impl ScriptDirective {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ScriptDirective::Blank;
        }
        if line.starts_with('#') {
            return ScriptDirective::Comment;
        }
        if line.contains(TOPIC_TOKEN) {
            if let Some(suffix) = line.split('=').nth(1) {
                let suffix = suffix.trim().trim_matches('/');
                return ScriptDirective::Topic((!suffix.is_empty()).then(|| suffix.to_string()));
            }
        }
        ScriptDirective::Payload(line.to_string())
    }
}

/// Turns script text into the ordered list of publishes it describes.
pub fn parse_script(text: &str) -> Vec<PublishStep> {
    let mut topic: Option<String> = None;
    let mut steps = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        match ScriptDirective::parse(line) {
            ScriptDirective::Blank | ScriptDirective::Comment => {}
            ScriptDirective::Topic(suffix) => topic = suffix,
            ScriptDirective::Payload(payload) => match &topic {
                Some(suffix) => steps.push(PublishStep::new(suffix.clone(), payload)),
                None => tracing::debug!("Dropping line {} without topic: {}", lineno + 1, payload),
            },
        }
    }

    steps
}

pub fn load_script(path: &Path) -> Result<Vec<PublishStep>> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DispatchError::FileNotFound(path.to_path_buf()),
        _ => DispatchError::FileUnreadable { path: path.to_path_buf(), source: e },
    })?;
    Ok(parse_script(&text))
}
