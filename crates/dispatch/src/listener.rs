//! Listen mode: print what a node reports until the link goes away.

use std::io::Write;

use link::{LinkEvent, NodeMessage};
use tokio::sync::mpsc;

use crate::error::{DispatchError, Result};

/// Renders one inbound message, or `None` when it belongs to another node.
pub fn format_message(node_id: &str, msg: &NodeMessage) -> Option<String> {
    if !msg.topic.contains(node_id) {
        return None;
    }

    let body = match msg.cover_position() {
        Some(pos) => format!("position={} ticks={}", pos.position, pos.ticks),
        None => msg.payload_str().into_owned(),
    };

    Some(match msg.report_kind() {
        Some(kind) => format!("[{}] {}  {}", kind, msg.topic, body),
        None => format!("{}  {}", msg.topic, body),
    })
}

/// Writes every matching message to `out`. Returns when the link reports a
/// disconnect, which is always an error since nothing asks it to stop.
pub async fn listen<W: Write>(
    event_rx: &mut mpsc::UnboundedReceiver<LinkEvent>,
    node_id: &str,
    mut out: W,
) -> Result<usize> {
    let mut printed = 0;
    while let Some(event) = event_rx.recv().await {
        match event {
            LinkEvent::Message(msg) => {
                if let Some(line) = format_message(node_id, &msg) {
                    writeln!(out, "{}", line)?;
                    out.flush()?;
                    printed += 1;
                } else {
                    tracing::debug!("Skipping message for other node on {}", msg.topic);
                }
            }
            LinkEvent::Connected => tracing::info!("Listening for {}", node_id),
            LinkEvent::Disconnected => break,
        }
    }
    Err(DispatchError::Transport(format!(
        "connection to broker lost after {} messages",
        printed
    )))
}
