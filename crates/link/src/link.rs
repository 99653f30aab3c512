use anyhow::{anyhow, Result};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config;
use crate::message::NodeMessage;

#[derive(Debug)]
pub enum LinkEvent {
    Connected,
    Message(NodeMessage),
    Disconnected,
}

/// Broker session used to drive radiolog nodes.
///
/// The MQTT event loop runs on its own task for the lifetime of the link and
/// reports connection changes and inbound publishes on the returned channel.
pub struct NodeLink {
    client_id: String,
    client: AsyncClient,
    event_loop_handle: Option<JoinHandle<()>>,
}

impl NodeLink {
    pub async fn connect(
        config: config::MqttConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<LinkEvent>)> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut mqtt_options =
            MqttOptions::new(config.client_id.clone(), &config.broker_host, config.broker_port);
        mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive));
        mqtt_options.set_clean_session(config.clean_session);

        if let (Some(ref user), Some(ref pass)) = (&config.username, &config.password) {
            mqtt_options.set_credentials(user, pass);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        tracing::info!(
            "Connecting to {}:{} as {}",
            config.broker_host,
            config.broker_port,
            config.client_id
        );
        let event_loop_handle = Self::start_event_loop(event_loop, event_tx);

        Ok((
            Self { client_id: config.client_id, client, event_loop_handle: Some(event_loop_handle) },
            event_rx,
        ))
    }

    pub async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.client.publish(topic, QoS::AtMostOnce, false, payload.as_bytes()).await?;
        Ok(())
    }

    pub async fn subscribe(&self, filter: &str) -> Result<()> {
        self.client.subscribe(filter, QoS::AtMostOnce).await?;
        Ok(())
    }

    /// Sends DISCONNECT after every request already handed to the client and
    /// waits up to `limit` for the event loop to flush it and exit.
    pub async fn close(mut self, limit: Duration) -> Result<()> {
        self.client.disconnect().await?;
        if let Some(handle) = self.event_loop_handle.take() {
            timeout(limit, handle)
                .await
                .map_err(|_| anyhow!("Timed out after {:?} closing MQTT session", limit))??;
        }
        Ok(())
    }

    fn start_event_loop(
        mut event_loop: EventLoop,
        event_tx: mpsc::UnboundedSender<LinkEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(event) => match event {
                        Event::Incoming(Packet::ConnAck(ack)) => {
                            tracing::info!("Connected to MQTT broker ({:?})", ack.code);
                            let _ = event_tx.send(LinkEvent::Connected);
                        }
                        Event::Incoming(Packet::Publish(p)) => {
                            let msg = NodeMessage::new(p.topic, p.payload.to_vec());
                            let _ = event_tx.send(LinkEvent::Message(msg));
                        }
                        Event::Incoming(Packet::Disconnect) => {
                            tracing::warn!("Disconnected from MQTT broker");
                            let _ = event_tx.send(LinkEvent::Disconnected);
                        }
                        // Reported once the packet has been flushed to the socket.
                        Event::Outgoing(Outgoing::Disconnect) => {
                            tracing::debug!("MQTT session closed");
                            break;
                        }
                        other => tracing::trace!("MQTT event: {:?}", other),
                    },
                    Err(e) => {
                        tracing::error!("MQTT event loop error: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("MQTT event loop exited");
            let _ = event_tx.send(LinkEvent::Disconnected);
        })
    }
}

/// Waits until the broker acknowledges the session.
///
/// Messages arriving before the acknowledgement are discarded.
pub async fn wait_connected(
    event_rx: &mut mpsc::UnboundedReceiver<LinkEvent>,
    limit: Duration,
) -> Result<()> {
    loop {
        match timeout(limit, event_rx.recv()).await {
            Ok(Some(LinkEvent::Connected)) => return Ok(()),
            Ok(Some(LinkEvent::Message(msg))) => {
                tracing::debug!("Ignoring early message on {}", msg.topic);
            }
            Ok(Some(LinkEvent::Disconnected)) | Ok(None) => {
                return Err(anyhow!("Unable to connect to MQTT broker"));
            }
            Err(_) => return Err(anyhow!("Timed out after {:?} waiting for MQTT broker", limit)),
        }
    }
}

impl Drop for NodeLink {
    fn drop(&mut self) {
        if let Some(handle) = self.event_loop_handle.take() {
            tracing::debug!("Dropping link {}", self.client_id);
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_connected_skips_early_messages() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(LinkEvent::Message(NodeMessage::new("radiolog/n/status", "online"))).unwrap();
        tx.send(LinkEvent::Connected).unwrap();
        wait_connected(&mut rx, Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_connected_fails_on_disconnect() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(LinkEvent::Disconnected).unwrap();
        assert!(wait_connected(&mut rx, Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_wait_connected_times_out() {
        let (_tx, mut rx) = mpsc::unbounded_channel::<LinkEvent>();
        let err = wait_connected(&mut rx, Duration::from_millis(20)).await.unwrap_err();
        assert!(err.to_string().contains("Timed out"));
    }
}
