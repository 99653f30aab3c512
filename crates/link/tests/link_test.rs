use link::{topics, wait_connected, LinkEvent, MqttConfig, NodeLink};
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::info;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).try_init();
}

fn test_config(client_id: &str) -> MqttConfig {
    MqttConfig {
        broker_host: "127.0.0.1".to_string(),
        broker_port: 1883,
        client_id: client_id.to_string(),
        username: None,
        password: None,
        keep_alive: 60,
        clean_session: true,
    }
}

/// Waits for the next message, skipping other events.
async fn next_message(event_rx: &mut mpsc::UnboundedReceiver<LinkEvent>) -> (String, String) {
    loop {
        match timeout(Duration::from_secs(5), event_rx.recv()).await {
            Ok(Some(LinkEvent::Message(msg))) => return (msg.topic.clone(), msg.payload_str().into_owned()),
            Ok(Some(event)) => info!("Received unrelated event: {:?}", event),
            Ok(None) => panic!("Channel closed unexpectedly"),
            Err(_) => panic!("Timed out waiting for message"),
        }
    }
}

#[tokio::test]
#[ignore = "requires an MQTT broker on 127.0.0.1:1883"]
async fn test_publish_reaches_listener() {
    init_tracing();

    let (listener, mut listener_rx) =
        NodeLink::connect(test_config("link_test_listener")).await.expect("Failed to create listener");
    let (controller, mut controller_rx) =
        NodeLink::connect(test_config("link_test_controller")).await.expect("Failed to create controller");

    wait_connected(&mut listener_rx, Duration::from_secs(5)).await.expect("listener connect");
    wait_connected(&mut controller_rx, Duration::from_secs(5)).await.expect("controller connect");

    listener.subscribe(&topics::listen_filter("Node_test01")).await.expect("Failed to subscribe");
    tokio::time::sleep(Duration::from_millis(200)).await;

    controller
        .publish(&topics::build_topic("Node_test01", "cover/set"), "open")
        .await
        .expect("Failed to publish");
    controller
        .publish(&topics::build_topic("Node_other", "cover/set"), "close")
        .await
        .expect("Failed to publish");
    controller
        .publish(&topics::build_topic("Node_test01", "cfg/write"), "cover_open:0")
        .await
        .expect("Failed to publish");

    assert_eq!(
        next_message(&mut listener_rx).await,
        ("radiolog/Node_test01/cover/set".to_string(), "open".to_string())
    );
    assert_eq!(
        next_message(&mut listener_rx).await,
        ("radiolog/Node_test01/cfg/write".to_string(), "cover_open:0".to_string())
    );

    controller.close(Duration::from_secs(5)).await.expect("Failed to close");
}

#[tokio::test]
async fn test_unreachable_broker_reports_failure() {
    init_tracing();

    let mut config = test_config("link_test_unreachable");
    config.broker_port = 1;

    let (_link, mut event_rx) = NodeLink::connect(config).await.expect("connect spawns the loop");
    assert!(wait_connected(&mut event_rx, Duration::from_secs(5)).await.is_err());
}

/// Minimal broker: accepts one client, acknowledges CONNECT and returns every
/// byte received until the client hangs up or sends DISCONNECT.
async fn accept_one(listener: TcpListener) -> Vec<u8> {
    let (mut socket, _) = listener.accept().await.expect("accept");
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    let mut acked = false;
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        received.extend_from_slice(&buf[..n]);
        if !acked {
            socket.write_all(&[0x20, 0x02, 0x00, 0x00]).await.expect("connack");
            acked = true;
        }
        if received.windows(2).any(|w| w == [0xe0, 0x00]) {
            break;
        }
    }
    received
}

#[tokio::test]
async fn test_close_flushes_publish_and_disconnect() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let broker = tokio::spawn(accept_one(listener));

    let mut config = test_config("link_test_close");
    config.broker_port = port;

    let (link, mut event_rx) = NodeLink::connect(config).await.unwrap();
    wait_connected(&mut event_rx, Duration::from_secs(5)).await.expect("connack");

    link.publish(&topics::build_topic("Node_85d904", "cover/set"), "open").await.unwrap();
    link.close(Duration::from_secs(5)).await.expect("close");

    let received = timeout(Duration::from_secs(5), broker).await.expect("broker").unwrap();
    let topic = b"radiolog/Node_85d904/cover/setopen";
    assert!(received.windows(topic.len()).any(|w| w == topic), "publish lost: {:?}", received);
    assert!(received.windows(2).any(|w| w == [0xe0, 0x00]), "DISCONNECT lost: {:?}", received);
}
