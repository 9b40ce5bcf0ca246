use futures_util::{SinkExt, StreamExt};
use pomodoro_flow::session::{self, SessionOptions};
use pomodoro_flow::ws::websocket_server;
use pomodoro_flow::Settings;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect() -> Client {
    let (handle, _task) = session::spawn(Settings::default(), SessionOptions::default());
    let listener = websocket_server::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(websocket_server::serve(listener, handle));

    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();
    client
}

async fn send(client: &mut Client, value: Value) {
    client.send(Message::Text(value.to_string())).await.unwrap();
}

/// Read frames until one satisfies `pred`.
async fn expect(client: &mut Client, pred: impl Fn(&Value) -> bool) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let msg = client.next().await.unwrap().unwrap();
            if let Message::Text(text) = msg {
                let value: Value = serde_json::from_str(&text).unwrap();
                if pred(&value) {
                    return value;
                }
            }
        }
    })
    .await
    .expect("no matching frame within 5s")
}

#[tokio::test]
async fn test_state_request_returns_snapshot() {
    let mut client = connect().await;
    send(&mut client, json!({"type": "state"})).await;

    let response = expect(&mut client, |v| v.get("success").is_some()).await;
    assert_eq!(response["success"], true);

    let state = expect(&mut client, |v| v["event"] == "state").await;
    assert_eq!(state["mode"], "focus");
    assert_eq!(state["seconds_remaining"], 1500);
    assert_eq!(state["clock"], "25:00");
    assert_eq!(state["is_running"], false);
    assert_eq!(state["completed_focus_count"], 0);
}

#[tokio::test]
async fn test_commands_are_applied_and_broadcast() {
    let mut client = connect().await;

    send(
        &mut client,
        json!({"type": "switch_mode", "mode": "long_break"}),
    )
    .await;
    let state = expect(&mut client, |v| v["event"] == "state").await;
    assert_eq!(state["mode"], "long_break");
    assert_eq!(state["clock"], "15:00");

    send(&mut client, json!({"type": "start"})).await;
    let state = expect(&mut client, |v| {
        v["event"] == "state" && v["is_running"] == true
    })
    .await;
    assert_eq!(state["seconds_remaining"], 900);
}

#[tokio::test]
async fn test_invalid_settings_rejected_at_boundary() {
    let mut client = connect().await;

    send(
        &mut client,
        json!({"type": "update_settings", "settings": {"focus_minutes": 0}}),
    )
    .await;
    let response = expect(&mut client, |v| v.get("success").is_some()).await;
    assert_eq!(response["success"], false);
    assert!(response["message"]
        .as_str()
        .unwrap()
        .contains("Invalid settings"));

    send(
        &mut client,
        json!({"type": "update_settings", "settings": {"focus_minutes": 50}}),
    )
    .await;
    let state = expect(&mut client, |v| v["event"] == "state").await;
    assert_eq!(state["clock"], "50:00");
}

#[tokio::test]
async fn test_garbage_gets_parse_error() {
    let mut client = connect().await;
    client
        .send(Message::Text("not json".to_string()))
        .await
        .unwrap();
    let response = expect(&mut client, |v| v.get("success").is_some()).await;
    assert_eq!(response["success"], false);
    assert!(response["message"]
        .as_str()
        .unwrap()
        .starts_with("Parse error"));
}
