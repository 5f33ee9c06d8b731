mod support;

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, Message},
    MaybeTlsStream, WebSocketStream,
};

use support::TestApp;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 以 graphql-transport-ws 协议连接并完成 `connection_init`
async fn open_socket(addr: SocketAddr, payload: Value) -> Socket {
    let mut request = format!("ws://{addr}/graphql/ws")
        .into_client_request()
        .expect("request");
    request.headers_mut().insert(
        "sec-websocket-protocol",
        HeaderValue::from_static("graphql-transport-ws"),
    );
    let (mut socket, _) = connect_async(request).await.expect("connect");

    send_json(&mut socket, json!({ "type": "connection_init", "payload": payload })).await;
    let ack = next_json(&mut socket).await;
    assert_eq!(ack["type"], "connection_ack", "{ack}");
    socket
}

async fn send_json(socket: &mut Socket, value: Value) {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .expect("send");
}

/// 下一条文本帧，跳过 ping/pong
async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let message = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("no frame")
            .expect("socket closed")
            .expect("frame");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("json frame");
        }
    }
}

async fn status_of(app: &TestApp, user_id: &str) -> bool {
    let body = app
        .graphql(
            None,
            "query($id: ID) { getUser(userId: $id) { status } }",
            json!({ "id": user_id }),
        )
        .await;
    body["data"]["getUser"]["status"]
        .as_bool()
        .unwrap_or_else(|| panic!("getUser failed: {body}"))
}

async fn wait_for_status(app: &TestApp, user_id: &str, expected: bool) {
    timeout(Duration::from_secs(5), async {
        while status_of(app, user_id).await != expected {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("status never became {expected}"));
}

#[tokio::test]
async fn authenticated_socket_tracks_online_status() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let (alice, token) = app.sign_up("Alice", "alice@example.com").await;
    assert!(!status_of(&app, &alice).await);

    let mut first = open_socket(addr, json!({ "authToken": token })).await;
    assert!(status_of(&app, &alice).await);

    // 第二个连接关闭后仍保持在线
    let mut second = open_socket(addr, json!({ "Authorization": format!("Bearer {token}") })).await;
    second.close(None).await.expect("close second");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(status_of(&app, &alice).await);

    first.close(None).await.expect("close first");
    wait_for_status(&app, &alice, false).await;
}

#[tokio::test]
async fn anonymous_socket_is_acked_but_cannot_subscribe() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let (alice, _) = app.sign_up("Alice", "alice@example.com").await;

    let mut socket = open_socket(addr, json!({ "authToken": "garbage" })).await;
    assert!(!status_of(&app, &alice).await);

    send_json(
        &mut socket,
        json!({
            "id": "1",
            "type": "subscribe",
            "payload": { "query": "subscription { message { id } }" }
        }),
    )
    .await;
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["id"], "1");
    assert!(
        reply["type"] == "error" || !reply["payload"]["errors"].is_null(),
        "{reply}"
    );
}

#[tokio::test]
async fn socket_subscription_receives_new_messages() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let (alice, alice_token) = app.sign_up("Alice", "alice@example.com").await;
    let (_, bob_token) = app.sign_up("Bob", "bob@example.com").await;

    let mut socket = open_socket(addr, json!({ "authToken": alice_token })).await;
    send_json(
        &mut socket,
        json!({
            "id": "sub",
            "type": "subscribe",
            "payload": { "query": "subscription { message { messagecontent receivedBy { id } } }" }
        }),
    )
    .await;

    timeout(Duration::from_secs(5), async {
        while app.state.broadcaster.subscriber_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscription never attached");

    app.graphql(
        Some(&bob_token),
        "mutation($to: ID) { message(receiver: $to, content: \"over the wire\") { id } }",
        json!({ "to": alice }),
    )
    .await;

    let event = next_json(&mut socket).await;
    assert_eq!(event["type"], "next", "{event}");
    assert_eq!(event["id"], "sub");
    let message = &event["payload"]["data"]["message"];
    assert_eq!(message["messagecontent"], "over the wire");
    assert_eq!(message["receivedBy"]["id"], Value::String(alice));

    socket.close(None).await.ok();
}
