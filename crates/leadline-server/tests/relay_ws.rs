use futures_util::{SinkExt, StreamExt};
use leadline_server::config::Config;
use leadline_server::{app, AppState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_app(config: &Config) -> SocketAddr {
    let state = AppState::from_config(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app(state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> WsStream {
    let (ws, _) = connect_async(format!("ws://{}/relay", addr))
        .await
        .expect("failed to connect");
    ws
}

async fn send(ws: &mut WsStream, frame: Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("failed to send frame");
}

async fn say(ws: &mut WsStream, text: &str) {
    send(ws, json!({"type": "prompt", "voicePrompt": text, "last": true})).await;
}

/// Next message from the server, or `None` once it closes.
async fn next_message(ws: &mut WsStream) -> Option<Value> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame");
        match msg {
            Some(Ok(Message::Text(text))) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Some(Ok(Message::Close(_))) | None => return None,
            Some(Ok(_)) => continue,
            Some(Err(e)) => panic!("websocket error: {}", e),
        }
    }
}

async fn next_frame(ws: &mut WsStream) -> Value {
    next_message(ws).await.expect("connection closed early")
}

async fn next_token(ws: &mut WsStream) -> String {
    let frame = next_frame(ws).await;
    assert_eq!(frame["type"], "text", "unexpected frame {}", frame);
    assert_eq!(frame["last"], true);
    frame["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn full_call_over_relay() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("leads.jsonl");

    // A second instance acts as the assignment service.
    let assign_addr = spawn_app(&Config::default()).await;

    let mut config = Config::default();
    config.dispatch.assign_url = Some(format!("http://{}/assign", assign_addr));
    config.dispatch.lead_log_path = Some(log_path.clone());
    let addr = spawn_app(&config).await;
    let mut ws = connect(addr).await;

    send(
        &mut ws,
        json!({"type": "setup", "callSid": "CA-relay-1", "from": "+34600000000"}),
    )
    .await;
    assert_eq!(
        next_token(&mut ws).await,
        "Para atenderle: ¿Es usted propietario o inquilino?"
    );

    say(&mut ws, "soy propietario").await;
    assert_eq!(next_token(&mut ws).await, "Gracias.");
    assert_eq!(next_token(&mut ws).await, "¿En qué población está interesado?");

    say(&mut ws, "Madrid").await;
    assert_eq!(next_token(&mut ws).await, "¿Qué zona o barrio?");
    say(&mut ws, "Centro").await;
    assert_eq!(next_token(&mut ws).await, "¿Su nombre completo?");
    say(&mut ws, "Juan Pérez").await;
    assert_eq!(next_token(&mut ws).await, "¿Su teléfono de contacto, por favor?");
    say(&mut ws, "612345678").await;

    let closing = next_frame(&mut ws).await;
    assert_eq!(
        closing["token"],
        "Gracias. Tomamos sus datos. Le contactaremos en breve."
    );
    assert_eq!(closing["interruptible"], false);
    assert_eq!(next_token(&mut ws).await, "¿Desea más información o ayuda?");

    // The lead was written before the follow-up prompt went out.
    let contents = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["call_id"], "CA-relay-1");
    assert_eq!(record["lead_type"], "lead");
    assert_eq!(record["role"], "propietario");
    assert_eq!(record["city"], "Madrid");
    assert_eq!(record["zone"], "Centro");
    assert_eq!(record["name"], "Juan Pérez");
    assert_eq!(record["phone"], "612345678");

    say(&mut ws, "no, gracias").await;
    let goodbye = next_frame(&mut ws).await;
    assert_eq!(goodbye["token"], "Gracias por su llamada. Hasta pronto.");
    assert_eq!(goodbye["interruptible"], false);
    assert_eq!(next_frame(&mut ws).await, json!({"type": "end"}));
    assert!(next_message(&mut ws).await.is_none());
}

#[tokio::test]
async fn lead_is_recorded_when_caller_hangs_up_after_phone() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("leads.jsonl");

    let mut config = Config::default();
    config.dispatch.lead_log_path = Some(log_path.clone());
    let addr = spawn_app(&config).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"type": "setup", "callSid": "CA-hangup"})).await;
    next_token(&mut ws).await;
    say(&mut ws, "inquilino").await;
    next_token(&mut ws).await;
    next_token(&mut ws).await;
    for text in ["Valencia", "Ruzafa", "Marta Gil"] {
        say(&mut ws, text).await;
        next_token(&mut ws).await;
    }
    say(&mut ws, "655443322").await;
    ws.close(None).await.unwrap();
    drop(ws);

    let deadline = Instant::now() + Duration::from_secs(5);
    let contents = loop {
        let contents = std::fs::read_to_string(&log_path).unwrap_or_default();
        if !contents.is_empty() || Instant::now() >= deadline {
            break contents;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    };

    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["call_id"], "CA-hangup");
    assert_eq!(record["lead_type"], "lead");
    assert_eq!(record["phone"], "655443322");
}

#[tokio::test]
async fn partial_transcripts_and_dtmf_are_silent() {
    let addr = spawn_app(&Config::default()).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"type": "setup"})).await;
    next_token(&mut ws).await;

    send(&mut ws, json!({"type": "prompt", "voicePrompt": "soy prop", "last": false})).await;
    send(&mut ws, json!({"type": "dtmf", "digit": "5"})).await;
    // Without "last" the transcript counts as final.
    send(&mut ws, json!({"type": "prompt", "voicePrompt": "inquilino"})).await;

    assert_eq!(next_token(&mut ws).await, "Gracias.");
    assert_eq!(next_token(&mut ws).await, "¿En qué población está interesado?");
}

#[tokio::test]
async fn malformed_frames_are_skipped() {
    let addr = spawn_app(&Config::default()).await;
    let mut ws = connect(addr).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    send(&mut ws, json!({"type": "hangup"})).await;
    send(&mut ws, json!({"type": "setup", "callSid": "CA-2"})).await;

    assert_eq!(
        next_token(&mut ws).await,
        "Para atenderle: ¿Es usted propietario o inquilino?"
    );
}

#[tokio::test]
async fn transport_error_apologizes_and_ends() {
    let addr = spawn_app(&Config::default()).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"type": "setup"})).await;
    next_token(&mut ws).await;

    send(&mut ws, json!({"type": "error", "description": "media stream lost"})).await;
    let apology = next_frame(&mut ws).await;
    assert_eq!(
        apology["token"],
        "Disculpe. Estamos teniendo problemas. Inténtelo más tarde."
    );
    assert_eq!(next_frame(&mut ws).await, json!({"type": "end"}));
    assert!(next_message(&mut ws).await.is_none());
}

#[tokio::test]
async fn repeated_failures_reprompt_once() {
    let addr = spawn_app(&Config::default()).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"type": "setup"})).await;
    next_token(&mut ws).await;

    // Let the greeting's cooldown lapse so the first failure re-asks.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    for _ in 0..3 {
        say(&mut ws, "no sé").await;
    }
    say(&mut ws, "inquilino").await;

    let mut tokens = Vec::new();
    loop {
        let token = next_token(&mut ws).await;
        let done = token == "¿En qué población está interesado?";
        tokens.push(token);
        if done {
            break;
        }
    }
    assert_eq!(
        tokens,
        vec![
            "Para atenderle: ¿Es usted propietario o inquilino?",
            "Gracias.",
            "¿En qué población está interesado?",
        ]
    );
}

#[tokio::test]
async fn speak_sleep_paces_output() {
    let mut config = Config::default();
    config.dialogue.speak_sleep_ms = 200;
    let addr = spawn_app(&config).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"type": "setup"})).await;
    say(&mut ws, "inquilino").await;

    next_token(&mut ws).await;
    let first = Instant::now();
    next_token(&mut ws).await;
    next_token(&mut ws).await;
    assert!(first.elapsed() >= Duration::from_millis(350));
}

#[tokio::test]
async fn english_relay() {
    let mut config = Config::default();
    config.dialogue.language = "en-US".into();
    let addr = spawn_app(&config).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"type": "setup"})).await;
    assert_eq!(
        next_token(&mut ws).await,
        "To help you: are you a property owner or a tenant?"
    );
    say(&mut ws, "I need help").await;
    assert_eq!(
        next_token(&mut ws).await,
        "Sure. To help you right away, your full name?"
    );
}
