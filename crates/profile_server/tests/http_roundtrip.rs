use profile_api::{App, SessionCookie};
use profile_core::{SessionStore, Storage};
use profile_server::{serve, SHUTDOWN_GRACE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

async fn start() -> TestServer {
    start_with_grace(SHUTDOWN_GRACE).await
}

async fn start_with_grace(grace: Duration) -> TestServer {
    let ttl = Duration::from_secs(60);
    let app = Arc::new(App::new(
        Storage::in_memory(),
        Arc::new(SessionStore::new(ttl)),
        SessionCookie::new(ttl, false),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(serve(
        listener,
        app,
        async move {
            let _ = stopped.await;
        },
        grace,
    ));
    TestServer { addr, stop, task }
}

/// Sends one request and returns `(status line, headers + body text)`.
async fn exchange(addr: SocketAddr, request: String) -> (String, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    let (status, rest) = raw.split_once("\r\n").unwrap();
    (status.to_string(), rest.to_string())
}

fn get(path: &str, cookie: Option<&str>) -> String {
    let cookie = cookie
        .map(|cookie| format!("Cookie: {cookie}\r\n"))
        .unwrap_or_default();
    format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n{cookie}Connection: close\r\n\r\n")
}

fn post(path: &str, body: &str) -> String {
    format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

#[tokio::test]
async fn health_and_auth_gate_over_tcp() {
    let server = start().await;

    let (status, rest) = exchange(server.addr, get("/api/health", None)).await;
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert!(rest.contains(r#""status":"ok""#));

    let (status, rest) = exchange(server.addr, get("/api/profile", None)).await;
    assert_eq!(status, "HTTP/1.1 401 Unauthorized");
    assert!(rest.contains("Not authenticated"));

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn register_cookie_opens_profile() {
    let server = start().await;

    let (status, rest) = exchange(
        server.addr,
        post(
            "/api/register",
            r#"{"username":"ada","email":"ada@example.com","password":"secret1"}"#,
        ),
    )
    .await;
    assert_eq!(status, "HTTP/1.1 201 Created");
    let cookie = rest
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(": ")?;
            name.eq_ignore_ascii_case("set-cookie").then(|| value.to_string())
        })
        .unwrap();
    let cookie = cookie.split(';').next().unwrap();

    let (status, rest) = exchange(server.addr, get("/api/profile", Some(cookie))).await;
    assert_eq!(status, "HTTP/1.1 200 OK");
    let body = rest.split("\r\n\r\n").nth(1).unwrap();
    let user: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(user["username"], "ada");
    assert!(user.get("password").is_none());

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();
}

const REGISTER_BODY: &str = r#"{"username":"ada","email":"ada@example.com","password":"secret1"}"#;

/// Opens a connection and sends a register request minus its last body byte.
async fn half_sent_register(addr: SocketAddr) -> TcpStream {
    let request = post("/api/register", REGISTER_BODY);
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(&request.as_bytes()[..request.len() - 1])
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    stream
}

#[tokio::test]
async fn shutdown_waits_for_in_flight_request() {
    let server = start().await;
    let mut stream = half_sent_register(server.addr).await;

    server.stop.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!server.task.is_finished());

    stream.write_all(b"}").await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 201 Created"), "{raw}");

    tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn shutdown_gives_up_after_grace_period() {
    let server = start_with_grace(Duration::from_millis(50)).await;
    let _stalled = half_sent_register(server.addr).await;

    server.stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
