//! End-to-end tests: a real server on an ephemeral port, driven with raw
//! HTTP/1.1 over TCP.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use partsbin::{App, ComponentSource, RateLimiter, Server, StaticCatalog, Views, routes};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<partsbin::Result<()>>,
}

impl TestServer {
    async fn start(limiter: Option<RateLimiter>) -> Self {
        Self::start_with(limiter, Duration::from_secs(2)).await
    }

    async fn start_with(limiter: Option<RateLimiter>, grace_period: Duration) -> Self {
        let views = Views::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")).unwrap();
        let app = Arc::new(App::new(Arc::new(StaticCatalog::reference()), views));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut server = Server::from_listener(listener).grace_period(grace_period);
        if let Some(limiter) = limiter {
            server = server.rate_limit(limiter);
        }

        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_shutdown(routes::router(app), async {
            let _ = stopped.await;
        }));

        Self { addr, stop, handle }
    }

    async fn shutdown(self) {
        self.stop.send(()).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

struct Reply {
    status: u16,
    head: String,
    body: String,
}

async fn send(addr: SocketAddr, method: &str, target: &str) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("{method} {target} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let status = head.split(' ').nth(1).unwrap().parse().unwrap();
    Reply { status, head: head.to_ascii_lowercase(), body: body.to_owned() }
}

async fn get(addr: SocketAddr, target: &str) -> Reply {
    send(addr, "GET", target).await
}

/// Reads one response off a kept-alive connection, sized by its
/// `content-length`.
async fn read_reply(stream: &mut TcpStream) -> Reply {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        if let Some(at) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break at + 4;
        }
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before the response head");
        raw.extend_from_slice(&buf[..n]);
    };

    let head = String::from_utf8(raw[..head_end].to_vec()).unwrap().to_ascii_lowercase();
    let length: usize = head.lines()
        .find_map(|line| line.strip_prefix("content-length: "))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    while raw.len() < head_end + length {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed mid-body");
        raw.extend_from_slice(&buf[..n]);
    }

    let status = head.split(' ').nth(1).unwrap().parse().unwrap();
    let body = String::from_utf8(raw[head_end..head_end + length].to_vec()).unwrap();
    Reply { status, head, body }
}

#[tokio::test]
async fn landing_page() {
    let server = TestServer::start(None).await;

    let reply = get(server.addr, "/").await;
    assert_eq!(reply.status, 200);
    assert!(reply.head.contains("content-type: text/html; charset=utf-8"));
    assert!(reply.body.contains("PC Components"));

    server.shutdown().await;
}

#[tokio::test]
async fn full_catalog() {
    let server = TestServer::start(None).await;

    let reply = get(server.addr, "/components").await;
    assert_eq!(reply.status, 200);
    for component in StaticCatalog::reference().components() {
        assert!(reply.body.contains(&component.name), "missing {}", component.name);
    }

    server.shutdown().await;
}

#[tokio::test]
async fn filtered_components_finds_the_intel_cpu() {
    let server = TestServer::start(None).await;

    let reply = get(server.addr, "/filtered-components?type=CPU&brand=Intel&sort=name&page=1").await;
    assert_eq!(reply.status, 200);
    assert!(reply.body.contains("Intel Core i9-10900K"));

    server.shutdown().await;
}

#[tokio::test]
async fn filtered_components_decodes_query_values() {
    let server = TestServer::start(None).await;

    let reply = get(server.addr, "/filtered-components?type=Power+Supply&sort=price").await;
    assert_eq!(reply.status, 200);
    assert!(reply.body.contains("EVGA SuperNOVA 850 G5"));
    assert!(reply.body.contains("Corsair RM850x 850W"));

    server.shutdown().await;
}

#[tokio::test]
async fn unmatched_filter_is_404_json() {
    let server = TestServer::start(None).await;

    let reply = get(server.addr, "/filtered-components?type=GPU&brand=Intel").await;
    assert_eq!(reply.status, 404);
    assert!(reply.head.contains("content-type: application/json"));
    assert_eq!(reply.body, r#"{"error":"No data available"}"#);

    server.shutdown().await;
}

#[tokio::test]
async fn invalid_page_falls_back_to_first() {
    let server = TestServer::start(None).await;

    let reply = get(server.addr, "/filtered-components?page=abc").await;
    assert_eq!(reply.status, 200);
    assert!(reply.body.contains("Intel Core i9-10900K"));
    assert!(reply.body.contains("Corsair Vengeance RGB Pro 16GB"));
    assert!(!reply.body.contains("ASUS ROG Strix Z490-E Gaming"));

    server.shutdown().await;
}

#[tokio::test]
async fn unknown_path_is_404_and_wrong_method_is_405() {
    let server = TestServer::start(None).await;

    let reply = get(server.addr, "/nope").await;
    assert_eq!(reply.status, 404);
    assert!(reply.body.is_empty());

    let reply = send(server.addr, "POST", "/components").await;
    assert_eq!(reply.status, 405);
    assert!(reply.head.contains("allow: get"));

    server.shutdown().await;
}

#[tokio::test]
async fn rate_limiter_rejects_over_burst() {
    let server = TestServer::start(Some(RateLimiter::new(0.001, 1))).await;

    assert_eq!(get(server.addr, "/").await.status, 200);

    let reply = get(server.addr, "/").await;
    assert_eq!(reply.status, 429);
    assert_eq!(reply.body, r#"{"error":"Too many requests"}"#);

    server.shutdown().await;
}

#[tokio::test]
async fn shutdown_returns_with_no_open_connections() {
    let server = TestServer::start(None).await;
    tokio::time::timeout(Duration::from_secs(5), server.shutdown())
        .await
        .expect("server did not stop");
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let server = TestServer::start(None).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\nhost: localhost\r\n\r\n").await.unwrap();
    assert_eq!(read_reply(&mut stream).await.status, 200);

    let started = Instant::now();
    server.stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), server.handle)
        .await
        .expect("idle connection held the server open")
        .unwrap()
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));

    let mut rest = Vec::new();
    let n = tokio::time::timeout(Duration::from_secs(1), stream.read_to_end(&mut rest))
        .await
        .expect("connection was not closed")
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn in_flight_request_finishes_after_shutdown_signal() {
    let server = TestServer::start(None).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"GET /components HTTP/1.1\r\nhost: localhost\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.stop.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(b"\r\n").await.unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(2), read_reply(&mut stream))
        .await
        .expect("no response after shutdown signal");
    assert_eq!(reply.status, 200);
    assert!(reply.body.contains("Intel Core i9-10900K"));

    tokio::time::timeout(Duration::from_secs(2), server.handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn stalled_connection_is_aborted_after_grace_period() {
    let grace = Duration::from_millis(100);
    let server = TestServer::start_with(None, grace).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"GET /components HTTP/1.1\r\nhost: localhost\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    server.stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), server.handle)
        .await
        .expect("grace period was not enforced")
        .unwrap()
        .unwrap();
    assert!(started.elapsed() >= grace);

    drop(stream);
}

#[tokio::test]
async fn listener_closes_while_connections_drain() {
    let server = TestServer::start(None).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\nhost: localhost\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.stop.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!server.handle.is_finished(), "server stopped before draining");
    assert!(TcpStream::connect(server.addr).await.is_err());

    stream.write_all(b"\r\n").await.unwrap();
    assert_eq!(read_reply(&mut stream).await.status, 200);
    server.handle.await.unwrap().unwrap();
}
