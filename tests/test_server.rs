use std::sync::Arc;

use keel::config::Config;
use keel::http::request::Request;
use keel::http::response::Response;
use keel::router::Router;
use keel::server::Listener;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn start(max_connections: usize) -> std::net::SocketAddr {
    let mut cfg = Config::default();
    cfg.server.listen_addr = "127.0.0.1:0".to_string();
    cfg.server.max_connections = max_connections;

    let router = Router::new()
        .route("/test", |req: &Request| {
            Response::ok(format!("q={}", req.query.get("q").unwrap_or("")))
        })
        .unwrap();

    let listener = Listener::bind(&cfg).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener.serve(Arc::new(router)));
    addr
}

async fn get(addr: std::net::SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_serves_over_tcp() {
    let addr = start(8).await;

    let out = get(addr, b"GET /test?q=rust HTTP/1.1\r\nConnection: close\r\n\r\n").await;

    assert_eq!(out, "HTTP/1.1 200 OK\r\nContent-Length: 6\r\n\r\nq=rust\r\n\r\n");
}

#[tokio::test]
async fn test_failed_connection_does_not_stop_listener() {
    let addr = start(8).await;

    let bad = get(addr, b"NOPE\r\n").await;
    assert!(bad.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));

    let good = get(addr, b"GET /missing HTTP/1.1\r\nConnection: close\r\n\r\n").await;
    assert!(good.starts_with("HTTP/1.1 404 Not Found\r\n"));
}

#[tokio::test]
async fn test_connection_limit_is_released() {
    let addr = start(1).await;

    // With a single permit, each connection must hand it back when done.
    for _ in 0..3 {
        let out = get(addr, b"GET /test HTTP/1.1\r\nConnection: close\r\n\r\n").await;
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    }
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let mut cfg = Config::default();
    cfg.server.listen_addr = "not-an-address".to_string();

    assert!(Listener::bind(&cfg).await.is_err());
}
