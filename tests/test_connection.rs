mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::peer;
use parley::http::connection::Connection;
use parley::http::request::Request;
use parley::http::response::Response;
use parley::http::router::{Handler, Router};
use parley::http::static_files::StaticFiles;
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

struct Large;

#[async_trait]
impl Handler for Large {
    async fn handle(&self, _request: &Request, _peer: SocketAddr) -> anyhow::Result<Response> {
        Ok(Response::ok("x".repeat(64 * 1024)))
    }
}

struct Panics;

#[async_trait]
impl Handler for Panics {
    async fn handle(&self, _request: &Request, _peer: SocketAddr) -> anyhow::Result<Response> {
        panic!("handler bug");
    }
}

struct Hello;

#[async_trait]
impl Handler for Hello {
    async fn handle(&self, request: &Request, _peer: SocketAddr) -> anyhow::Result<Response> {
        Ok(Response::ok(format!("hello {}", request.body_str())))
    }
}

fn router() -> Arc<Router> {
    Arc::new(
        Router::new(StaticFiles::new("does-not-exist"))
            .mount("/panic", Arc::new(Panics))
            .mount("/hello", Arc::new(Hello))
            .mount("/large", Arc::new(Large)),
    )
}

async fn exchange(raw: &[u8]) -> String {
    let (mut client, server) = duplex(64 * 1024);
    let task = tokio::spawn(async move {
        let mut conn = Connection::new(server, peer(), router());
        conn.run().await
    });

    client.write_all(raw).await.unwrap();
    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    task.await.unwrap().unwrap();

    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_one_request_one_response() {
    let out = exchange(b"POST /hello HTTP/1.1\r\nContent-Length: 5\r\n\r\nworld").await;

    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.contains("Connection: close\r\n"));
    assert!(out.ends_with("\r\n\r\nhello world"));
}

#[tokio::test]
async fn test_malformed_request_gets_400() {
    let out = exchange(b"NONSENSE\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(out.contains("Content-Type: text/plain\r\n"));
    assert!(out.ends_with("400 Bad Request"));
}

#[tokio::test]
async fn test_unknown_method_gets_400() {
    let out = exchange(b"PATCH /hello HTTP/1.1\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_panicking_handler_gets_500() {
    let out = exchange(b"GET /panic HTTP/1.1\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
}

#[tokio::test]
async fn test_head_response_has_no_body() {
    let out = exchange(b"HEAD /missing.html HTTP/1.1\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(out.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn test_silent_client_times_out_without_response() {
    let (mut client, server) = duplex(1024);
    let mut conn = Connection::new(server, peer(), router()).with_timeout(Duration::from_millis(50));

    conn.run().await.unwrap();

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_client_that_stops_reading_times_out_during_write() {
    let (mut client, server) = duplex(64);
    client.write_all(b"GET /large HTTP/1.1\r\n\r\n").await.unwrap();

    let mut conn = Connection::new(server, peer(), router()).with_timeout(Duration::from_millis(50));
    let result = tokio::time::timeout(Duration::from_secs(5), conn.run()).await;

    assert!(matches!(result, Ok(Ok(()))));
    drop(client);
}
