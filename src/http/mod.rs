//! HTTP protocol implementation.
//!
//! A hand-written HTTP/1.1 engine that serves exactly one request per
//! connection and always answers with `Connection: close`.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection state machine
//! - **`parser`**: Reads and parses a request from the socket
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes responses to the client
//! - **`router`**: Prefix dispatch to handlers
//! - **`static_files`**: Files served from the public root
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Parse one request (timeout drops the connection)
//!        └──────┬──────┘
//!               │ Request parsed      Malformed → 400
//!               ▼                          │
//!        ┌──────────────────┐              │
//!        │   Processing     │ ← Route      │
//!        └──────┬───────────┘              │
//!               │ Response ready           │
//!               ▼                          │
//!        ┌──────────────────┐              │
//!        │    Writing       │ ◄────────────┘
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!            Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use parley::http::connection::Connection;
//! use parley::http::router::Router;
//! use parley::http::static_files::StaticFiles;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let router = Arc::new(Router::new(StaticFiles::new("public")));
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let router = Arc::clone(&router);
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, peer, router);
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod static_files;
pub mod writer;
