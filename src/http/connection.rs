use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::http::parser::{parse_request, ParseError};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::http::router::Router;
use crate::http::writer::ResponseWriter;

/// Read and write deadline for a single connection.
pub const IO_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    router: Arc<Router>,
    io_timeout: Duration,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(Exchange),
    Closed,
}

/// A serialized response together with what is logged once it is sent.
pub struct Exchange {
    writer: ResponseWriter,
    method: String,
    path: String,
    status: u16,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr, router: Arc<Router>) -> Self {
        Self {
            stream,
            peer,
            router,
            io_timeout: IO_TIMEOUT,
            state: ConnectionState::Reading,
        }
    }

    pub fn with_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Serves exactly one request, then shuts the stream down.
    ///
    /// Timeouts drop the connection without a response. I/O errors are
    /// returned after the stream has been shut down.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        let _ = self.stream.shutdown().await;
        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = self.read_request().await?;
                }

                ConnectionState::Processing(req) => {
                    let response = self.dispatch(&req).await;

                    self.state = ConnectionState::Writing(Exchange {
                        writer: ResponseWriter::new(&response, req.method),
                        method: req.method.to_string(),
                        path: req.path.clone(),
                        status: response.status_code,
                    });
                }

                ConnectionState::Writing(mut exchange) => {
                    match timeout(self.io_timeout, exchange.writer.write_to_stream(&mut self.stream)).await {
                        Ok(res) => res?,
                        Err(_) => {
                            tracing::warn!(peer = %self.peer, "Client timeout while writing response");
                            return Ok(());
                        }
                    }

                    tracing::info!(
                        peer = %self.peer,
                        method = %exchange.method,
                        path = %exchange.path,
                        status = exchange.status,
                        "Response sent"
                    );
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ConnectionState> {
        let parsed = match timeout(self.io_timeout, parse_request(&mut self.stream)).await {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(peer = %self.peer, "Client timeout while reading request");
                return Ok(ConnectionState::Closed);
            }
        };

        match parsed {
            Ok(req) => {
                tracing::info!(
                    peer = %self.peer,
                    method = %req.method,
                    path = %req.path,
                    "Request received"
                );
                Ok(ConnectionState::Processing(req))
            }

            Err(ParseError::Io(e)) => Err(anyhow::anyhow!("read failed: {}", e)),

            Err(e) => {
                tracing::debug!(peer = %self.peer, error = %e, "Malformed request");
                let response = bad_request();

                Ok(ConnectionState::Writing(Exchange {
                    writer: ResponseWriter::new(&response, Method::GET),
                    method: "UNKNOWN".to_string(),
                    path: "/".to_string(),
                    status: response.status_code,
                }))
            }
        }
    }

    /// Routes the request; a panicking handler yields 500.
    async fn dispatch(&self, req: &Request) -> Response {
        match AssertUnwindSafe(self.router.route(req, self.peer))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(_) => {
                tracing::error!(
                    peer = %self.peer,
                    method = %req.method,
                    path = %req.path,
                    "Handler panicked"
                );
                Response::internal_error("Internal Server Error")
            }
        }
    }
}

fn bad_request() -> Response {
    ResponseBuilder::new(StatusCode::BadRequest)
        .header("Content-Type", "text/plain")
        .text("400 Bad Request")
        .build()
}
