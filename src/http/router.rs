//! Path-prefix dispatch to handlers, with static files as the fallback.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::static_files::StaticFiles;

/// A collaborator that answers every request under a mounted prefix.
///
/// Handlers validate their own methods and authorization. Returning an
/// error makes the router answer 500.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: &Request, peer: SocketAddr) -> anyhow::Result<Response>;
}

pub struct Router {
    routes: Vec<(String, Arc<dyn Handler>)>,
    static_files: StaticFiles,
}

impl Router {
    pub fn new(static_files: StaticFiles) -> Self {
        Self {
            routes: Vec::new(),
            static_files,
        }
    }

    /// Mounts `handler` for every path starting with `prefix`.
    /// Earlier mounts win.
    pub fn mount(mut self, prefix: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.routes.push((prefix.into(), handler));
        self
    }

    pub async fn route(&self, request: &Request, peer: SocketAddr) -> Response {
        let handler = self
            .routes
            .iter()
            .find(|(prefix, _)| request.path.starts_with(prefix.as_str()));

        match handler {
            Some((prefix, handler)) => match handler.handle(request, peer).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(
                        prefix = %prefix,
                        method = %request.method,
                        path = %request.path,
                        error = %e,
                        "Handler failed"
                    );
                    Response::internal_error("Internal Server Error")
                }
            },
            None => self.static_files.serve(request).await,
        }
    }
}
