use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::admin::auth::{AuthManager, AuthOutcome, RejectReason};
use crate::chat::{ChatSettings, SessionStore};
use crate::http::parser::parse_form_data;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::router::Handler;
use crate::http::static_files::StaticFiles;
use crate::logging::RecentLogs;
use crate::security::{escape_html, generate_token};
use crate::server::ConnectionStats;

pub const SESSION_COOKIE: &str = "admin_session";
pub const PENDING_2FA_COOKIE: &str = "2fa_pending";
const PENDING_2FA_MAX_AGE: u64 = 300;
const DEFAULT_LIMIT: usize = 100;

const LOGIN_PATH: &str = "/admin/login";
const DASHBOARD_PATH: &str = "/admin/dashboard";

/// Login, dashboard and JSON API for operating the server.
pub struct AdminHandler {
    auth: Arc<AuthManager>,
    stats: Arc<ConnectionStats>,
    sessions: SessionStore,
    settings: Arc<ChatSettings>,
    logs: RecentLogs,
    static_files: StaticFiles,
}

impl AdminHandler {
    pub fn new(
        auth: Arc<AuthManager>,
        stats: Arc<ConnectionStats>,
        sessions: SessionStore,
        settings: Arc<ChatSettings>,
        logs: RecentLogs,
        static_files: StaticFiles,
    ) -> Self {
        Self {
            auth,
            stats,
            sessions,
            settings,
            logs,
            static_files,
        }
    }

    fn is_authenticated(&self, request: &Request) -> bool {
        request
            .cookie(SESSION_COOKIE)
            .is_some_and(|token| self.auth.validate_session(token))
    }

    fn login_page(&self, request: &Request) -> Response {
        if self.is_authenticated(request) {
            return Response::redirect(DASHBOARD_PATH);
        }
        Response::html(login_html(None, false))
    }

    fn login(&self, request: &Request, peer: SocketAddr) -> Response {
        let mut form = parse_form_data(request.body_str());
        let (Some(username), Some(password)) = (form.remove("username"), form.remove("password")) else {
            return Response::html(login_html(Some("Username and password required"), false));
        };
        let otp = form.remove("otp");
        let client_ip = peer.ip().to_string();

        match self.auth.authenticate(&username, &password, otp.as_deref(), &client_ip) {
            AuthOutcome::Session(token) => {
                let mut response = Response::redirect(DASHBOARD_PATH);
                response.set_cookie(SESSION_COOKIE, &token, true);
                response
            }
            AuthOutcome::TwoFactorPending => {
                let mut response = Response::html(login_html(None, true));
                response.set_cookie_with_max_age(
                    PENDING_2FA_COOKIE,
                    &generate_token(16),
                    PENDING_2FA_MAX_AGE,
                    true,
                );
                response
            }
            AuthOutcome::Rejected(reason) => {
                let show_otp = reason == RejectReason::InvalidCode;
                Response::html(login_html(Some(reason.message()), show_otp))
            }
        }
    }

    fn logout(&self, request: &Request) -> Response {
        if let Some(token) = request.cookie(SESSION_COOKIE) {
            self.auth.invalidate_session(token);
        }
        let mut response = Response::redirect(LOGIN_PATH);
        response.clear_cookie(SESSION_COOKIE);
        response
    }

    async fn dashboard(&self, request: &Request) -> Response {
        if !self.is_authenticated(request) {
            return Response::redirect(LOGIN_PATH);
        }
        if !is_read(request.method) {
            return Response::method_not_allowed("GET, HEAD");
        }
        self.static_files.html_document("admin.html").await
    }

    fn status(&self) -> Response {
        let uptime = self.stats.uptime();
        let body = json!({
            "uptime": uptime.as_millis() as u64,
            "uptimeFormatted": format_uptime(uptime),
            "totalRequests": self.stats.total_requests(),
            "totalChatSessions": self.sessions.len(),
            "currentModel": self.settings.model(),
            "activeConnections": self.stats.active_connections(),
            "chatEnabled": self.settings.is_enabled(),
        });
        Response::json(body.to_string())
    }

    fn session_list(&self, request: &Request) -> anyhow::Result<Response> {
        let limit = query_usize(request, "limit");
        let summaries: Vec<_> = self
            .sessions
            .recent(limit)
            .iter()
            .map(|s| s.summary())
            .collect();
        Ok(Response::json(serde_json::to_string(&summaries)?))
    }

    fn recent_logs(&self, request: &Request) -> Response {
        let lines = query_usize(request, "lines");
        Response::json(json!({ "logs": self.logs.recent(lines) }).to_string())
    }

    fn set_model(&self, request: &Request) -> Response {
        let model = body_field(request, "model")
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        let Some(model) = model else {
            return Response::bad_request("Model parameter required");
        };

        self.settings.set_model(model.as_str());
        tracing::info!(model = %model, "Admin changed model");
        Response::json(json!({ "success": true, "model": model }).to_string())
    }

    fn toggle_chat(&self, request: &Request) -> Response {
        let enabled = match body_field(request, "enabled") {
            Some(value) => value.eq_ignore_ascii_case("true") || value == "1",
            None => !self.settings.is_enabled(),
        };

        self.settings.set_enabled(enabled);
        tracing::info!(enabled, "Admin toggled chat");
        Response::json(json!({ "success": true, "chatEnabled": enabled }).to_string())
    }

    async fn api(&self, endpoint: &str, request: &Request) -> anyhow::Result<Response> {
        if !self.is_authenticated(request) {
            return Ok(Response::unauthorized("Authentication required"));
        }

        let method = request.method;
        let response = match endpoint {
            "status" if is_read(method) => self.status(),
            "sessions" if is_read(method) => self.session_list(request)?,
            "logs" if is_read(method) => self.recent_logs(request),
            "status" | "sessions" | "logs" => Response::method_not_allowed("GET, HEAD"),
            "model" if method == Method::POST => self.set_model(request),
            "toggle-chat" if method == Method::POST => self.toggle_chat(request),
            "model" | "toggle-chat" => Response::method_not_allowed("POST"),
            _ => Response::not_found("Admin endpoint not found"),
        };
        Ok(response)
    }
}

#[async_trait]
impl Handler for AdminHandler {
    async fn handle(&self, request: &Request, peer: SocketAddr) -> anyhow::Result<Response> {
        let path = request.path.as_str();

        let response = match path {
            "/admin" | "/admin/" => {
                if self.is_authenticated(request) {
                    Response::redirect(DASHBOARD_PATH)
                } else {
                    Response::redirect(LOGIN_PATH)
                }
            }
            LOGIN_PATH => match request.method {
                Method::GET => self.login_page(request),
                Method::POST => self.login(request, peer),
                _ => Response::method_not_allowed("GET, POST"),
            },
            "/admin/logout" => self.logout(request),
            DASHBOARD_PATH => self.dashboard(request).await,
            _ => match path.strip_prefix("/admin/api/") {
                Some(endpoint) => return self.api(endpoint, request).await,
                None => Response::not_found("Admin endpoint not found"),
            },
        };

        Ok(response)
    }
}

fn is_read(method: Method) -> bool {
    matches!(method, Method::GET | Method::HEAD)
}

fn query_usize(request: &Request, key: &str) -> usize {
    request
        .query_param(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_LIMIT)
}

/// A field from a JSON object body, falling back to form data.
/// JSON booleans and numbers are returned in their text form.
fn body_field(request: &Request, key: &str) -> Option<String> {
    let body = request.body_str();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        return match map.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
    }
    parse_form_data(body).remove(key)
}

/// Renders uptime as `Xd Yh Zm`, `Xh Ym Zs`, `Xm Ys` or `Xs`.
pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h {}m", days, hours % 24, minutes % 60)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes % 60, seconds % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

fn login_html(error: Option<&str>, show_otp: bool) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         \x20   <meta charset=\"UTF-8\">\n\
         \x20   <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         \x20   <title>Admin Login</title>\n\
         \x20   <link rel=\"stylesheet\" href=\"/styles.css\">\n\
         </head>\n\
         <body>\n\
         \x20   <div class=\"login-container\">\n\
         \x20       <h1>Admin Login</h1>\n",
    );

    if let Some(error) = error {
        html.push_str(&format!(
            "        <div class=\"error\">{}</div>\n",
            escape_html(error)
        ));
    }

    html.push_str(
        "        <form method=\"POST\" action=\"/admin/login\">\n\
         \x20           <div class=\"form-group\">\n\
         \x20               <label for=\"username\">Username</label>\n\
         \x20               <input type=\"text\" id=\"username\" name=\"username\" required>\n\
         \x20           </div>\n\
         \x20           <div class=\"form-group\">\n\
         \x20               <label for=\"password\">Password</label>\n\
         \x20               <input type=\"password\" id=\"password\" name=\"password\" required>\n\
         \x20           </div>\n",
    );

    if show_otp {
        html.push_str(
            "            <div class=\"form-group\">\n\
             \x20               <label for=\"otp\">2FA Code</label>\n\
             \x20               <input type=\"text\" id=\"otp\" name=\"otp\" pattern=\"[0-9]{6}\" required>\n\
             \x20           </div>\n",
        );
    }

    html.push_str(
        "            <button type=\"submit\">Login</button>\n\
         \x20       </form>\n\
         \x20   </div>\n\
         </body>\n\
         </html>",
    );
    html
}
