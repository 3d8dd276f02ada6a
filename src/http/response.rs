use bytes::Bytes;

/// Value of the default `Server` header.
pub const SERVER_NAME: &str = concat!("parley/", env!("CARGO_PKG_VERSION"));

/// HTTP status codes produced by the server and its handlers.
///
/// - `Ok` (200): Request successful
/// - `Created` (201): Resource created successfully
/// - `Found` (302): Redirect
/// - `BadRequest` (400): Malformed request
/// - `Unauthorized` (401): Authentication required
/// - `Forbidden` (403): Access denied
/// - `NotFound` (404): Resource not found
/// - `MethodNotAllowed` (405): HTTP method not supported
/// - `InternalServerError` (500): Server error
/// - `ServiceUnavailable` (503): Feature disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 302 Found
    Found,
    /// 400 Bad Request
    BadRequest,
    /// 401 Unauthorized
    Unauthorized,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
    /// 503 Service Unavailable
    ServiceUnavailable,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use parley::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::Found => 302,
            StatusCode::BadRequest => 400,
            StatusCode::Unauthorized => 401,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
            StatusCode::ServiceUnavailable => 503,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use parley::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::Found => "Found",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }
}

/// Response payload. Text and binary are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Binary(Bytes),
}

impl Body {
    /// Wire bytes of the payload; text is UTF-8 encoded.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Body::Text(text) => Bytes::copy_from_slice(text.as_bytes()),
            Body::Binary(bytes) => bytes.clone(),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Text(String::new())
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
///
/// Headers keep their insertion order and are case-sensitive. `Server` and
/// `Connection: close` are present from construction. `Content-Length` is
/// never trusted from here: the writer recomputes it from the body.
#[derive(Debug, Clone)]
pub struct Response {
    /// Numeric status code
    pub status_code: u16,
    /// Reason phrase sent with the status code
    pub status_message: String,
    headers: Vec<(String, String)>,
    body: Body,
}

impl Response {
    /// Creates a response with the given status and the default headers.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status_code: status.as_u16(),
            status_message: status.reason_phrase().to_string(),
            headers: vec![
                ("Server".to_string(), SERVER_NAME.to_string()),
                ("Connection".to_string(), "close".to_string()),
            ],
            body: Body::default(),
        }
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.set_status_line(status.as_u16(), status.reason_phrase());
    }

    /// Sets an arbitrary status code together with its reason phrase.
    pub fn set_status_line(&mut self, code: u16, message: impl Into<String>) {
        self.status_code = code;
        self.status_message = message.into();
    }

    /// Adds a header, replacing the value in place if the name already exists.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| k != name);
    }

    /// Headers in insertion order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Sets a text body, discarding any binary body.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.body = Body::Text(text.into());
    }

    /// Sets a binary body, discarding any text body.
    pub fn set_binary(&mut self, bytes: impl Into<Bytes>) {
        self.body = Body::Binary(bytes.into());
    }

    pub fn has_binary_body(&self) -> bool {
        matches!(self.body, Body::Binary(_))
    }

    /// Sets a session-length cookie scoped to the whole site.
    pub fn set_cookie(&mut self, name: &str, value: &str, http_only: bool) {
        let mut cookie = format!("{}={}; Path=/", name, value);
        if http_only {
            cookie.push_str("; HttpOnly");
        }
        self.set_header("Set-Cookie", cookie);
    }

    /// Sets a cookie that expires after `max_age` seconds.
    pub fn set_cookie_with_max_age(&mut self, name: &str, value: &str, max_age: u64, http_only: bool) {
        let mut cookie = format!("{}={}; Path=/; Max-Age={}", name, value, max_age);
        if http_only {
            cookie.push_str("; HttpOnly");
        }
        self.set_header("Set-Cookie", cookie);
    }

    /// Expires a cookie immediately.
    pub fn clear_cookie(&mut self, name: &str) {
        self.set_header("Set-Cookie", format!("{}=; Path=/; Max-Age=0", name));
    }

    fn with_text(status: StatusCode, content_type: &str, body: impl Into<String>) -> Self {
        ResponseBuilder::new(status)
            .header("Content-Type", content_type)
            .text(body)
            .build()
    }

    /// Creates a 200 OK plain-text response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_text(StatusCode::Ok, "text/plain; charset=UTF-8", body)
    }

    /// Creates a 200 OK HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self::with_text(StatusCode::Ok, "text/html; charset=UTF-8", body)
    }

    /// Creates a 200 OK JSON response.
    pub fn json(body: impl Into<String>) -> Self {
        Self::with_text(StatusCode::Ok, "application/json; charset=UTF-8", body)
    }

    /// Creates a 201 Created response pointing at the new resource.
    pub fn created(location: &str, body: impl Into<String>) -> Self {
        ResponseBuilder::new(StatusCode::Created)
            .header("Location", location)
            .header("Content-Type", "text/plain; charset=UTF-8")
            .text(body)
            .build()
    }

    /// Creates a 302 Found redirect with an empty body.
    pub fn redirect(location: &str) -> Self {
        ResponseBuilder::new(StatusCode::Found)
            .header("Location", location)
            .build()
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_text(StatusCode::BadRequest, "text/plain; charset=UTF-8", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_text(StatusCode::Unauthorized, "text/plain; charset=UTF-8", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_text(StatusCode::Forbidden, "text/plain; charset=UTF-8", message)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_text(StatusCode::NotFound, "text/plain; charset=UTF-8", message)
    }

    /// Creates a 405 response listing the permitted methods in `Allow`.
    pub fn method_not_allowed(allowed: &str) -> Self {
        ResponseBuilder::new(StatusCode::MethodNotAllowed)
            .header("Allow", allowed)
            .header("Content-Type", "text/plain; charset=UTF-8")
            .text("405 Method Not Allowed")
            .build()
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_text(StatusCode::InternalServerError, "text/plain; charset=UTF-8", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::with_text(StatusCode::ServiceUnavailable, "text/plain; charset=UTF-8", message)
    }
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use parley::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "application/json")
///     .text("{}")
///     .build();
/// assert_eq!(response.status_code, 200);
/// ```
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            response: Response::new(status),
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.response.set_header(key, value);
        self
    }

    /// Sets a text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.response.set_text(body);
        self
    }

    /// Sets a binary body.
    pub fn binary(mut self, body: impl Into<Bytes>) -> Self {
        self.response.set_binary(body);
        self
    }

    pub fn build(self) -> Response {
        self.response
    }
}
