use std::collections::HashMap;
use std::fmt;

use bytes::BytesMut;
use percent_encoding::percent_decode_str;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::http::request::{Method, Request};

/// Hard cap on the request line plus headers.
pub const MAX_HEADER_SIZE: usize = 8 * 1024;

/// Hard cap on a declared request body. Larger bodies are not read.
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const HEADERS_END: &[u8] = b"\r\n\r\n";

#[derive(Debug)]
pub enum ParseError {
    /// The peer closed the stream before sending a single byte.
    Empty,
    /// The request line is missing or has fewer than two tokens.
    InvalidRequestLine,
    /// The method token is not one of the supported methods.
    InvalidMethod,
    /// Reading from the stream failed.
    Io(std::io::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty request"),
            ParseError::InvalidRequestLine => write!(f, "invalid request line"),
            ParseError::InvalidMethod => write!(f, "unsupported method"),
            ParseError::Io(e) => write!(f, "read error: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::Io(e)
    }
}

/// Reads and parses one request from `stream`.
///
/// The header block is read up to [`MAX_HEADER_SIZE`]; if the terminator is
/// not seen by then, whatever was captured is parsed. A body is read only
/// when `Content-Length` is positive and within [`MAX_BODY_SIZE`].
pub async fn parse_request<R>(stream: R) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);

    let (head, complete) = read_head(&mut reader).await?;
    if head.is_empty() {
        return Err(ParseError::Empty);
    }
    if !complete {
        tracing::warn!(
            captured = head.len(),
            "Header block exceeded limit or stream ended early, parsing what was captured"
        );
    }

    let mut request = parse_head(&head)?;

    let content_length = request.content_length();
    if content_length > 0 && content_length <= MAX_BODY_SIZE {
        request.body = read_body(&mut reader, content_length).await?;
    } else if content_length > MAX_BODY_SIZE {
        tracing::debug!(content_length, "Declared body exceeds limit, not reading it");
    }

    Ok(request)
}

/// Accumulates bytes until `\r\n\r\n`, the size cap, or end of stream.
///
/// Returns the captured bytes (terminator included) and whether the
/// terminator was found. Bytes after the terminator stay in `reader`.
async fn read_head<R>(reader: &mut R) -> std::io::Result<(BytesMut, bool)>
where
    R: AsyncBufRead + Unpin,
{
    let mut head = BytesMut::with_capacity(1024);

    loop {
        let (consumed, found) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok((head, false));
            }

            let room = MAX_HEADER_SIZE - head.len();
            let window = &available[..available.len().min(room)];

            // The terminator may straddle two reads.
            let scan_from = head.len().saturating_sub(HEADERS_END.len() - 1);
            head.extend_from_slice(window);

            match find_headers_end(&head[scan_from..]) {
                Some(pos) => {
                    let end = scan_from + pos + HEADERS_END.len();
                    let overshoot = head.len() - end;
                    head.truncate(end);
                    (window.len() - overshoot, true)
                }
                None => (window.len(), false),
            }
        };

        reader.consume(consumed);

        if found {
            return Ok((head, true));
        }
        if head.len() >= MAX_HEADER_SIZE {
            return Ok((head, false));
        }
    }
}

/// Reads exactly `len` body bytes, looping on partial reads.
///
/// Returns `None` when the stream ends before `len` bytes arrive.
async fn read_body<R>(reader: &mut R, len: usize) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let mut body = vec![0u8; len];
    let mut filled = 0;

    while filled < len {
        let n = reader.read(&mut body[filled..]).await?;
        if n == 0 {
            tracing::debug!(expected = len, received = filled, "Stream ended inside request body");
            return Ok(None);
        }
        filled += n;
    }

    Ok(Some(String::from_utf8_lossy(&body).into_owned()))
}

/// Parses a captured header block into a request without a body.
///
/// Header names are lower-cased, lines without a colon are skipped, and
/// cookies and query parameters are derived before returning.
pub fn parse_head(buf: &[u8]) -> Result<Request, ParseError> {
    let text = String::from_utf8_lossy(buf);
    let mut lines = text.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequestLine)?;
    let mut parts: Vec<&str> = request_line.split(' ').collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }

    if parts.len() < 2 {
        return Err(ParseError::InvalidRequestLine);
    }

    let method: Method = parts[0].parse()?;
    let target = parts[1];
    let version = parts.get(2).copied().unwrap_or("HTTP/1.0");

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        if line.is_empty() {
            break;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        headers.insert(key.to_ascii_lowercase(), value.trim().to_string());
    }

    let cookies = headers
        .get("cookie")
        .map(|h| parse_cookies(h))
        .unwrap_or_default();

    let (path, query_params) = match target.split_once('?') {
        Some((path, query)) => (path, parse_query(query)),
        None => (target, HashMap::new()),
    };

    Ok(Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        query_params,
        cookies,
        body: None,
    })
}

fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for param in query.split('&').filter(|p| !p.is_empty()) {
        match param.split_once('=') {
            Some((key, value)) => params.insert(url_decode(key), url_decode(value)),
            None => params.insert(url_decode(param), String::new()),
        };
    }

    params
}

/// Parses an `application/x-www-form-urlencoded` body.
///
/// Pairs without `=` are skipped.
pub fn parse_form_data(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (url_decode(key), url_decode(value)))
        .collect()
}

/// Decodes `+` as space and `%XX` escapes as UTF-8.
fn url_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADERS_END.len())
        .position(|w| w == HEADERS_END)
}
