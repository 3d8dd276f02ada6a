use time::OffsetDateTime;
use time::macros::format_description;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::request::Method;
use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Formats a timestamp as an RFC 1123 date in GMT,
/// e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(at: OffsetDateTime) -> String {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(format)
        .unwrap_or_default()
}

/// Serializes a response into wire bytes.
///
/// `Content-Length` is always computed from the body; a caller-supplied one
/// is dropped. For HEAD only the status line and headers are returned.
pub fn serialize_response(resp: &Response, method: Method) -> Vec<u8> {
    let body = resp.body().to_bytes();
    let mut buf = Vec::with_capacity(256 + body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status_code,
        resp.status_message
    );
    buf.extend_from_slice(status_line.as_bytes());

    push_header(&mut buf, "Date", &http_date(OffsetDateTime::now_utc()));
    push_header(&mut buf, "Content-Length", &body.len().to_string());

    for (k, v) in resp.headers() {
        if k.eq_ignore_ascii_case("Content-Length") {
            continue;
        }
        push_header(&mut buf, k, v);
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    if method != Method::HEAD {
        buf.extend_from_slice(&body);
    }

    buf
}

fn push_header(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response, method: Method) -> Self {
        Self {
            buffer: serialize_response(response, method),
            written: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
