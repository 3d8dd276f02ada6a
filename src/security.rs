//! Security helpers shared by the static file resolver and the admin area.

use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::{Digest, Sha256};

/// Returns true when a request path is safe to resolve under the static root.
///
/// Rejects traversal sequences, hidden segments, absolute system directory
/// prefixes, drive letters or schemes (`:`), home expansion (`~`) and NUL.
/// Backslashes are treated as forward slashes.
///
/// ```
/// # use parley::security::is_safe_path;
/// assert!(is_safe_path("/css/app.css"));
/// assert!(!is_safe_path("/../etc/passwd"));
/// ```
pub fn is_safe_path(path: &str) -> bool {
    if path.is_empty() || path.contains('\0') {
        return false;
    }

    let normalized = path.replace('\\', "/");

    !(normalized.contains("..")
        || normalized.contains("./")
        || normalized.contains("/.")
        || normalized.starts_with("/etc/")
        || normalized.starts_with("/var/")
        || normalized.contains(':')
        || normalized.contains('~'))
}

/// Hex-encoded SHA-256 digest of `input`.
pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Random alphanumeric token of `len` characters.
pub fn generate_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Compares two strings without short-circuiting on the first difference.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Escapes the characters that are significant in HTML text and attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
