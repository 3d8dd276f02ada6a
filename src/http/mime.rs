//! MIME type detection based on file extensions.

/// Fallback for unmapped extensions.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

const MIME_TYPES: &[(&str, &str)] = &[
    // Text
    ("html", "text/html; charset=UTF-8"),
    ("htm", "text/html; charset=UTF-8"),
    ("css", "text/css; charset=UTF-8"),
    ("js", "application/javascript; charset=UTF-8"),
    ("json", "application/json; charset=UTF-8"),
    ("xml", "application/xml; charset=UTF-8"),
    ("txt", "text/plain; charset=UTF-8"),
    // Images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    // Fonts
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("eot", "application/vnd.ms-fontobject"),
    // Other
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
];

/// Resolves the MIME type for a request path from its extension.
///
/// ```
/// # use parley::http::mime::mime_type_for;
/// assert_eq!(mime_type_for("/css/app.CSS"), "text/css; charset=UTF-8");
/// assert_eq!(mime_type_for("/download"), "application/octet-stream");
/// ```
pub fn mime_type_for(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);

    let Some((stem, ext)) = file_name.rsplit_once('.') else {
        return DEFAULT_MIME_TYPE;
    };
    if stem.is_empty() {
        return DEFAULT_MIME_TYPE;
    }

    let ext = ext.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(mime_type_for("/index.html"), "text/html; charset=UTF-8");
        assert_eq!(mime_type_for("/img/logo.png"), "image/png");
        assert_eq!(mime_type_for("/fonts/a.woff2"), "font/woff2");
    }

    #[test]
    fn unknown_or_missing_extension_falls_back() {
        assert_eq!(mime_type_for("/archive.tar"), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type_for("/README"), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type_for("/.hidden"), DEFAULT_MIME_TYPE);
    }
}
