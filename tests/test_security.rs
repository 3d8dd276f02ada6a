use parley::security::is_safe_path;

#[test]
fn test_safe_paths() {
    for path in ["/index.html", "/css/app.css", "/img/logo.v2.png", "/a/b/c.js"] {
        assert!(is_safe_path(path), "{} should be safe", path);
    }
}

#[test]
fn test_unsafe_paths() {
    for path in [
        "",
        "/../etc/passwd",
        "a/../../b",
        "/..\\windows",
        "/.env",
        "/css/./app.css",
        "/etc/passwd",
        "/var/log/syslog",
        "/C:/boot.ini",
        "/~root",
        "/a\0b",
    ] {
        assert!(!is_safe_path(path), "{:?} should be rejected", path);
    }
}
