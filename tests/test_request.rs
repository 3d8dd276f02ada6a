use parley::http::request::{Method, Request, RequestBuilder};
use std::collections::HashMap;

fn request_with_headers(headers: &[(&str, &str)]) -> Request {
    let headers: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
        .collect();

    Request {
        method: Method::GET,
        path: "/".to_string(),
        version: "HTTP/1.1".to_string(),
        headers,
        query_params: HashMap::new(),
        cookies: HashMap::new(),
        body: None,
    }
}

#[test]
fn test_request_header_retrieval() {
    let req = request_with_headers(&[("Host", "example.com"), ("Content-Type", "application/json")]);

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.content_type(), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_content_length_parsing() {
    let req = request_with_headers(&[("Content-Length", " 42 ")]);

    assert_eq!(req.content_length(), 42);
}

#[test]
fn test_request_content_length_missing() {
    let req = request_with_headers(&[]);

    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_content_length_invalid() {
    assert_eq!(request_with_headers(&[("Content-Length", "not-a-number")]).content_length(), 0);
    assert_eq!(request_with_headers(&[("Content-Length", "-5")]).content_length(), 0);
}

#[test]
fn test_request_method_equality() {
    assert_eq!(Method::GET, Method::GET);
    assert_ne!(Method::GET, Method::POST);
}

#[test]
fn test_request_method_from_string() {
    assert_eq!("GET".parse::<Method>().ok(), Some(Method::GET));
    assert_eq!("post".parse::<Method>().ok(), Some(Method::POST));
    assert!("INVALID".parse::<Method>().is_err());
    assert!("PATCH".parse::<Method>().is_err());
}

#[test]
fn test_request_builder() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .path("/chat")
        .header("Content-Type", "text/plain")
        .query_param("limit", "5")
        .cookie("admin_session", "tok")
        .body("hello")
        .build()
        .unwrap();

    assert_eq!(req.version, "HTTP/1.1");
    assert_eq!(req.header("CONTENT-TYPE"), Some("text/plain"));
    assert_eq!(req.query_param("limit"), Some("5"));
    assert_eq!(req.cookie("admin_session"), Some("tok"));
    assert_eq!(req.body_str(), "hello");
    assert_eq!(req.to_string(), "POST /chat HTTP/1.1");
}

#[test]
fn test_request_builder_requires_method_and_path() {
    assert!(RequestBuilder::new().path("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());
}

#[test]
fn test_request_without_body() {
    let req = request_with_headers(&[]);

    assert!(req.body.is_none());
    assert_eq!(req.body_str(), "");
}
