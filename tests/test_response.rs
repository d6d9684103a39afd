use keel::http::request::Version;
use keel::http::response::{Response, ResponseBuilder, StatusCode};
use keel::http::writer::serialize_response;

#[test]
fn test_status_code_table() {
    let table = [
        (200, "OK"),
        (201, "Created"),
        (204, "No Content"),
        (301, "Moved Permanently"),
        (302, "Found"),
        (400, "Bad Request"),
        (401, "Unauthorized"),
        (403, "Forbidden"),
        (404, "Not Found"),
        (405, "Method Not Allowed"),
        (408, "Request Timeout"),
        (500, "Internal Server Error"),
        (501, "Not Implemented"),
        (502, "Bad Gateway"),
        (503, "Service Unavailable"),
    ];

    for (code, reason) in table {
        let status = StatusCode::from_u16(code);
        assert_eq!(status.as_u16(), code);
        assert_eq!(status.reason_phrase(), reason);
    }
}

#[test]
fn test_unknown_status_collapses_to_500() {
    for code in [0, 100, 202, 418, 504, 999] {
        let status = StatusCode::from_u16(code);
        assert_eq!(status, StatusCode::InternalServerError);
        assert_eq!(status.as_u16(), 500);
    }

    let mut response = Response::default();
    response.set_status(299);
    assert_eq!(response.status, StatusCode::InternalServerError);
}

#[test]
fn test_response_builder_basic() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(b"Hello, World!".to_vec())
        .build();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body(), Some(&b"Hello, World!"[..]));
    assert_eq!(response.header("Content-Length"), Some("13"));
}

#[test]
fn test_response_headers_keep_insertion_order() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("X-Custom", "value")
        .header("Cache-Control", "no-cache")
        .body("test")
        .build();

    let names: Vec<&str> = response.headers().map(|(k, _)| k).collect();
    assert_eq!(
        names,
        vec!["Content-Type", "X-Custom", "Cache-Control", "Content-Length"]
    );
}

#[test]
fn test_response_headers_are_case_sensitive() {
    let mut response = Response::default();
    response.set_header("X-Thing", "a");
    response.set_header("x-thing", "b");

    assert_eq!(response.header("X-Thing"), Some("a"));
    assert_eq!(response.header("x-thing"), Some("b"));
    assert_eq!(response.headers().count(), 2);
}

#[test]
fn test_set_header_replaces_in_place() {
    let mut response = Response::default();
    response.set_header("A", "1");
    response.set_header("B", "2");
    response.set_header("A", "3");

    let pairs: Vec<(&str, &str)> = response.headers().collect();
    assert_eq!(pairs, vec![("A", "3"), ("B", "2")]);
}

#[test]
fn test_content_length_follows_body() {
    let mut response = Response::default();
    assert_eq!(response.header("Content-Length"), None);

    response.set_body("abc");
    assert_eq!(response.header("Content-Length"), Some("3"));

    response.append_body(b"defg");
    assert_eq!(response.header("Content-Length"), Some("7"));
    assert_eq!(response.body(), Some(&b"abcdefg"[..]));

    response.set_body("");
    assert_eq!(response.header("Content-Length"), Some("0"));
}

#[test]
fn test_explicit_content_length_is_overwritten_by_body() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.header("Content-Length"), Some("4"));
}

#[test]
fn test_append_body_without_prior_body() {
    let mut response = Response::default();
    response.append_body(b"xy");

    assert_eq!(response.body(), Some(&b"xy"[..]));
    assert_eq!(response.header("Content-Length"), Some("2"));
}

#[test]
fn test_set_version_accepts_known_labels_only() {
    let mut response = Response::default();

    assert!(response.set_version("1.0"));
    assert_eq!(response.version, Version::Http10);

    assert!(!response.set_version("3"));
    assert_eq!(response.version, Version::Http10);

    assert!(response.set_version("2"));
    assert_eq!(response.version, Version::Http2);
}

#[test]
fn test_not_found_serializes_with_exact_content_length() {
    let response = Response::new(404, "<h1> 404 Not Found </h1>");
    let wire = serialize_response(&response);
    let text = String::from_utf8(wire).unwrap();

    assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(text.contains("Content-Length: 24\r\n"));
    assert!(text.ends_with("\r\n\r\n<h1> 404 Not Found </h1>\r\n\r\n"));
}

#[test]
fn test_response_not_found_helper() {
    let response = Response::not_found();

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.body(), Some(&b"<h1> 404 Not Found </h1>"[..]));
    assert_eq!(response.header("Content-Length"), Some("24"));
}

#[test]
fn test_response_internal_error_helper() {
    let response = Response::internal_error();

    assert_eq!(response.status, StatusCode::InternalServerError);
    assert_eq!(response.body(), Some(&b"Error"[..]));
}

#[test]
fn test_serialize_uses_response_version() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .version(Version::Http10)
        .body("x")
        .build();

    let wire = serialize_response(&response);
    assert_eq!(
        wire,
        b"HTTP/1.0 200 OK\r\nContent-Length: 1\r\n\r\nx\r\n\r\n".to_vec()
    );
}
