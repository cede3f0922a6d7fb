//! HTTP configuration endpoint
//!
//! Transport-free request handling: the HTTP server hands over the method,
//! path and body, and gets back a status, content type and the response
//! body written into a caller buffer.
//!
//! | Route            | Response                                   |
//! |------------------|--------------------------------------------|
//! | `GET /config`    | 200, object of visible settings            |
//! | `POST /config`   | 200, `status` plus the updated settings    |
//! | `GET /describe`  | 200, array of `{name, type, readonly}`     |
//! | anything else    | portal page in config mode, otherwise 404  |

#[cfg(feature = "defmt")]
use defmt::debug;

use iothing_core::settings::Settings;

use crate::config::{apply, write_json, ApplyReport, ConfigRequest, ConfigView, DescribeView};

/// Path of the settings resource
pub const CONFIG_PATH: &str = "/config";

/// Path of the settings description
pub const DESCRIBE_PATH: &str = "/describe";

/// Body of the captive portal fallback
pub const PORTAL_TEXT: &str = "IoThing Configuration";

/// Body of the 404 response
pub const NOT_FOUND_TEXT: &str = "Resource not found.";

/// Body of the 405 response
pub const METHOD_NOT_ALLOWED_TEXT: &str = "Method not allowed.";

/// Body of a rejected configuration update
const REJECTED_JSON: &str = r#"{"status":false}"#;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    Get,
    Post,
    Other,
}

impl Method {
    pub fn parse(method: &str) -> Self {
        match method {
            "GET" => Method::Get,
            "POST" => Method::Post,
            _ => Method::Other,
        }
    }
}

/// An incoming request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: Method,
    pub path: &'a str,
    pub body: &'a [u8],
}

impl<'a> Request<'a> {
    pub fn get(path: &'a str) -> Self {
        Self {
            method: Method::Get,
            path,
            body: &[],
        }
    }

    pub fn post(path: &'a str, body: &'a [u8]) -> Self {
        Self {
            method: Method::Post,
            path,
            body,
        }
    }
}

/// Response body type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ContentType {
    Json,
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Text => "text/plain",
        }
    }
}

/// Response metadata; the body is the first `len` bytes of the output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    pub status: u16,
    pub content_type: ContentType,
    pub len: usize,
    /// Settings were modified; the caller should save them
    pub changed: bool,
    /// The SSID or password was modified
    pub credentials_changed: bool,
}

impl Response {
    fn new(status: u16, content_type: ContentType, len: usize) -> Self {
        Self {
            status,
            content_type,
            len,
            changed: false,
            credentials_changed: false,
        }
    }

    fn server_error() -> Self {
        Self::new(500, ContentType::Text, 0)
    }

    fn with_report(mut self, report: &ApplyReport) -> Self {
        self.changed = report.changed();
        self.credentials_changed = report.credentials_changed;
        self
    }
}

/// Answer one request
///
/// `portal` selects the captive portal behavior for unknown paths (access
/// point mode). A response that does not fit `out` becomes a 500 with an
/// empty body; changes already applied are still reported.
pub fn handle(
    request: &Request<'_>,
    settings: &mut Settings<'_, '_>,
    portal: bool,
    out: &mut [u8],
) -> Response {
    #[cfg(feature = "defmt")]
    debug!("http: {} {}", request.method, request.path);

    match (request.method, request.path) {
        (Method::Get, CONFIG_PATH) => json(&ConfigView::new(settings), 200, out),
        (Method::Post, CONFIG_PATH) => update(request.body, settings, out),
        (_, CONFIG_PATH) => text(405, METHOD_NOT_ALLOWED_TEXT, out),
        (Method::Get, DESCRIBE_PATH) => json(&DescribeView::new(settings), 200, out),
        _ if portal => text(200, PORTAL_TEXT, out),
        _ => text(404, NOT_FOUND_TEXT, out),
    }
}

fn update(body: &[u8], settings: &mut Settings<'_, '_>, out: &mut [u8]) -> Response {
    let request = match ConfigRequest::parse(body) {
        Ok(request) => request,
        Err(_e) => {
            #[cfg(feature = "defmt")]
            debug!("http: rejected body: {}", _e);
            return raw(400, ContentType::Json, REJECTED_JSON, out);
        }
    };

    let report = apply(settings, &request);
    json(
        &ConfigView::with_status(settings, report.all_applied()),
        200,
        out,
    )
    .with_report(&report)
}

fn json<T: serde::Serialize>(value: &T, status: u16, out: &mut [u8]) -> Response {
    match write_json(value, out) {
        Ok(len) => Response::new(status, ContentType::Json, len),
        Err(_) => Response::server_error(),
    }
}

fn text(status: u16, body: &str, out: &mut [u8]) -> Response {
    raw(status, ContentType::Text, body, out)
}

fn raw(status: u16, content_type: ContentType, body: &str, out: &mut [u8]) -> Response {
    match out.get_mut(..body.len()) {
        Some(dst) => {
            dst.copy_from_slice(body.as_bytes());
            Response::new(status, content_type, body.len())
        }
        None => Response::server_error(),
    }
}
