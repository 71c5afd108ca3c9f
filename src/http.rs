use crate::error::{ServerError, ServerResult};
use std::io::{Read, Write};

/// HTTP status codes used by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok = 200,
    NotFound = 404,
    TooManyRequests = 429,
}

impl Status {
    /// Get the reason phrase for this status code
    pub fn as_str(&self) -> &'static str {
        reason_phrase(*self as u16)
    }
}

/// Map a numeric status code to its reason phrase
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        _ => "Unknown",
    }
}

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Trace,
    Connect,
    Patch,
}

impl Method {
    /// Parse a method from a string
    pub fn from_str(s: &str) -> ServerResult<Self> {
        match s {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            "TRACE" => Ok(Method::Trace),
            "CONNECT" => Ok(Method::Connect),
            "PATCH" => Ok(Method::Patch),
            _ => Err(ServerError::HttpParse(format!("Invalid method: {}", s))),
        }
    }

    /// Convert the method to a string
    pub fn as_str(&self) -> &'static str {
        match *self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
            Method::Patch => "PATCH",
        }
    }
}

/// A parsed HTTP request line.
///
/// The method is kept as the raw token so the handler can distinguish an
/// unsupported method (answered with 404) from an unparsable request line
/// (connection dropped without a response). Headers are read up to the
/// terminator but never interpreted.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub raw_path: String,
    pub version: String,
}

impl Request {
    /// True if the request method is GET
    pub fn is_get(&self) -> bool {
        matches!(Method::from_str(&self.method), Ok(Method::Get))
    }
}

/// Read from the stream until the header terminator (`\r\n\r\n`) is seen.
///
/// Partial reads accumulate; a peer that closes before sending a complete
/// head yields an error and the connection is dropped without a response.
pub fn read_request_head<R: Read>(stream: &mut R) -> ServerResult<String> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];

    while !contains_terminator(&head) {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(ServerError::HttpParse(
                "connection closed before complete request head".to_string(),
            ));
        }
        head.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8(head)
        .map_err(|_| ServerError::HttpParse("request head is not valid UTF-8".to_string()))
}

fn contains_terminator(buf: &[u8]) -> bool {
    buf.windows(4).any(|w| w == b"\r\n\r\n")
}

/// Parse the request line out of a complete request head
pub fn parse_request(head: &str) -> ServerResult<Request> {
    let request_line = head
        .split("\r\n")
        .next()
        .ok_or_else(|| ServerError::HttpParse("empty request head".to_string()))?;

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(ServerError::HttpParse("invalid request line".to_string()));
    }

    Ok(Request {
        method: parts[0].to_string(),
        raw_path: parts[1].to_string(),
        version: parts[2].to_string(),
    })
}

/// HTTP response
///
/// Serialization is deterministic: status line, `Connection: close`, then
/// Content-Type and Content-Length when present, a blank line, and the body.
/// Content-Length is omitted for empty bodies (the favicon response carries
/// a type but no length).
#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    /// Create an empty response with the given status
    pub fn new(status: Status) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    /// Create a response with a body and content type
    pub fn with_body(status: Status, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: Some(content_type.to_string()),
            body,
        }
    }

    /// The uniform not-found response.
    ///
    /// Outside-root and nonexistent paths share this answer so the response
    /// leaks nothing about what exists beyond the served root.
    pub fn not_found() -> Self {
        Self::with_body(Status::NotFound, "text/plain", b"404 Not Found".to_vec())
    }

    /// The rate-limited response
    pub fn too_many_requests() -> Self {
        Self::with_body(
            Status::TooManyRequests,
            "text/plain",
            b"429 Too Many Requests".to_vec(),
        )
    }

    /// Empty successful favicon response, keeps browser noise out of the counters
    pub fn empty_favicon() -> Self {
        Self {
            status: Status::Ok,
            content_type: Some("image/x-icon".to_string()),
            body: Vec::new(),
        }
    }

    /// An HTML page response
    pub fn html(body: String) -> Self {
        Self::with_body(Status::Ok, "text/html; charset=utf-8", body.into_bytes())
    }

    /// Serialize the response to a byte vector
    pub fn serialize(&self, writer: &mut Vec<u8>) -> ServerResult<()> {
        write!(
            writer,
            "HTTP/1.1 {} {}\r\n",
            self.status as u16,
            self.status.as_str()
        )?;
        write!(writer, "Connection: close\r\n")?;

        if let Some(content_type) = &self.content_type {
            write!(writer, "Content-Type: {}\r\n", content_type)?;
        }
        if !self.body.is_empty() {
            write!(writer, "Content-Length: {}\r\n", self.body.len())?;
        }

        write!(writer, "\r\n")?;
        writer.extend_from_slice(&self.body);

        Ok(())
    }
}
