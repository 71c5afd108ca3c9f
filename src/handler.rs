use crate::config::ServerConfig;
use crate::counter::AccessCounter;
use crate::error::ServerResult;
use crate::http::{self, Request, Response};
use crate::listing;
use crate::rate_limit::RateLimiter;
use crate::resolver::PathResolver;
use log::{debug, info, warn};
use std::fs;
use std::io::Write;
use std::net::{IpAddr, TcpStream};
use std::path::Path;
use std::time::Instant;

/// Placeholder in the root index.html that the rendered listing replaces
const LISTING_PLACEHOLDER: &str = "<ul id=\"file-list\"></ul>";

/// Per-connection request processing.
///
/// One handler instance is shared by all connection threads; everything
/// mutable inside it (the rate-limit windows, the counter table) guards
/// itself. Each connection gets exactly one request, one response, and a
/// close - no keep-alive, no pipelining.
pub struct RequestHandler {
    resolver: PathResolver,
    rate_limiter: RateLimiter,
    counter: AccessCounter,
}

impl RequestHandler {
    /// Create a handler for the configured root and rate limit
    pub fn new(config: &ServerConfig) -> ServerResult<Self> {
        Ok(Self {
            resolver: PathResolver::new(&config.root_dir)?,
            rate_limiter: RateLimiter::new(
                config.rate_limit_window,
                config.rate_limit_max_requests,
            ),
            counter: AccessCounter::new(),
        })
    }

    /// The shared access counter
    pub fn counter(&self) -> &AccessCounter {
        &self.counter
    }

    /// Run one connection to completion.
    ///
    /// Any failure here - an unparsable request, a peer that hangs up, a
    /// write error - ends this connection only. Errors are logged and never
    /// reach the accept loop or other connections.
    pub fn handle_connection(&self, mut stream: TcpStream) {
        let peer = match stream.peer_addr() {
            Ok(peer) => peer,
            Err(e) => {
                debug!("could not read peer address: {}", e);
                return;
            }
        };
        debug!("connection from {}", peer);

        // A malformed or truncated request gets no response at all
        let head = match http::read_request_head(&mut stream) {
            Ok(head) => head,
            Err(e) => {
                debug!("{}: dropping connection: {}", peer, e);
                return;
            }
        };
        let request = match http::parse_request(&head) {
            Ok(request) => request,
            Err(e) => {
                debug!("{}: dropping connection: {}", peer, e);
                return;
            }
        };

        let response = match self.dispatch(&request, peer.ip(), Instant::now()) {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "{}: error handling {} {}: {}",
                    peer, request.method, request.raw_path, e
                );
                return;
            }
        };

        info!(
            "{} {} {} -> {}",
            peer,
            request.method,
            request.raw_path,
            response.status as u16
        );

        let mut bytes = Vec::new();
        if response.serialize(&mut bytes).is_ok() {
            if let Err(e) = stream.write_all(&bytes) {
                debug!("{}: write failed: {}", peer, e);
            }
        }
    }

    /// Route a parsed request to its response.
    ///
    /// `now` is injected rather than read inside so rate-limit behavior is
    /// deterministic under test.
    pub fn dispatch(&self, request: &Request, client: IpAddr, now: Instant) -> ServerResult<Response> {
        // Only GET is served; everything else shares the 404 answer
        // (deliberately no 405)
        if !request.is_get() {
            return Ok(Response::not_found());
        }

        if !self.rate_limiter.admit(client, now) {
            return Ok(Response::too_many_requests());
        }

        if request.raw_path == "/favicon.ico" {
            return Ok(Response::empty_favicon());
        }

        if request.raw_path == "/" || request.raw_path.is_empty() {
            return self.serve_index();
        }

        let resolved = match self.resolver.resolve(&request.raw_path) {
            Some(path) => path,
            None => return Ok(Response::not_found()),
        };

        if resolved.is_dir() {
            let rel_prefix = self.resolver.relative_to_root(&resolved);
            let counts = self.counter.snapshot();
            let fragment = listing::render(&resolved, &rel_prefix, &counts)?;
            return Ok(Response::html(fragment));
        }

        if resolved.is_file() {
            self.counter.increment(&self.resolver.relative_to_root(&resolved));
            return self.serve_file(&resolved);
        }

        Ok(Response::not_found())
    }

    /// Serve the root index.html with the live listing spliced in.
    ///
    /// A root without an index.html is a 404; nested directories instead get
    /// an automatic listing from `dispatch`.
    fn serve_index(&self) -> ServerResult<Response> {
        let index_path = self.resolver.root().join("index.html");
        if !index_path.is_file() {
            return Ok(Response::not_found());
        }

        let page = fs::read_to_string(index_path)?;
        let counts = self.counter.snapshot();
        let fragment = listing::render(self.resolver.root(), "", &counts)?;

        let page = page.replace(
            LISTING_PLACEHOLDER,
            &format!("<ul id=\"file-list\">\n{}</ul>", fragment),
        );
        Ok(Response::html(page))
    }

    fn serve_file(&self, path: &Path) -> ServerResult<Response> {
        let content_type = match content_type_for(path) {
            Some(content_type) => content_type,
            // The file exists but its type is not served
            None => return Ok(Response::not_found()),
        };

        let body = fs::read(path)?;
        Ok(Response::with_body(http::Status::Ok, content_type, body))
    }
}

/// Content types the server will actually deliver.
///
/// Narrower than the listing allow-list: jpg and gif entries appear in
/// listings but resolve to 404 when fetched, matching the served-type policy.
fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "html" | "htm" => Some("text/html"),
        "png" => Some("image/png"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}
