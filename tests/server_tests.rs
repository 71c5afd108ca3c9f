use servedir::{Server, ServerConfig, ShutdownHandle};
use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::thread;
use std::time::Duration;

// End-to-end tests over real sockets: each test gets its own server on an
// ephemeral loopback port and its own served directory, so rate-limit state
// never leaks between tests.

fn fixture_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("index.html"),
        "<html><body><h1>Files</h1><ul id=\"file-list\"></ul></body></html>",
    )
    .unwrap();
    fs::write(dir.path().join("a.pdf"), b"%PDF-1.4 test").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/photo.png"), b"\x89PNG").unwrap();
    dir
}

fn start_server(
    root: &Path,
    window: Duration,
    max_requests: usize,
) -> (SocketAddr, ShutdownHandle, thread::JoinHandle<()>) {
    let config = ServerConfig::new()
        .with_address("127.0.0.1", 0)
        .with_root_dir(root)
        .with_rate_limit(window, max_requests);

    let server = Server::new(&config).unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle().unwrap();

    let handle = thread::spawn(move || {
        server.run().unwrap();
    });

    (addr, shutdown, handle)
}

/// Issue one GET and return (status code, response head, body)
fn get(addr: SocketAddr, path: &str) -> (u16, String, Vec<u8>) {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    write!(stream, "GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path).unwrap();

    // Connection: close, so read to EOF
    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();

    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    let head = String::from_utf8(response[..split].to_vec()).unwrap();
    let body = response[split + 4..].to_vec();

    let status: u16 = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("response has no status code");

    (status, head, body)
}

#[test]
fn test_index_listing_tracks_request_counts() {
    let root = fixture_root();
    let (addr, shutdown, server) = start_server(root.path(), Duration::from_secs(1), 1000);

    // Fresh server: the placeholder is replaced and counts start at zero
    let (status, head, body) = get(addr, "/");
    assert_eq!(status, 200);
    assert!(head.contains("Content-Type: text/html"));
    assert!(head.contains("Connection: close"));
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains("<ul id=\"file-list\">"));
    assert!(page.contains("<li><a href=\"/a.pdf\">a.pdf</a> (0 requests)</li>"));

    // Fetch the file itself
    let (status, head, body) = get(addr, "/a.pdf");
    assert_eq!(status, 200);
    assert!(head.contains("Content-Type: application/pdf"));
    assert_eq!(body, b"%PDF-1.4 test");

    // The next index reflects the fetch
    let (status, _, body) = get(addr, "/");
    assert_eq!(status, 200);
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains("a.pdf</a> (1 requests)"));

    shutdown.shutdown();
    server.join().unwrap();
}

#[test]
fn test_burst_is_rate_limited_and_recovers() {
    let root = fixture_root();
    let (addr, shutdown, server) = start_server(root.path(), Duration::from_secs(1), 5);

    let mut statuses = Vec::new();
    for _ in 0..6 {
        let (status, _, _) = get(addr, "/a.pdf");
        statuses.push(status);
    }
    assert_eq!(&statuses[..5], &[200, 200, 200, 200, 200]);
    assert_eq!(statuses[5], 429);

    // After the window passes, the client has full capacity again
    thread::sleep(Duration::from_millis(1100));
    let (status, _, _) = get(addr, "/a.pdf");
    assert_eq!(status, 200);

    shutdown.shutdown();
    server.join().unwrap();
}

#[test]
fn test_traversal_attempts_are_not_found() {
    let root = fixture_root();
    let (addr, shutdown, server) = start_server(root.path(), Duration::from_secs(1), 1000);

    for path in ["/../etc/passwd", "/sub/../../etc/passwd", "/%2e%2e/%2e%2e/etc/passwd"] {
        let (status, _, body) = get(addr, path);
        assert_eq!(status, 404, "traversal path {} must be rejected", path);
        assert!(!String::from_utf8_lossy(&body).contains("root:"));
    }

    shutdown.shutdown();
    server.join().unwrap();
}

#[test]
fn test_nested_directory_listing_and_favicon() {
    let root = fixture_root();
    let (addr, shutdown, server) = start_server(root.path(), Duration::from_secs(1), 1000);

    let (status, _, body) = get(addr, "/sub");
    assert_eq!(status, 200);
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains("<li><a href=\"/sub/photo.png\">photo.png</a> (0 requests)</li>"));

    let (status, head, body) = get(addr, "/favicon.ico");
    assert_eq!(status, 200);
    assert!(head.contains("Content-Type: image/x-icon"));
    assert!(body.is_empty());

    shutdown.shutdown();
    server.join().unwrap();
}

#[test]
fn test_non_get_and_missing_paths_are_not_found() {
    let root = fixture_root();
    let (addr, shutdown, server) = start_server(root.path(), Duration::from_secs(1), 1000);

    let mut stream = TcpStream::connect(addr).unwrap();
    write!(stream, "POST /a.pdf HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    assert!(String::from_utf8_lossy(&response).starts_with("HTTP/1.1 404 Not Found"));

    let (status, _, _) = get(addr, "/missing.pdf");
    assert_eq!(status, 404);

    shutdown.shutdown();
    server.join().unwrap();
}

#[test]
fn test_malformed_request_closes_without_response() {
    let root = fixture_root();
    let (addr, shutdown, server) = start_server(root.path(), Duration::from_secs(1), 1000);

    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    write!(stream, "NOT-HTTP\r\n\r\n").unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    assert!(response.is_empty());

    shutdown.shutdown();
    server.join().unwrap();
}

#[test]
fn test_concurrent_clients_all_counted() {
    const CLIENTS: usize = 8;

    let root = fixture_root();
    let (addr, shutdown, server) = start_server(root.path(), Duration::from_secs(1), 1000);

    let fetchers: Vec<_> = (0..CLIENTS)
        .map(|_| {
            thread::spawn(move || {
                let (status, _, _) = get(addr, "/a.pdf");
                status
            })
        })
        .collect();

    for fetcher in fetchers {
        assert_eq!(fetcher.join().unwrap(), 200);
    }

    // Every concurrent fetch landed in the counter exactly once
    let (status, _, body) = get(addr, "/");
    assert_eq!(status, 200);
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains(&format!("a.pdf</a> ({} requests)", CLIENTS)));

    shutdown.shutdown();
    server.join().unwrap();
}

#[test]
fn test_shutdown_drains_and_returns() {
    let root = fixture_root();
    let (addr, shutdown, server) = start_server(root.path(), Duration::from_secs(1), 1000);

    let (status, _, _) = get(addr, "/a.pdf");
    assert_eq!(status, 200);

    shutdown.shutdown();
    server.join().unwrap();

    // The listener is gone after shutdown
    assert!(TcpStream::connect(addr).is_err());
}
