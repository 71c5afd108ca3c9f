use crate::acceptor::ConnectionAcceptor;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::RequestHandler;
use log::{info, warn};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// The accept loop and its shutdown switch.
///
/// Every accepted connection gets its own thread running the shared
/// `RequestHandler`. The spawn is unbounded by design, mirroring the
/// source behavior; this is a known scaling limit, not a goal.
pub struct Server {
    acceptor: ConnectionAcceptor,
    handler: Arc<RequestHandler>,
    shutdown: Arc<AtomicBool>,
}

/// Cloneable handle that stops a running server.
///
/// Setting the flag alone would leave the loop parked in `accept`, so the
/// handle also opens one throwaway connection to wake it.
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting and drain in-flight connections
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _ = TcpStream::connect(self.addr);
    }
}

impl Server {
    /// Bind the listener and build the shared handler
    pub fn new(config: &ServerConfig) -> ServerResult<Self> {
        config.validate()?;

        let acceptor = ConnectionAcceptor::bind(config.socket_address(), config.backlog_size)?;
        let handler = Arc::new(RequestHandler::new(config)?);

        Ok(Self {
            acceptor,
            handler,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get the local address the server is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.acceptor.local_addr()
    }

    /// Get a handle that can stop this server from another thread
    pub fn shutdown_handle(&self) -> io::Result<ShutdownHandle> {
        let mut addr = self.local_addr()?;
        // A listener on the wildcard address is reachable via loopback
        if addr.ip().is_unspecified() {
            let loopback: IpAddr = match addr {
                SocketAddr::V4(_) => Ipv4Addr::LOCALHOST.into(),
                SocketAddr::V6(_) => Ipv6Addr::LOCALHOST.into(),
            };
            addr.set_ip(loopback);
        }

        Ok(ShutdownHandle {
            flag: self.shutdown.clone(),
            addr,
        })
    }

    /// Accept connections until shut down, then drain in-flight handlers.
    ///
    /// Accept errors are logged and the loop keeps going; a single bad
    /// connection never stops the server. On shutdown the listener stops
    /// accepting and running handler threads are joined, not cancelled.
    pub fn run(&self) -> ServerResult<()> {
        info!(
            "serving on {} (rate limit and counters in memory only)",
            self.acceptor.address()
        );

        let mut workers: Vec<thread::JoinHandle<()>> = Vec::new();

        loop {
            match self.acceptor.accept() {
                Ok((stream, peer)) => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        // The wake-up connection from the shutdown handle
                        // lands here; it gets no response
                        drop(stream);
                        break;
                    }

                    log::debug!("accepted connection from {}", peer);
                    let handler = self.handler.clone();
                    workers.push(thread::spawn(move || handler.handle_connection(stream)));
                }
                Err(e) => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        break;
                    }
                    warn!("error accepting connection: {}", e);
                }
            }

            // Drop handles of finished connections so the list stays small
            workers.retain(|worker| !worker.is_finished());
        }

        info!("shutting down, draining {} in-flight connections", workers.len());
        for worker in workers {
            let _ = worker.join();
        }

        Ok(())
    }
}
