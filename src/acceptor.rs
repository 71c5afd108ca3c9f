use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

/// Owns the listening socket and hands out accepted connections.
///
/// The listener stays in blocking mode: the scheduling model is one thread
/// per connection, so the accept loop is the only caller and simply blocks
/// until the next client arrives.
pub struct ConnectionAcceptor {
    listener: TcpListener,
    address: String,
}

impl ConnectionAcceptor {
    /// Create a new connection acceptor bound to the specified address
    pub fn bind<A: ToSocketAddrs>(addr: A, backlog: u32) -> io::Result<Self> {
        let socket_addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "No socket addresses found")
        })?;
        let addr_str = socket_addr.to_string();

        let socket = Self::create_socket(&socket_addr, backlog)?;
        let listener = socket.into();

        Ok(Self {
            listener,
            address: addr_str,
        })
    }

    /// Block until the next connection arrives
    pub fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept()?;
        // Responses are small and written once, so send them immediately
        stream.set_nodelay(true)?;
        Ok((stream, peer))
    }

    /// The address this acceptor was asked to bind
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the local address this acceptor is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Create a properly configured listening socket
    fn create_socket(addr: &SocketAddr, backlog: u32) -> io::Result<Socket> {
        let domain = if addr.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;

        let sock_addr = socket2::SockAddr::from(*addr);
        socket.bind(&sock_addr)?;
        socket.listen(backlog as i32)?;

        Ok(socket)
    }
}
