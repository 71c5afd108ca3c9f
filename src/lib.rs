pub mod acceptor;
pub mod config;
pub mod counter;
pub mod error;
pub mod handler;
pub mod http;
pub mod listing;
pub mod rate_limit;
pub mod resolver;
pub mod server;

/// Re-exports of common components for easier access
pub use acceptor::ConnectionAcceptor;
pub use config::ServerConfig;
pub use counter::AccessCounter;
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use http::{Method, Request, Response, Status};
pub use rate_limit::RateLimiter;
pub use resolver::PathResolver;
pub use server::{Server, ShutdownHandle};
