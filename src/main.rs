use log::{error, info};
use servedir::{Server, ServerConfig, ServerResult};
use std::env;
use std::path::Path;
use std::process;

// Usage: servedir <directory> [port]

fn main() -> ServerResult<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = match parse_args(&args) {
        Some(config) => config,
        None => {
            eprintln!("Usage: {} <directory> [port]", args.first().map(String::as_str).unwrap_or("servedir"));
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let server = Server::new(&config)?;
    info!(
        "serving {} on port {}",
        config.root_dir.display(),
        server.local_addr()?.port()
    );

    let shutdown = server.shutdown_handle()?;
    ctrlc::set_handler(move || {
        info!("received shutdown signal, stopping server");
        shutdown.shutdown();
    })
    .unwrap_or_else(|e| {
        error!("could not install signal handler: {}", e);
    });

    server.run()
}

fn parse_args(args: &[String]) -> Option<ServerConfig> {
    let root = args.get(1)?;
    if !Path::new(root).is_dir() {
        return None;
    }

    let mut config = ServerConfig::new().with_root_dir(root);
    if let Some(port_arg) = args.get(2) {
        let port: u16 = port_arg.parse().ok()?;
        config = config.with_port(port);
    }

    Some(config)
}
