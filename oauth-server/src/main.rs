use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use oauth_app::{LogFacade, Logger};
use oauth_server::config::ServerConfig;
use oauth_server::{create_service_router, ForwardToUpstream, MiddlewareOptions};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load configuration
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let log: Arc<dyn Logger> = Arc::new(LogFacade);
    let oauth_app = match config.app.build_app(log.clone()) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize OAuth app: {}", e);
            std::process::exit(1);
        }
    };

    let mut options = MiddlewareOptions::default()
        .with_path_prefix(&config.path_prefix)
        .with_logger(log);

    if let Some(upstream) = &config.unhandled_upstream {
        let timeout = Duration::from_secs(config.app.request_timeout);
        let forwarder = match ForwardToUpstream::new(upstream, timeout) {
            Ok(forwarder) => Arc::new(forwarder),
            Err(e) => {
                error!("Failed to initialize upstream client: {}", e);
                std::process::exit(1);
            }
        };
        info!("Forwarding unhandled requests to {}", upstream);
        options = options.on_unhandled_request(move |request| {
            let forwarder = forwarder.clone();
            async move { forwarder.forward(request).await }
        });
    }

    let app = create_service_router(Arc::new(oauth_app), options);

    // Build server address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!(
        "OAuth routes served under {} on {}, press Ctrl+C to stop",
        config.path_prefix, addr
    );
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = serve {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
