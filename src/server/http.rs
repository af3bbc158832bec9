//! HTTP listener for the notification dispatcher.
//!
//! hyper http1 with TokioIo, one task per connection. Requests share no
//! mutable state: each notification is handled independently, and a failed
//! request never stops the accept loop.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::routes;
use crate::services::HandlerConfig;

/// Settings for the webhook listener.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Ordered container-name prefixes to strip during normalization.
    pub prefixes: Vec<String>,
}

/// Shared application state.
pub struct AppState {
    pub config: ServerConfig,
    pub handler: HandlerConfig,
}

/// Run the accept loop. Never returns under normal operation.
pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(state.config.listen).await?;

    info!("Webhook listener on {}", state.config.listen);
    info!("Update handler: {}", state.handler.script.display());

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests.
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(),

        // Build info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // Anything else GET gets the usage hint
        (Method::GET, _) => routes::usage_hint(),

        // Notifications are accepted on any path
        (Method::POST, _) => routes::handle_notification(req, state).await,

        _ => method_not_allowed(),
    };

    Ok(response)
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "method_not_allowed",
        "message": "use POST to deliver a notification or GET /health",
    });

    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
