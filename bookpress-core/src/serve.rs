//! Local static preview server over the output directory.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Serve `root` on localhost at `port` until the task is dropped. Intended to
/// be spawned next to the watch loop by the serve command.
pub async fn serve(root: PathBuf, port: u16) -> Result<(), std::io::Error> {
    let app = Router::new()
        .fallback_service(ServeDir::new(&root))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, root = %root.display(), "[SERVE] Preview server listening");

    axum::serve(listener, app).await
}
