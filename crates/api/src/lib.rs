pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod pagination;
pub mod routes;
pub mod state;

pub use error::*;
pub use handlers::*;
pub use middleware::*;
pub use openapi::*;
pub use routes::*;
pub use state::*;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

fn mount_point(url: &str) -> String {
    format!("/{}", url.trim_matches('/'))
}

/// The full application: API routes, Swagger UI, static and media files.
pub fn build_app(state: AppState) -> Router {
    let storage = state.config.storage.clone();
    let body_size_limit = (state.config.server.max_request_body_size_mb * 1024 * 1024) as usize;

    Router::new()
        .merge(create_router())
        .merge(create_swagger_ui())
        .nest_service(
            &mount_point(&storage.static_url),
            ServeDir::new(&storage.static_root),
        )
        .nest_service(
            &mount_point(&storage.media_url),
            ServeDir::new(&storage.media_root),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::track_requests,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_size_limit)),
        )
        .with_state(state)
}

/// Serve until Ctrl-C or SIGTERM.
pub async fn start_server(
    bind: &str,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Airport API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Airport API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::mount_point;

    #[test]
    fn mount_points_drop_trailing_slash() {
        assert_eq!(mount_point("/static/"), "/static");
        assert_eq!(mount_point("media/"), "/media");
    }
}
