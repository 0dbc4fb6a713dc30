/// HTTP server setup and routing
use crate::{
    api::middleware::{enforce_access_gate, load_session},
    context::AppContext,
    error::{LuneError, LuneResult},
    rate_limit::login_rate_limit,
};
use axum::{
    http::{header, Method, StatusCode},
    middleware,
    response::Json,
    Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let static_files = ServeDir::new(&ctx.config.storage.static_directory);

    // Layers run outermost-last: rate limit, then session, then the gate.
    // The fallback is set first so the layers wrap it too.
    Router::new()
        .merge(crate::api::routes(ctx.config.service.upload_limit))
        .nest_service("/static", static_files)
        .fallback(not_found)
        .with_state(ctx.clone())
        .layer(middleware::from_fn_with_state(ctx.clone(), enforce_access_gate))
        .layer(middleware::from_fn_with_state(ctx.clone(), load_session))
        .layer(middleware::from_fn_with_state(ctx, login_rate_limit))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> LuneResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Lune listening on {}", addr);
    info!("   Service URL: {}", ctx.service_url());
    match ctx.config.access.unlock_at {
        Some(at) if ctx.gate.is_locked() => info!("   Locked until {}", at),
        _ => info!("   Unlocked"),
    }

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LuneError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LuneError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
