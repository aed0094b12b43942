// rest/mod.rs — Public REST API server.
//
// Axum HTTP server translating requests to Task Store calls. No business
// logic beyond parameter marshalling and status mapping.
//
// Endpoints:
//   GET    /                 task listing
//   POST   /add              create task (caller-supplied id)
//   PUT    /update/{id}      overwrite task
//   DELETE /delete/{id}      remove task
//   POST   /agent/chat       conversational facade (always 200)
//   GET    /health           liveness probe

pub mod routes;

use anyhow::Result;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: AppContext) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/add", post(routes::tasks::add_task))
        .route("/update/{id}", put(routes::tasks::update_task))
        .route("/delete/{id}", delete(routes::tasks::delete_task))
        .route("/agent/chat", post(routes::chat::chat))
        .route("/health", get(routes::health::health))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
