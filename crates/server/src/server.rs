use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{categories, expenses, statistics};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Routes of the expense API.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/category",
            get(categories::list_parents).post(categories::create_root),
        )
        .route("/category/{id}", axum::routing::delete(categories::delete))
        .route(
            "/category-child/{id}",
            get(categories::list_children).post(categories::create_child),
        )
        .route("/free-category", get(categories::free_roots))
        .route("/free-category-child/{id}", get(categories::free_children))
        .route("/expense", post(expenses::create))
        .route(
            "/expense/{id}",
            get(expenses::get)
                .patch(expenses::update)
                .delete(expenses::delete),
        )
        .route("/expense-certain", get(expenses::query))
        .route("/expense-bar-data", get(statistics::bar_data))
        .with_state(state)
}

pub async fn run(engine: Engine, bind: &str, port: u16) {
    let listener = match tokio::net::TcpListener::bind((bind, port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {bind}:{port}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
