//! Categories API endpoints.

use api_types::category::{CategoryNew, CategoryView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        parent_id: category.parent_id(),
        name: category.name,
    }
}

fn map_all(categories: Vec<engine::Category>) -> Json<Vec<CategoryView>> {
    Json(categories.into_iter().map(map_category).collect())
}

pub async fn list_parents(
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    Ok(map_all(state.engine.parent_categories().await?))
}

pub async fn create_root(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state.engine.create_category(&payload.name, None).await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

/// Deletes a category, and its children when it is a root.
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_child(
    State(state): State<ServerState>,
    Path(parent_id): Path<i32>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(&payload.name, Some(parent_id))
        .await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn list_children(
    State(state): State<ServerState>,
    Path(parent_id): Path<i32>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    Ok(map_all(state.engine.child_categories(parent_id).await?))
}

pub async fn free_roots(
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    Ok(map_all(state.engine.categories_without_expense().await?))
}

pub async fn free_children(
    State(state): State<ServerState>,
    Path(parent_id): Path<i32>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    Ok(map_all(
        state
            .engine
            .child_categories_without_expense(parent_id)
            .await?,
    ))
}
