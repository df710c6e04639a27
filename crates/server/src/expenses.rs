//! Expenses API endpoints.

use api_types::expense::{ExpenseNew, ExpenseQuery, ExpenseUpdate, ExpenseView};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{ExpenseFilter, ExpenseFilterInput, ExpensePatch, MoneyCents, NewExpense};

use crate::{ServerError, server::ServerState};

fn map_expense(expense: engine::Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        category_id: expense.category_id,
        count: expense.count(),
        unit_price_minor: expense.unit_price().cents(),
        total_price_minor: expense.total_price().cents(),
        local_date: expense.local_date,
        note: expense.note,
    }
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(id).await?;
    Ok(Json(map_expense(expense)))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let expense = state
        .engine
        .add_expense(NewExpense {
            category_id: payload.category_id,
            count: payload.count.unwrap_or(1),
            unit_price: MoneyCents::new(payload.unit_price_minor),
            local_date: payload.local_date,
            note: payload.note,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_expense(expense))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let patch = ExpensePatch {
        category_id: payload.category_id,
        count: payload.count,
        unit_price: payload.unit_price_minor.map(MoneyCents::new),
        local_date: payload.local_date,
        note: payload.note,
    };
    if patch.is_empty() {
        return Err(ServerError::Generic(
            "provide at least one field to update".to_string(),
        ));
    }

    let expense = state.engine.update_expense(id, patch).await?;
    Ok(Json(map_expense(expense)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Filtered expense search. Malformed parameters yield 400.
pub async fn query(
    State(state): State<ServerState>,
    Query(params): Query<ExpenseQuery>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let filter = ExpenseFilter::try_from(ExpenseFilterInput {
        start_date: params.start_date,
        finish_date: params.finish_date,
        category_id: params.category_id,
        price_from: params.price_from,
        price_to: params.price_to,
        note: params.note,
        sort_by: params.sort_by,
    })?;

    let expenses = state.engine.query_expenses(&filter).await?;
    Ok(Json(expenses.into_iter().map(map_expense).collect()))
}
