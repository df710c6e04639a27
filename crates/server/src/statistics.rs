//! Statistics API endpoints

use api_types::stats::{BarData, BarDataQuery};
use axum::{
    Json,
    extract::{Query, State},
};
use engine::{SpendingChart, SpendingChartInput, SpendingChartQuery};

use crate::{ServerError, server::ServerState};

/// Spending per subcategory of `categoryId`, or per root when it is absent.
pub async fn bar_data(
    State(state): State<ServerState>,
    Query(params): Query<BarDataQuery>,
) -> Result<Json<BarData>, ServerError> {
    let query = SpendingChartQuery::try_from(SpendingChartInput {
        date_from: params.date_from,
        date_to: params.date_to,
        category_id: params.category_id,
    })?;

    let chart = state
        .engine
        .spending_chart(query.category_id, query.start, query.finish)
        .await?;

    let data = match chart {
        SpendingChart::Breakdown(breakdown) => BarData {
            no_subcategory: Some(breakdown.no_subcategory.to_f64()),
            totals: breakdown
                .subcategories
                .into_iter()
                .map(|(name, total)| (name, total.to_f64()))
                .collect(),
        },
        SpendingChart::Parents(totals) => BarData {
            no_subcategory: None,
            totals: totals
                .into_iter()
                .map(|(name, total)| (name, total.to_f64()))
                .collect(),
        },
    };
    Ok(Json(data))
}
