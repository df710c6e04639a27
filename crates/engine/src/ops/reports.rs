use std::collections::BTreeMap;

use chrono::NaiveDate;
use sea_orm::TransactionTrait;

use crate::{
    CategoryBreakdown, EngineError, MoneyCents, ResultEngine, SpendingChart,
    aggregation::{breakdown, parent_totals},
    util::{parse_category_id, parse_date},
};

use super::{
    Engine, ExpenseFilter,
    categories::load_tree,
    query::find_expenses,
    with_tx,
};

/// Raw chart parameters as received by a transport layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpendingChartInput {
    pub date_from: String,
    pub date_to: String,
    pub category_id: Option<String>,
}

/// Typed chart request. Without a category the chart sums every root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpendingChartQuery {
    pub category_id: Option<i32>,
    pub start: NaiveDate,
    pub finish: NaiveDate,
}

impl TryFrom<SpendingChartInput> for SpendingChartQuery {
    type Error = EngineError;

    /// Dates and ids are parsed exactly like [`crate::ExpenseFilterInput`];
    /// a blank category id counts as absent.
    fn try_from(input: SpendingChartInput) -> Result<Self, Self::Error> {
        let start = parse_date(&input.date_from, "start date")?;
        let finish = parse_date(&input.date_to, "finish date")?;
        let category_id = input
            .category_id
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_category_id)
            .transpose()?;

        Ok(Self {
            category_id,
            start,
            finish,
        })
    }
}

impl Engine {
    /// Spending of `category_id` between `start` and `finish`, split by
    /// subcategory.
    pub async fn category_breakdown(
        &self,
        category_id: i32,
        start: NaiveDate,
        finish: NaiveDate,
    ) -> ResultEngine<CategoryBreakdown> {
        with_tx!(self, |db_tx| {
            let tree = load_tree(&db_tx).await?;
            let members: Vec<i32> = tree
                .expand_for_filtering(category_id)?
                .iter()
                .map(|c| c.id)
                .collect();
            tracing::debug!(category_id, %start, %finish, ?members, "category breakdown");

            let filter = ExpenseFilter::between(start, finish);
            let expenses = find_expenses(&db_tx, &filter, Some(&members)).await?;
            breakdown(&tree, category_id, &expenses)
        })
    }

    /// Spending of every root between `start` and `finish`, children included.
    pub async fn parent_category_totals(
        &self,
        start: NaiveDate,
        finish: NaiveDate,
    ) -> ResultEngine<BTreeMap<String, MoneyCents>> {
        with_tx!(self, |db_tx| {
            let tree = load_tree(&db_tx).await?;
            tracing::debug!(%start, %finish, "parent category totals");

            let filter = ExpenseFilter::between(start, finish);
            let expenses = find_expenses(&db_tx, &filter, None).await?;
            parent_totals(&tree, &expenses)
        })
    }

    /// Breakdown of one category when given, otherwise the per-root summary.
    pub async fn spending_chart(
        &self,
        category_id: Option<i32>,
        start: NaiveDate,
        finish: NaiveDate,
    ) -> ResultEngine<SpendingChart> {
        match category_id {
            Some(id) => Ok(SpendingChart::Breakdown(
                self.category_breakdown(id, start, finish).await?,
            )),
            None => Ok(SpendingChart::Parents(
                self.parent_category_totals(start, finish).await?,
            )),
        }
    }
}
