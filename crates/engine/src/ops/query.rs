//! Expense query planner.
//!
//! Every optional filter that is present is folded into a single `AND`
//! condition; the date range is always part of it.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
    sea_query::{Expr, LikeExpr, Order},
};

use crate::{
    CategoryTree, EngineError, Expense, MoneyCents, ResultEngine, expenses,
    util::{escape_like, normalize_note, parse_category_id, parse_date},
};

use super::{Engine, categories::load_tree, with_tx};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExpenseSortField {
    #[default]
    Id,
    LocalDate,
    Count,
    UnitPrice,
    TotalPrice,
    Note,
    Category,
}

impl ExpenseSortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::LocalDate => "localDate",
            Self::Count => "count",
            Self::UnitPrice => "unitPrice",
            Self::TotalPrice => "totalPrice",
            Self::Note => "note",
            Self::Category => "category",
        }
    }

    fn column(self) -> expenses::Column {
        match self {
            Self::Id => expenses::Column::Id,
            Self::LocalDate => expenses::Column::LocalDate,
            Self::Count => expenses::Column::Count,
            Self::UnitPrice => expenses::Column::UnitPriceMinor,
            Self::TotalPrice => expenses::Column::TotalPriceMinor,
            Self::Note => expenses::Column::Note,
            Self::Category => expenses::Column::CategoryId,
        }
    }
}

impl TryFrom<&str> for ExpenseSortField {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "id" => Ok(Self::Id),
            "localDate" | "local_date" | "date" => Ok(Self::LocalDate),
            "count" => Ok(Self::Count),
            "unitPrice" | "unit_price" => Ok(Self::UnitPrice),
            "totalPrice" | "total_price" => Ok(Self::TotalPrice),
            "note" => Ok(Self::Note),
            "category" | "categoryId" | "category_id" => Ok(Self::Category),
            other => Err(EngineError::InvalidSort(format!(
                "unknown sort field: {other}"
            ))),
        }
    }
}

/// Sort specification. Rows with equal keys keep ascending id order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpenseSort {
    pub field: ExpenseSortField,
    pub direction: SortDirection,
}

impl ExpenseSort {
    pub fn asc(field: ExpenseSortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: ExpenseSortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

impl FromStr for ExpenseSort {
    type Err = EngineError;

    /// Parses `<field>` or `<field>,<asc|desc>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let field = parts
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| EngineError::InvalidSort("sort field is required".to_string()))?;
        let field = ExpenseSortField::try_from(field)?;

        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(EngineError::InvalidSort(format!(
                    "unknown sort direction: {other}"
                )));
            }
        };
        if parts.next().is_some() {
            return Err(EngineError::InvalidSort(format!("invalid sort: {s}")));
        }

        Ok(Self { field, direction })
    }
}

impl fmt::Display for ExpenseSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{},{direction}", self.field.as_str())
    }
}

/// Inclusive bounds on an expense total. A missing bound is open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub from: Option<MoneyCents>,
    pub to: Option<MoneyCents>,
}

/// Typed expense query.
///
/// `start_date` and `finish_date` are both inclusive. Inverted ranges are
/// accepted and simply match nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub category_id: Option<i32>,
    pub price: Option<PriceRange>,
    pub note_contains: Option<String>,
    pub sort: ExpenseSort,
}

impl ExpenseFilter {
    /// Date range only, sorted by id.
    pub fn between(start_date: NaiveDate, finish_date: NaiveDate) -> Self {
        Self {
            start_date,
            finish_date,
            category_id: None,
            price: None,
            note_contains: None,
            sort: ExpenseSort::default(),
        }
    }

    pub fn category(mut self, category_id: i32) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn price(mut self, from: Option<MoneyCents>, to: Option<MoneyCents>) -> Self {
        self.price = Some(PriceRange { from, to });
        self
    }

    pub fn note(mut self, needle: &str) -> Self {
        self.note_contains = Some(needle.to_string());
        self
    }

    pub fn sorted_by(mut self, sort: ExpenseSort) -> Self {
        self.sort = sort;
        self
    }

    /// Non-empty folded note needle, if any.
    fn note_needle(&self) -> Option<String> {
        self.note_contains
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(normalize_note)
    }

    /// Folds the present filters into one condition.
    ///
    /// `category_ids` is the already expanded category set, if the filter
    /// has a category.
    fn condition(&self, category_ids: Option<&[i32]>) -> Condition {
        let mut condition = Condition::all().add(
            expenses::Column::LocalDate.between(self.start_date, self.finish_date),
        );
        if let Some(ids) = category_ids {
            condition = condition.add(expenses::Column::CategoryId.is_in(ids.iter().copied()));
        }
        if let Some(price) = self.price {
            if let Some(from) = price.from {
                condition = condition.add(expenses::Column::TotalPriceMinor.gte(from.cents()));
            }
            if let Some(to) = price.to {
                condition = condition.add(expenses::Column::TotalPriceMinor.lte(to.cents()));
            }
        }
        if let Some(needle) = self.note_needle() {
            let pattern = format!("%{}%", escape_like(&needle));
            condition = condition.add(
                Expr::col(expenses::Column::NoteNorm).like(LikeExpr::new(pattern).escape('\\')),
            );
        }
        condition
    }
}

/// Raw query parameters as received by a transport layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseFilterInput {
    pub start_date: String,
    pub finish_date: String,
    pub category_id: Option<String>,
    pub price_from: Option<String>,
    pub price_to: Option<String>,
    pub note: Option<String>,
    pub sort_by: String,
}

impl TryFrom<ExpenseFilterInput> for ExpenseFilter {
    type Error = EngineError;

    fn try_from(input: ExpenseFilterInput) -> Result<Self, Self::Error> {
        let start_date = parse_date(&input.start_date, "start date")?;
        let finish_date = parse_date(&input.finish_date, "finish date")?;
        let category_id = input
            .category_id
            .as_deref()
            .map(parse_category_id)
            .transpose()?;

        let from = input
            .price_from
            .as_deref()
            .map(MoneyCents::from_str)
            .transpose()?;
        let to = input
            .price_to
            .as_deref()
            .map(MoneyCents::from_str)
            .transpose()?;
        let price = (from.is_some() || to.is_some()).then_some(PriceRange { from, to });

        let note_contains = input
            .note
            .filter(|note| !note.trim().is_empty());

        Ok(Self {
            start_date,
            finish_date,
            category_id,
            price,
            note_contains,
            sort: input.sort_by.parse()?,
        })
    }
}

trait ApplyExpenseSort: QueryOrder + Sized {
    fn apply_expense_sort(self, sort: ExpenseSort) -> Self;
}

impl<T> ApplyExpenseSort for T
where
    T: QueryOrder + Sized,
{
    fn apply_expense_sort(self, sort: ExpenseSort) -> Self {
        let query = self.order_by(sort.field.column(), sort.direction.order());
        if sort.field == ExpenseSortField::Id {
            query
        } else {
            query.order_by_asc(expenses::Column::Id)
        }
    }
}

/// Expenses matching `filter`, given an already expanded category set.
pub(super) async fn find_expenses(
    db_tx: &DatabaseTransaction,
    filter: &ExpenseFilter,
    category_ids: Option<&[i32]>,
) -> ResultEngine<Vec<Expense>> {
    let models = expenses::Entity::find()
        .filter(filter.condition(category_ids))
        .apply_expense_sort(filter.sort)
        .all(db_tx)
        .await?;
    Ok(models.into_iter().map(Expense::from).collect())
}

/// Expands the filter's category, if any, into the ids it matches.
fn category_members(
    tree: &CategoryTree,
    filter: &ExpenseFilter,
) -> ResultEngine<Option<Vec<i32>>> {
    filter
        .category_id
        .map(|id| {
            tree.expand_for_filtering(id)
                .map(|members| members.iter().map(|c| c.id).collect())
        })
        .transpose()
}

async fn run_query(
    db_tx: &DatabaseTransaction,
    filter: &ExpenseFilter,
    category_ids: Option<Vec<i32>>,
) -> ResultEngine<Vec<Expense>> {
    tracing::debug!(
        start = %filter.start_date,
        finish = %filter.finish_date,
        categories = ?category_ids,
        price = ?filter.price,
        note = ?filter.note_contains,
        sort = %filter.sort,
        "querying expenses"
    );
    find_expenses(db_tx, filter, category_ids.as_deref()).await
}

impl Engine {
    /// Expenses matching every filter present in `filter`.
    ///
    /// A root category matches itself and its subcategories; a subcategory
    /// only matches itself.
    pub async fn query_expenses(&self, filter: &ExpenseFilter) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            let category_ids = match filter.category_id {
                Some(_) => category_members(&load_tree(&db_tx).await?, filter)?,
                None => None,
            };
            run_query(&db_tx, filter, category_ids).await
        })
    }

    /// Same as [`Engine::query_expenses`], together with the category tree
    /// read in the same transaction, so names resolve against the rows
    /// returned.
    pub async fn query_expenses_with_categories(
        &self,
        filter: &ExpenseFilter,
    ) -> ResultEngine<(Vec<Expense>, CategoryTree)> {
        with_tx!(self, |db_tx| {
            let tree = load_tree(&db_tx).await?;
            let category_ids = category_members(&tree, filter)?;
            let expenses = run_query(&db_tx, filter, category_ids).await?;
            Ok((expenses, tree))
        })
    }
}
