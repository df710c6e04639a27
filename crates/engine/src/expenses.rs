//! Expense primitives.
//!
//! An `Expense` records `count` units bought at `unit_price` on a calendar
//! day. `total_price` is derived and can only change through
//! [`Expense::reprice`].

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine, util::normalize_note};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub category_id: i32,
    count: i32,
    unit_price: MoneyCents,
    total_price: MoneyCents,
    pub local_date: NaiveDate,
    pub note: Option<String>,
}

/// Input for a new expense, before it gets an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewExpense {
    pub category_id: i32,
    pub count: i32,
    pub unit_price: MoneyCents,
    pub local_date: NaiveDate,
    pub note: Option<String>,
}

impl NewExpense {
    /// Expense of a single unit, the most common case.
    pub fn single(category_id: i32, unit_price: MoneyCents, local_date: NaiveDate) -> Self {
        Self {
            category_id,
            count: 1,
            unit_price,
            local_date,
            note: None,
        }
    }
}

/// Partial update: only fields set to `Some` are applied.
///
/// `count` and `unit_price` travel together, since the total is derived from
/// both; one without the other leaves the pricing as it is. `note: Some("")`
/// clears the note.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpensePatch {
    pub category_id: Option<i32>,
    pub count: Option<i32>,
    pub unit_price: Option<MoneyCents>,
    pub local_date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.count.is_none()
            && self.unit_price.is_none()
            && self.local_date.is_none()
            && self.note.is_none()
    }
}

fn total_price(count: i32, unit_price: MoneyCents) -> ResultEngine<MoneyCents> {
    if count <= 0 {
        return Err(EngineError::InvalidAmount("count must be > 0".to_string()));
    }
    if unit_price.is_negative() {
        return Err(EngineError::InvalidAmount(
            "unit_price must be >= 0".to_string(),
        ));
    }
    unit_price
        .checked_mul(i64::from(count))
        .ok_or_else(|| EngineError::InvalidAmount("total price too large".to_string()))
}

impl Expense {
    /// Validates `input` and computes its total price.
    ///
    /// `id` is the storage identity; pass `0` for an expense that has not
    /// been persisted yet.
    pub fn new(id: i64, input: NewExpense) -> ResultEngine<Self> {
        let total_price = total_price(input.count, input.unit_price)?;
        Ok(Self {
            id,
            category_id: input.category_id,
            count: input.count,
            unit_price: input.unit_price,
            total_price,
            local_date: input.local_date,
            note: input.note,
        })
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn unit_price(&self) -> MoneyCents {
        self.unit_price
    }

    pub fn total_price(&self) -> MoneyCents {
        self.total_price
    }

    /// Sets quantity and unit price, recomputing the total.
    ///
    /// On error the expense is left untouched.
    pub fn reprice(&mut self, count: i32, unit_price: MoneyCents) -> ResultEngine<()> {
        let total = total_price(count, unit_price)?;
        self.count = count;
        self.unit_price = unit_price;
        self.total_price = total;
        Ok(())
    }

    /// Applies a partial update. Category existence is checked by the caller.
    ///
    /// Pricing changes only when both `count` and `unit_price` are present
    /// and valid; otherwise the stored pricing is kept and the remaining
    /// fields still apply. Returns whether the expense was repriced.
    pub fn apply_patch(&mut self, patch: ExpensePatch) -> bool {
        let repriced = match (patch.count, patch.unit_price) {
            (Some(count), Some(unit_price)) => self.reprice(count, unit_price).is_ok(),
            _ => false,
        };
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(local_date) = patch.local_date {
            self.local_date = local_date;
        }
        if let Some(note) = patch.note {
            let trimmed = note.trim();
            self.note = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        repriced
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub category_id: i32,
    pub count: i32,
    pub unit_price_minor: i64,
    pub total_price_minor: i64,
    pub local_date: Date,
    pub note: Option<String>,
    pub note_norm: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    /// Builds a full active model. A zero id is left unset so the database
    /// assigns one on insert.
    fn from(expense: &Expense) -> Self {
        let id = if expense.id == 0 {
            ActiveValue::NotSet
        } else {
            ActiveValue::Set(expense.id)
        };
        Self {
            id,
            category_id: ActiveValue::Set(expense.category_id),
            count: ActiveValue::Set(expense.count),
            unit_price_minor: ActiveValue::Set(expense.unit_price.cents()),
            total_price_minor: ActiveValue::Set(expense.total_price.cents()),
            local_date: ActiveValue::Set(expense.local_date),
            note: ActiveValue::Set(expense.note.clone()),
            note_norm: ActiveValue::Set(expense.note.as_deref().map(normalize_note)),
        }
    }
}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            count: model.count,
            unit_price: MoneyCents::new(model.unit_price_minor),
            total_price: MoneyCents::new(model.total_price_minor),
            local_date: model.local_date,
            note: model.note,
        }
    }
}
