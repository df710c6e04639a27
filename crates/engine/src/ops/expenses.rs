use sea_orm::{DatabaseTransaction, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, Expense, ExpensePatch, NewExpense, ResultEngine, expenses,
    util::normalize_optional_text,
};

use super::{Engine, categories::require_category, with_tx};

impl Engine {
    pub async fn expense(&self, id: i64) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let model = require_expense(&db_tx, id).await?;
            Ok(Expense::from(model))
        })
    }

    /// Every expense, in insertion order.
    pub async fn expenses(&self) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            let models = expenses::Entity::find()
                .order_by_asc(expenses::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Expense::from).collect())
        })
    }

    /// Records a new expense; the total price is computed here.
    pub async fn add_expense(&self, input: NewExpense) -> ResultEngine<Expense> {
        let input = NewExpense {
            note: normalize_optional_text(input.note.as_deref()),
            ..input
        };
        let expense = Expense::new(0, input)?;
        with_tx!(self, |db_tx| {
            require_category(&db_tx, expense.category_id).await?;
            let model = expenses::ActiveModel::from(&expense)
                .insert(&db_tx)
                .await?;
            tracing::info!(
                id = model.id,
                category_id = model.category_id,
                total_price_minor = model.total_price_minor,
                "expense added"
            );
            Ok(Expense::from(model))
        })
    }

    /// Applies a partial update. Fields missing from `patch` are kept.
    ///
    /// The total is recomputed only when `count` and `unit_price` are both
    /// supplied and valid; an incomplete or invalid pair leaves the pricing
    /// untouched while the other fields still apply.
    pub async fn update_expense(&self, id: i64, patch: ExpensePatch) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let mut expense = Expense::from(require_expense(&db_tx, id).await?);
            if let Some(category_id) = patch.category_id {
                require_category(&db_tx, category_id).await?;
            }
            let pricing_requested = patch.count.is_some() || patch.unit_price.is_some();
            let repriced = expense.apply_patch(patch);
            if pricing_requested && !repriced {
                tracing::debug!(id, "pricing left unchanged by partial update");
            }

            let model = expenses::ActiveModel::from(&expense)
                .update(&db_tx)
                .await?;
            tracing::info!(id, repriced, "expense updated");
            Ok(Expense::from(model))
        })
    }

    pub async fn delete_expense(&self, id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = expenses::Entity::delete_by_id(id).exec(&db_tx).await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(format!("expense {id}")));
            }
            tracing::info!(id, "expense deleted");
            Ok(())
        })
    }
}

async fn require_expense(db_tx: &DatabaseTransaction, id: i64) -> ResultEngine<expenses::Model> {
    expenses::Entity::find_by_id(id)
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("expense {id}")))
}
