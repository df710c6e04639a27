use std::collections::HashSet;

use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    Category, CategoryTree, EngineError, ResultEngine, categories, expenses,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Root categories, ordered by name.
    pub async fn parent_categories(&self) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let models = categories::Entity::find()
                .filter(categories::Column::ParentId.is_null())
                .order_by_asc(categories::Column::Name)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Category::from).collect())
        })
    }

    pub async fn category(&self, id: i32) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| require_category(&db_tx, id).await)
    }

    /// Snapshot of the whole category forest.
    pub async fn category_tree(&self) -> ResultEngine<CategoryTree> {
        with_tx!(self, |db_tx| load_tree(&db_tx).await)
    }

    /// Creates a category, optionally attached to `parent_id`.
    ///
    /// Names are globally unique. The parent must exist and must be a root.
    pub async fn create_category(
        &self,
        name: &str,
        parent_id: Option<i32>,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            ensure_name_free(&db_tx, &name, None).await?;

            let mut category = Category::new(0, name);
            if let Some(parent_id) = parent_id {
                let parent = require_category(&db_tx, parent_id).await?;
                category.set_parent(Some(&parent))?;
            }

            let active = categories::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(category.name.clone()),
                parent_id: ActiveValue::Set(category.parent_id()),
            };
            let model = active.insert(&db_tx).await?;
            tracing::info!(id = model.id, parent_id = ?model.parent_id, "category created");
            Ok(Category::from(model))
        })
    }

    pub async fn rename_category(&self, id: i32, name: &str) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            let mut category = require_category(&db_tx, id).await?;
            ensure_name_free(&db_tx, &name, Some(id)).await?;

            category.name = name;
            categories::ActiveModel::from(&category)
                .update(&db_tx)
                .await?;
            tracing::info!(id, "category renamed");
            Ok(category)
        })
    }

    /// Attaches an existing category to a root.
    ///
    /// The assignment is one-time. A category that already owns children
    /// cannot become a child either, since that would create a third level.
    pub async fn set_category_parent(
        &self,
        id: i32,
        parent_id: Option<i32>,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let mut category = require_category(&db_tx, id).await?;
            let parent = match parent_id {
                Some(parent_id) => Some(require_category(&db_tx, parent_id).await?),
                None => None,
            };
            category.set_parent(parent.as_ref())?;

            if load_tree(&db_tx).await?.has_children(id) {
                return Err(EngineError::InvalidHierarchy(format!(
                    "category '{}' has subcategories and cannot get a parent",
                    category.name
                )));
            }

            categories::ActiveModel::from(&category)
                .update(&db_tx)
                .await?;
            tracing::info!(id, parent_id = ?category.parent_id(), "category parent assigned");
            Ok(category)
        })
    }

    /// Deletes a category. Deleting a root deletes its children first.
    ///
    /// Fails with [`EngineError::CategoryInUse`] if any affected category is
    /// still referenced by an expense; nothing is deleted in that case.
    pub async fn delete_category(&self, id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let category = require_category(&db_tx, id).await?;
            let children: Vec<i32> = if category.is_root() {
                find_children(&db_tx, id)
                    .await?
                    .into_iter()
                    .map(|c| c.id)
                    .collect()
            } else {
                Vec::new()
            };

            let mut affected = children.clone();
            affected.push(id);
            let in_use = expenses::Entity::find()
                .filter(expenses::Column::CategoryId.is_in(affected))
                .count(&db_tx)
                .await?;
            if in_use > 0 {
                return Err(EngineError::CategoryInUse(format!(
                    "'{}' is referenced by {in_use} expense(s)",
                    category.name
                )));
            }

            delete_categories(&db_tx, &children).await?;
            categories::Entity::delete_by_id(id).exec(&db_tx).await?;
            tracing::info!(id, children = children.len(), "category deleted");
            Ok(())
        })
    }

    /// Children of `parent_id`, ordered by name.
    pub async fn child_categories(&self, parent_id: i32) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            require_category(&db_tx, parent_id).await?;
            let models = categories::Entity::find()
                .filter(categories::Column::ParentId.eq(parent_id))
                .order_by_asc(categories::Column::Name)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Category::from).collect())
        })
    }

    /// Roots such that no category in their subtree has an expense.
    pub async fn categories_without_expense(&self) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let tree = load_tree(&db_tx).await?;
            let with_expense = categories_with_expense(&db_tx).await?;
            Ok(tree
                .roots_without_expense(&with_expense)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    /// Children of `parent_id` that have no expense of their own.
    ///
    /// An unknown parent has no children, so the result is empty.
    pub async fn child_categories_without_expense(
        &self,
        parent_id: i32,
    ) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let tree = load_tree(&db_tx).await?;
            let with_expense = categories_with_expense(&db_tx).await?;
            Ok(tree
                .children_without_expense(parent_id, &with_expense)
                .into_iter()
                .cloned()
                .collect())
        })
    }
}

pub(super) async fn require_category(
    db_tx: &DatabaseTransaction,
    id: i32,
) -> ResultEngine<Category> {
    categories::Entity::find_by_id(id)
        .one(db_tx)
        .await?
        .map(Category::from)
        .ok_or_else(|| EngineError::KeyNotFound(format!("category {id}")))
}

pub(super) async fn load_tree(db_tx: &DatabaseTransaction) -> ResultEngine<CategoryTree> {
    let models = categories::Entity::find().all(db_tx).await?;
    Ok(CategoryTree::new(models.into_iter().map(Category::from)))
}

async fn find_children(
    db_tx: &DatabaseTransaction,
    parent_id: i32,
) -> ResultEngine<Vec<categories::Model>> {
    Ok(categories::Entity::find()
        .filter(categories::Column::ParentId.eq(parent_id))
        .all(db_tx)
        .await?)
}

async fn delete_categories(db_tx: &DatabaseTransaction, ids: &[i32]) -> ResultEngine<()> {
    if ids.is_empty() {
        return Ok(());
    }
    categories::Entity::delete_many()
        .filter(categories::Column::Id.is_in(ids.iter().copied()))
        .exec(db_tx)
        .await?;
    Ok(())
}

async fn ensure_name_free(
    db_tx: &DatabaseTransaction,
    name: &str,
    exclude: Option<i32>,
) -> ResultEngine<()> {
    let mut query = categories::Entity::find().filter(categories::Column::Name.eq(name));
    if let Some(id) = exclude {
        query = query.filter(categories::Column::Id.ne(id));
    }
    if query.one(db_tx).await?.is_some() {
        return Err(EngineError::ExistingKey(name.to_string()));
    }
    Ok(())
}

/// Ids of the categories referenced by at least one expense.
async fn categories_with_expense(db_tx: &DatabaseTransaction) -> ResultEngine<HashSet<i32>> {
    let ids: Vec<i32> = expenses::Entity::find()
        .select_only()
        .column(expenses::Column::CategoryId)
        .distinct()
        .into_tuple()
        .all(db_tx)
        .await?;
    Ok(ids.into_iter().collect())
}
