//! Category primitives.
//!
//! Categories form a forest of depth at most two: a root ("parent")
//! category may own children, a child never owns children.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
    parent_id: Option<i32>,
}

impl Category {
    /// Creates a root category.
    pub fn new(id: i32, name: String) -> Self {
        Self {
            id,
            name,
            parent_id: None,
        }
    }

    pub fn parent_id(&self) -> Option<i32> {
        self.parent_id
    }

    /// Returns `true` if the category has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Attaches `parent` to this category.
    ///
    /// The assignment is one-shot: it fails when `parent` is missing, when a
    /// parent is already set, or when `parent` is itself a child.
    pub fn set_parent(&mut self, parent: Option<&Category>) -> ResultEngine<()> {
        let parent = parent.ok_or_else(|| {
            EngineError::InvalidHierarchy("can't set a null parent category".to_string())
        })?;
        if self.parent_id.is_some() {
            return Err(EngineError::InvalidHierarchy(format!(
                "parent is already assigned to category '{}'",
                self.name
            )));
        }
        if parent.parent_id.is_some() {
            return Err(EngineError::InvalidHierarchy(format!(
                "category '{}' cannot have more than one ancestor",
                self.name
            )));
        }
        if parent.id == self.id {
            return Err(EngineError::InvalidHierarchy(format!(
                "category '{}' cannot be its own parent",
                self.name
            )));
        }
        self.parent_id = Some(parent.id);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub parent_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Parent,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            parent_id: model.parent_id,
        }
    }
}

impl From<&Category> for ActiveModel {
    fn from(category: &Category) -> Self {
        Self {
            id: ActiveValue::Set(category.id),
            name: ActiveValue::Set(category.name.clone()),
            parent_id: ActiveValue::Set(category.parent_id),
        }
    }
}
