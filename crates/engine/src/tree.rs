//! In-memory adjacency index over the category forest.
//!
//! The index is built from a snapshot of all category rows inside the
//! caller's transaction and dropped at the end of the call.

use std::collections::{BTreeMap, HashSet};

use crate::{Category, EngineError, ResultEngine};

#[derive(Debug, Default)]
pub struct CategoryTree {
    categories: BTreeMap<i32, Category>,
    children: BTreeMap<i32, Vec<i32>>,
}

impl CategoryTree {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        let categories: BTreeMap<i32, Category> =
            categories.into_iter().map(|c| (c.id, c)).collect();
        let mut children: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
        for category in categories.values() {
            if let Some(parent_id) = category.parent_id() {
                children.entry(parent_id).or_default().push(category.id);
            }
        }
        Self {
            categories,
            children,
        }
    }

    pub fn get(&self, id: i32) -> ResultEngine<&Category> {
        self.categories
            .get(&id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("category {id}")))
    }

    /// Roots ordered by name.
    pub fn roots(&self) -> Vec<&Category> {
        let mut roots: Vec<&Category> = self.categories.values().filter(|c| c.is_root()).collect();
        roots.sort_by(|a, b| a.name.cmp(&b.name));
        roots
    }

    /// Direct children of `id`, in id order.
    pub fn children(&self, id: i32) -> impl Iterator<Item = &Category> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child_id| self.categories.get(child_id))
    }

    pub fn has_children(&self, id: i32) -> bool {
        self.children.get(&id).is_some_and(|c| !c.is_empty())
    }

    /// The set of categories that "match `id`" for filtering.
    ///
    /// A root expands to itself plus its direct children; expenses recorded
    /// directly on the root are part of the set. A child only matches itself.
    /// The root comes first, children follow in id order.
    pub fn expand_for_filtering(&self, id: i32) -> ResultEngine<Vec<&Category>> {
        let category = self.get(id)?;
        let mut out = vec![category];
        if category.is_root() {
            out.extend(self.children(id));
        }
        Ok(out)
    }

    /// Every category in the subtree rooted at `id`, `id` included.
    fn subtree(&self, id: i32) -> Vec<i32> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(children) = self.children.get(&current) {
                stack.extend(children.iter().copied());
            }
        }
        out
    }

    /// Roots whose whole subtree has no expense, ordered by name.
    ///
    /// `with_expense` holds the ids of categories referenced by at least one
    /// expense. Each of them marks itself and its ancestors as occupied.
    pub fn roots_without_expense(&self, with_expense: &HashSet<i32>) -> Vec<&Category> {
        let mut occupied: HashSet<i32> = HashSet::with_capacity(with_expense.len() * 2);
        for &id in with_expense {
            let mut current = self.categories.get(&id);
            while let Some(category) = current {
                if !occupied.insert(category.id) {
                    break;
                }
                current = category
                    .parent_id()
                    .and_then(|parent_id| self.categories.get(&parent_id));
            }
        }

        self.roots()
            .into_iter()
            .filter(|root| {
                self.subtree(root.id)
                    .iter()
                    .all(|id| !occupied.contains(id))
            })
            .collect()
    }

    /// Children of `parent_id` with no expense of their own, ordered by name.
    pub fn children_without_expense(
        &self,
        parent_id: i32,
        with_expense: &HashSet<i32>,
    ) -> Vec<&Category> {
        let mut free: Vec<&Category> = self
            .children(parent_id)
            .filter(|child| !with_expense.contains(&child.id))
            .collect();
        free.sort_by(|a, b| a.name.cmp(&b.name));
        free
    }
}
