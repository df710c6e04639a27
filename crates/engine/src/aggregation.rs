//! Spending aggregates for charts.
//!
//! All sums are accumulated in [`MoneyCents`]; narrowing to floating point is
//! left to the presentation layer.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::{CategoryTree, EngineError, Expense, MoneyCents, ResultEngine};

fn overflow() -> EngineError {
    EngineError::InvalidAmount("total overflow".to_string())
}

fn add_to(sum: &mut MoneyCents, amount: MoneyCents) -> ResultEngine<()> {
    *sum = sum.checked_add(amount).ok_or_else(overflow)?;
    Ok(())
}

/// Per-subcategory totals below one category.
///
/// Expenses recorded directly on the category itself, with no genuine
/// subcategory, land in `no_subcategory` and never under the category's own
/// name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub no_subcategory: MoneyCents,
    pub subcategories: BTreeMap<String, MoneyCents>,
}

impl CategoryBreakdown {
    /// Sum of every bucket. Fails with `InvalidAmount` when it does not fit.
    pub fn total(&self) -> ResultEngine<MoneyCents> {
        let buckets = std::iter::once(self.no_subcategory)
            .chain(self.subcategories.values().copied());
        MoneyCents::checked_sum(buckets).ok_or_else(overflow)
    }
}

/// Result of a chart request: a single-category breakdown or the summary
/// over every root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendingChart {
    Breakdown(CategoryBreakdown),
    Parents(BTreeMap<String, MoneyCents>),
}

/// Buckets `expenses` by the members of `category_id`'s filter set.
///
/// Each member only counts expenses recorded exactly on it. Members with no
/// expense still show up with a zero total. Expenses outside the set are
/// ignored. Sums that do not fit fail with `InvalidAmount`.
pub fn breakdown(
    tree: &CategoryTree,
    category_id: i32,
    expenses: &[Expense],
) -> ResultEngine<CategoryBreakdown> {
    let members = tree.expand_for_filtering(category_id)?;

    let mut sums: BTreeMap<i32, MoneyCents> =
        members.iter().map(|c| (c.id, MoneyCents::ZERO)).collect();
    for expense in expenses {
        if let Some(sum) = sums.get_mut(&expense.category_id) {
            add_to(sum, expense.total_price())?;
        }
    }

    let mut out = CategoryBreakdown::default();
    for member in members {
        let sum = sums.get(&member.id).copied().unwrap_or_default();
        if member.id == category_id {
            out.no_subcategory = sum;
        } else {
            out.subcategories.insert(member.name.clone(), sum);
        }
    }
    Ok(out)
}

/// Totals per root, each root summing itself and its children.
///
/// Every root is present, including those with nothing spent. Sums that do
/// not fit fail with `InvalidAmount`.
pub fn parent_totals(
    tree: &CategoryTree,
    expenses: &[Expense],
) -> ResultEngine<BTreeMap<String, MoneyCents>> {
    let mut sums: BTreeMap<i32, MoneyCents> = BTreeMap::new();
    for expense in expenses {
        add_to(sums.entry(expense.category_id).or_default(), expense.total_price())?;
    }

    tree.roots()
        .into_iter()
        .map(|root| {
            let members: HashSet<i32> = tree
                .expand_for_filtering(root.id)
                .map(|set| set.iter().map(|c| c.id).collect())
                .unwrap_or_default();
            let total = MoneyCents::checked_sum(
                members.iter().filter_map(|id| sums.get(id)).copied(),
            )
            .ok_or_else(overflow)?;
            Ok::<_, EngineError>((root.name.clone(), total))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{Category, NewExpense};

    fn child(id: i32, name: &str, parent: &Category) -> Category {
        let mut category = Category::new(id, name.to_string());
        category.set_parent(Some(parent)).unwrap();
        category
    }

    fn tree() -> CategoryTree {
        let auto = Category::new(1, "Auto".to_string());
        let food = Category::new(2, "Food".to_string());
        let petrol = child(3, "Petrol", &auto);
        let oil = child(4, "Oil", &auto);
        let meat = child(5, "Meat", &food);
        CategoryTree::new([auto, food, petrol, oil, meat])
    }

    fn expense(id: i64, category_id: i32, count: i32, cents: i64) -> Expense {
        Expense::new(
            id,
            NewExpense {
                category_id,
                count,
                unit_price: MoneyCents::new(cents),
                local_date: NaiveDate::from_ymd_opt(2020, 5, 5).unwrap(),
                note: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn breakdown_relabels_parent_bucket() {
        let expenses = [expense(1, 3, 2, 100_00)];
        let result = breakdown(&tree(), 1, &expenses).unwrap();

        assert_eq!(result.no_subcategory, MoneyCents::ZERO);
        assert_eq!(
            result.subcategories,
            BTreeMap::from([
                ("Oil".to_string(), MoneyCents::ZERO),
                ("Petrol".to_string(), MoneyCents::new(200_00)),
            ])
        );
        assert!(!result.subcategories.contains_key("Auto"));
    }

    #[test]
    fn breakdown_counts_direct_parent_expenses_once() {
        let expenses = [
            expense(1, 1, 1, 30_00),
            expense(2, 3, 1, 50_00),
            expense(3, 3, 1, 20_00),
            expense(4, 5, 1, 999_00),
        ];
        let result = breakdown(&tree(), 1, &expenses).unwrap();

        assert_eq!(result.no_subcategory, MoneyCents::new(30_00));
        assert_eq!(result.subcategories["Petrol"], MoneyCents::new(70_00));
        assert_eq!(result.total(), Ok(MoneyCents::new(100_00)));
    }

    #[test]
    fn breakdown_of_child_is_a_single_bucket() {
        let expenses = [expense(1, 3, 1, 12_34)];
        let result = breakdown(&tree(), 3, &expenses).unwrap();
        assert_eq!(result.no_subcategory, MoneyCents::new(12_34));
        assert!(result.subcategories.is_empty());
    }

    #[test]
    fn parent_totals_roll_children_up() {
        let expenses = [
            expense(1, 5, 1, 350_00),
            expense(2, 2, 1, 150_00),
            expense(3, 3, 1, 1500_00),
        ];
        let result = parent_totals(&tree(), &expenses).unwrap();
        assert_eq!(
            result,
            BTreeMap::from([
                ("Auto".to_string(), MoneyCents::new(1500_00)),
                ("Food".to_string(), MoneyCents::new(500_00)),
            ])
        );
    }

    #[test]
    fn parent_totals_keep_roots_without_spending() {
        let result = parent_totals(&tree(), &[]).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.values().all(|total| total.is_zero()));
    }

    #[test]
    fn sums_that_do_not_fit_are_rejected() {
        let half = i64::MAX / 2 + 1;
        let expenses = [expense(1, 3, 1, half), expense(2, 3, 1, half)];
        assert_eq!(
            breakdown(&tree(), 1, &expenses),
            Err(EngineError::InvalidAmount("total overflow".to_string()))
        );
        assert_eq!(
            parent_totals(&tree(), &expenses),
            Err(EngineError::InvalidAmount("total overflow".to_string()))
        );

        let spread = [expense(1, 3, 1, half), expense(2, 4, 1, half)];
        assert!(parent_totals(&tree(), &spread).is_err());
        let split = breakdown(&tree(), 1, &spread).unwrap();
        assert!(split.total().is_err());
    }
}
