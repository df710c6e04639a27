pub use aggregation::{CategoryBreakdown, SpendingChart, breakdown, parent_totals};
pub use categories::Category;
pub use error::EngineError;
pub use expenses::{Expense, ExpensePatch, NewExpense};
pub use money::MoneyCents;
pub use ops::{
    Engine, EngineBuilder, ExpenseFilter, ExpenseFilterInput, ExpenseSort, ExpenseSortField,
    PriceRange, SortDirection, SpendingChartInput, SpendingChartQuery,
};
pub use tree::CategoryTree;

mod aggregation;
mod categories;
mod error;
mod expenses;
mod money;
mod ops;
mod tree;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
