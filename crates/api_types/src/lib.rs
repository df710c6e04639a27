use serde::{Deserialize, Serialize};

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: i32,
        pub name: String,
        /// `None` for a root category.
        pub parent_id: Option<i32>,
    }
}

pub mod expense {
    use chrono::NaiveDate;

    use super::*;

    /// New expense. Prices are integer minor units (cents).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub category_id: i32,
        /// Defaults to 1.
        pub count: Option<i32>,
        pub unit_price_minor: i64,
        pub local_date: NaiveDate,
        pub note: Option<String>,
    }

    /// Partial update: missing fields are left unchanged.
    ///
    /// `count` and `unit_price_minor` must be sent together. An empty `note`
    /// clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub category_id: Option<i32>,
        pub count: Option<i32>,
        pub unit_price_minor: Option<i64>,
        pub local_date: Option<NaiveDate>,
        pub note: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: i64,
        pub category_id: i32,
        pub count: i32,
        pub unit_price_minor: i64,
        pub total_price_minor: i64,
        pub local_date: NaiveDate,
        pub note: Option<String>,
    }

    /// Query string of `GET /expense-certain`.
    ///
    /// Values are kept as raw strings so that malformed input is reported
    /// with the same error body as any other validation failure.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseQuery {
        #[serde(default)]
        pub start_date: String,
        #[serde(default)]
        pub finish_date: String,
        pub category_id: Option<String>,
        /// Decimal string, e.g. `12.50`.
        pub price_from: Option<String>,
        pub price_to: Option<String>,
        pub note: Option<String>,
        #[serde(default)]
        pub sort_by: String,
    }
}

pub mod stats {
    use std::collections::BTreeMap;

    use super::*;

    /// Query string of `GET /expense-bar-data`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BarDataQuery {
        #[serde(default)]
        pub date_from: String,
        #[serde(default)]
        pub date_to: String,
        pub category_id: Option<String>,
    }

    /// Spending totals for a bar chart.
    ///
    /// With a category, `totals` holds its subcategories and
    /// `no_subcategory` what was spent on the category itself. Without one,
    /// `totals` holds every root and `no_subcategory` is `null`.
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    pub struct BarData {
        pub no_subcategory: Option<f64>,
        pub totals: BTreeMap<String, f64>,
    }
}
