// src/models/mod.rs

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// Label used for purchases whose category is null, missing or empty.
pub const UNCATEGORIZED: &str = "Uncategorized";

// ───────────────────────────────────────
// Purchases & returns (aggregator input)
// ───────────────────────────────────────

/// One row of `public.purchase`, already validated at the store boundary.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PurchaseRecord {
    pub id: i64,
    pub date: Option<NaiveDate>,
    pub quantity: Option<i64>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
}

/// One row of `public.returns`. Carries no category of its own; it only
/// points back at the purchase it returns.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ReturnRecord {
    pub purchase_id: i64,
    pub date: Option<NaiveDate>,
}

// ───────────────────────────────────────
// Aggregator output
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: String,
    pub num_purchases: i64,
    pub total_quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySeriesPoint {
    pub month: String, // YYYY-MM
    pub total_quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub num_returns: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub categories: Vec<String>,
    pub summaries: Vec<CategorySummary>,
}

// ───────────────────────────────────────
// Directory data: customers, employees
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customerid: i64,
    pub email: Option<String>,
    pub custname: Option<String>,
    pub age: Option<i32>, // -1 when unknown
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub employeeid: i64,
    pub empname: String,
    pub emptitle: Option<String>, // Agent | Supervisor | Manager
    pub tenure: Option<String>,
}

pub const EMPLOYEE_TITLES: [&str; 3] = ["Agent", "Supervisor", "Manager"];

// ───────────────────────────────────────
// Marketing email lists
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmailList {
    pub list_id: i64,
    pub list_title: String,
    pub created_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ListCustomer {
    pub cust_name: Option<String>,
    pub email: Option<String>,
}

/// Arguments of the `CreateOrUpdateUserList` stored procedure. Blank form
/// fields arrive as `""` (or `0` for the spend) and mean "no filter".
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListCriteria {
    pub list_title: Option<String>,
    #[serde(default, deserialize_with = "blank_date")]
    pub min_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_or_zero_amount")]
    pub min_spend: Option<Decimal>,
    pub categories: Option<Vec<String>>,
    pub has_returned: Option<bool>,
}

fn blank_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|e| de::Error::custom(format!("minDate '{s}': {e}"))),
        _ => Ok(None),
    }
}

fn blank_or_zero_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
    let amount = match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(other) => return Err(de::Error::custom(format!("minSpend must be a number, got {other}"))),
    };
    let d = Decimal::from_str(&amount)
        .or_else(|_| Decimal::from_scientific(&amount))
        .map_err(|e| de::Error::custom(format!("minSpend '{amount}': {e}")))?;
    Ok(if d.is_zero() { None } else { Some(d) })
}

// ───────────────────────────────────────
// Response bodies
// ───────────────────────────────────────
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub categories: Vec<String>,
    pub summary_by_category: Vec<CategorySummary>,
}

impl From<Summary> for SummaryResponse {
    fn from(s: Summary) -> Self {
        Self { categories: s.categories, summary_by_category: s.summaries }
    }
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub category: String,
    pub series: Vec<MonthlySeriesPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message { pub message: String }
