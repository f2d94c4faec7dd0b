// src/aggregate.rs
//
// Purchase aggregation for the products dashboard. Both entry points are pure
// functions of their input batch; retrieval happens elsewhere.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{
    CategorySummary, MonthlySeriesPoint, PurchaseRecord, ReturnRecord, Summary, UNCATEGORIZED,
};

/// Grouping key for a purchase: its category, or `Uncategorized` when the
/// category is null or empty.
pub fn category_key(category: Option<&str>) -> &str {
    match category {
        Some(c) if !c.is_empty() => c,
        _ => UNCATEGORIZED,
    }
}

/// `YYYY-MM` bucket for a calendar date.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Per-category totals across the whole batch. Categories come back in the
/// order they were first seen.
pub fn summarize(purchases: &[PurchaseRecord]) -> Summary {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<CategorySummary> = Vec::new();

    for p in purchases {
        let key = category_key(p.category.as_deref());
        let slot = *index.entry(key).or_insert_with(|| {
            summaries.push(CategorySummary {
                category: key.to_string(),
                num_purchases: 0,
                total_quantity: 0,
                total_amount: Decimal::ZERO,
            });
            summaries.len() - 1
        });

        let s = &mut summaries[slot];
        s.num_purchases += 1;
        s.total_quantity += p.quantity.unwrap_or(0);
        s.total_amount += p.amount.unwrap_or(Decimal::ZERO);
    }

    let categories = summaries.iter().map(|s| s.category.clone()).collect();
    Summary { categories, summaries }
}

/// Monthly series for one category.
///
/// `purchases` must already be restricted to the category; `returns` is the
/// full return set and is matched against the purchase ids in `purchases`.
/// `category` only labels the result and is not used to filter again.
///
/// Only months containing at least one purchase are emitted, so returns that
/// fall in a month without purchases are not counted anywhere. Rows without a
/// date are skipped.
pub fn series_for_category(
    purchases: &[PurchaseRecord],
    returns: &[ReturnRecord],
    category: &str,
) -> Vec<MonthlySeriesPoint> {
    let mut by_month: BTreeMap<String, (i64, Decimal)> = BTreeMap::new();
    let mut undated = 0usize;

    for p in purchases {
        let Some(date) = p.date else {
            undated += 1;
            continue;
        };
        let entry = by_month.entry(month_key(date)).or_insert((0, Decimal::ZERO));
        entry.0 += p.quantity.unwrap_or(0);
        entry.1 += p.amount.unwrap_or(Decimal::ZERO);
    }

    let ids: HashSet<i64> = purchases.iter().map(|p| p.id).collect();
    let mut returns_by_month: HashMap<String, i64> = HashMap::new();
    for r in returns.iter().filter(|r| ids.contains(&r.purchase_id)) {
        match r.date {
            Some(date) => *returns_by_month.entry(month_key(date)).or_insert(0) += 1,
            None => undated += 1,
        }
    }

    if undated > 0 {
        tracing::debug!(category, undated, "skipped undated rows in monthly series");
    }

    by_month
        .into_iter()
        .map(|(month, (total_quantity, total_amount))| {
            let num_returns = returns_by_month.get(&month).copied().unwrap_or(0);
            MonthlySeriesPoint { month, total_quantity, total_amount, num_returns }
        })
        .collect()
}
