//! Expense aggregation for the monthly summary.
//!
//! Every function here operates on an in-memory expense set that the
//! persistence port has already filtered to one month; nothing re-filters
//! by month, only buckets within the given set. Malformed records
//! (negative or non-finite amounts) are rejected at the persistence
//! boundary before they can reach this module.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use shared::{CalendarDay, Expense, ExpenseCategory, HighestSpendingDay, MonthlySummary};

/// One bucket per calendar day, in the given (ascending) day order.
///
/// An expense lands in a bucket only on exact date equality. Input order is
/// preserved within each bucket, and every calendar day appears exactly
/// once, empty buckets included.
pub fn group_by_day(expenses: &[Expense], calendar_days: &[NaiveDate]) -> Vec<CalendarDay> {
    calendar_days
        .iter()
        .map(|day| CalendarDay {
            date: *day,
            expenses: expenses
                .iter()
                .filter(|expense| expense.date == *day)
                .cloned()
                .collect(),
        })
        .collect()
}

/// Sum of amounts for one day's bucket. 0 for an empty bucket.
pub fn daily_total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|expense| expense.amount).sum()
}

/// Sum of amounts across the whole month's set. 0 for an empty set.
///
/// Summing `daily_total` over the buckets of any calendar partition of the
/// same set yields this value back.
pub fn monthly_total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|expense| expense.amount).sum()
}

/// Per-category sums. Categories with no matching expense are absent from
/// the map rather than present with value 0.
pub fn category_totals(expenses: &[Expense]) -> HashMap<ExpenseCategory, f64> {
    let mut totals: HashMap<ExpenseCategory, f64> = HashMap::new();
    for expense in expenses {
        *totals.entry(expense.category).or_insert(0.0) += expense.amount;
    }
    totals
}

/// The date with the maximum total spend, by exact date equality.
///
/// Ties go to whichever date appears first in the input's iteration order
/// (strictly-greater comparison over first-occurrence order), so the
/// result is deterministic for a stable input ordering. When nothing was
/// spent the total is 0 and the date is a current-date placeholder;
/// callers must treat `total == 0` as "no highest day".
pub fn highest_spending_day(expenses: &[Expense]) -> HighestSpendingDay {
    let mut first_seen: Vec<NaiveDate> = Vec::new();
    let mut totals: HashMap<NaiveDate, f64> = HashMap::new();

    for expense in expenses {
        let entry = totals.entry(expense.date).or_insert_with(|| {
            first_seen.push(expense.date);
            0.0
        });
        *entry += expense.amount;
    }

    let mut best = HighestSpendingDay {
        date: Local::now().date_naive(),
        total: 0.0,
    };
    for date in first_seen {
        let total = totals.get(&date).copied().unwrap_or(0.0);
        if total > best.total {
            best = HighestSpendingDay { date, total };
        }
    }
    best
}

/// Bundle of all aggregates the summary card renders.
pub fn monthly_summary(expenses: &[Expense]) -> MonthlySummary {
    MonthlySummary {
        total_spent: monthly_total(expenses),
        category_totals: category_totals(expenses),
        highest_spending_day: highest_spending_day(expenses),
    }
}
