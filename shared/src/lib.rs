use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Closed set of expense categories.
///
/// Serialized as lowercase strings (`food`, `rent`, ...) to match the
/// column values in the row store and the fallback cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Food,
    Rent,
    Travel,
    Shopping,
    Others,
}

impl ExpenseCategory {
    /// Every category, in display order.
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Food,
        ExpenseCategory::Rent,
        ExpenseCategory::Travel,
        ExpenseCategory::Shopping,
        ExpenseCategory::Others,
    ];

    /// Human-readable label for category pickers and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Rent => "Rent",
            ExpenseCategory::Travel => "Travel",
            ExpenseCategory::Shopping => "Shopping",
            ExpenseCategory::Others => "Others",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single dated spending record.
///
/// Immutable once created; edits replace the whole record via the
/// persistence port's update operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Opaque unique identifier, assigned by the persistence layer when the
    /// caller did not supply one. Stable for the record's lifetime.
    pub id: String,
    /// Non-negative amount in currency units.
    pub amount: f64,
    pub category: ExpenseCategory,
    /// Calendar date of the expense (serialized `YYYY-MM-DD`, no
    /// time-of-day semantics).
    pub date: NaiveDate,
    /// Free-text note, may be empty.
    pub notes: String,
}

/// Editor-facing shape of an expense.
///
/// Same fields as [`Expense`], but an empty `id` signals "create". Used
/// only between the expense dialog and the persistence port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseFormData {
    pub id: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    pub notes: String,
}

impl ExpenseFormData {
    /// True when saving this form should create a new record.
    pub fn is_create(&self) -> bool {
        self.id.is_empty()
    }
}

/// One cell of the monthly calendar grid: a date and the expenses that
/// fall exactly on it. Derived per view, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub expenses: Vec<Expense>,
}

/// The day with the maximum total spend in a month.
///
/// `total == 0.0` means no day had any spending; the date is then only a
/// placeholder and must not be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighestSpendingDay {
    pub date: NaiveDate,
    pub total: f64,
}

impl HighestSpendingDay {
    /// Whether there is an actual highest-spending day to display.
    pub fn has_spending(&self) -> bool {
        self.total > 0.0
    }
}

/// Aggregate view over one month's expenses.
///
/// Only categories that actually occur appear in `category_totals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub total_spent: f64,
    pub category_totals: HashMap<ExpenseCategory, f64>,
    pub highest_spending_day: HighestSpendingDay,
}

/// Everything the calendar page needs for one month, in one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonthResponse {
    pub year: i32,
    /// 1-based month (1 = January).
    pub month: u32,
    /// Weekday of the 1st (0 = Sunday ... 6 = Saturday), for grid padding.
    pub first_weekday: u32,
    pub days: Vec<CalendarDay>,
    pub summary: MonthlySummary,
}

/// Role stored on a user's profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    /// The opposite role, used by the admin "make admin"/"make user" toggle.
    pub fn toggled(self) -> UserRole {
        match self {
            UserRole::Admin => UserRole::User,
            UserRole::User => UserRole::Admin,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => f.write_str("admin"),
            UserRole::User => f.write_str("user"),
        }
    }
}

/// Profile row kept by the identity provider, keyed by user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    /// RFC 3339 timestamp, as the provider returns it.
    pub created_at: String,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Request to register a new account. New accounts start with role `user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
}

/// Request to sign in with email and password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Session handed back after a successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub user: UserProfile,
}

/// Request to change a user's role (admin only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// Request to change the signed-in user's email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}

/// Format an amount for display, e.g. `₹1,23,456.78`.
///
/// Indian-style digit grouping: the last three digits form one group,
/// everything above groups in pairs.
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = format!("{:.2}", amount.abs());
    let (whole, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::new();
    let digits: Vec<char> = whole.chars().collect();
    for (i, digit) in digits.iter().enumerate() {
        let remaining = digits.len() - i;
        if i > 0 && (remaining == 3 || (remaining > 3 && (remaining - 3) % 2 == 0)) {
            grouped.push(',');
        }
        grouped.push(*digit);
    }

    if negative {
        format!("-₹{}.{}", grouped, fraction)
    } else {
        format!("₹{}.{}", grouped, fraction)
    }
}
