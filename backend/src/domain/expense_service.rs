//! Expense orchestration: boundary validation, persistence, and the
//! assembled calendar month view.

use std::sync::Arc;

use tracing::info;

use shared::{CalendarMonthResponse, Expense, ExpenseFormData};

use crate::domain::{calendar, summary};
use crate::error::{AppError, AppResult};
use crate::storage::ExpenseStore;

/// Service in front of the persistence port. Constructed once at process
/// start with the store injected; there is no global client.
#[derive(Clone)]
pub struct ExpenseService {
    store: Arc<dyn ExpenseStore>,
}

impl ExpenseService {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self { store }
    }

    /// Validate editor input before it can reach a store. Category and
    /// date invalidity cannot occur past deserialization (closed enum,
    /// checked `NaiveDate`), so the amount is the one field left to check.
    fn validate_form(form: &ExpenseFormData) -> AppResult<()> {
        if !form.amount.is_finite() {
            return Err(AppError::validation("amount must be a finite number"));
        }
        if form.amount < 0.0 {
            return Err(AppError::validation("amount must not be negative"));
        }
        Ok(())
    }

    pub async fn list_by_month(&self, year: i32, month: u32) -> AppResult<Vec<Expense>> {
        if !(1..=12).contains(&month) {
            return Err(AppError::validation(format!("invalid month: {month}")));
        }
        self.store.list_by_month(year, month).await
    }

    pub async fn add(&self, form: ExpenseFormData) -> AppResult<Expense> {
        Self::validate_form(&form)?;
        let expense = self.store.add(form).await?;
        info!(
            "added expense {} ({} on {})",
            expense.id, expense.category, expense.date
        );
        Ok(expense)
    }

    pub async fn update(&self, form: ExpenseFormData) -> AppResult<Expense> {
        Self::validate_form(&form)?;
        if form.id.is_empty() {
            return Err(AppError::validation("update requires an id"));
        }
        let expense = self.store.update(form).await?;
        info!("updated expense {}", expense.id);
        Ok(expense)
    }

    /// Create-or-replace dispatch for the editor dialog: an empty id
    /// creates, a non-empty id replaces.
    pub async fn save(&self, form: ExpenseFormData) -> AppResult<Expense> {
        if form.is_create() {
            self.add(form).await
        } else {
            self.update(form).await
        }
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.store.delete(id).await?;
        info!("deleted expense {id}");
        Ok(())
    }

    /// The full month view: fetch, bucket into the calendar grid, and
    /// aggregate, in one call.
    pub async fn calendar_month(&self, year: i32, month: u32) -> AppResult<CalendarMonthResponse> {
        let expenses = self.list_by_month(year, month).await?;
        let days = calendar::generate_calendar_days(year, month);
        let grouped = summary::group_by_day(&expenses, &days);
        let summary = summary::monthly_summary(&expenses);

        info!(
            "calendar {}/{}: {} expenses across {} days",
            calendar::month_name(month),
            year,
            expenses.len(),
            grouped.len()
        );

        Ok(CalendarMonthResponse {
            year,
            month,
            first_weekday: calendar::first_weekday_of_month(year, month),
            days: grouped,
            summary,
        })
    }
}
