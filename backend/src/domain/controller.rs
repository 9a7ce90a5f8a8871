//! Application controller: the UI-agnostic view-model behind the monthly
//! expense screen.
//!
//! Holds the selected month and the add/edit dialog state, and wires user
//! actions to the expense service. Presentation (components, styling,
//! routing) stays outside; a frontend renders from this state and calls
//! back into it.

use chrono::{Datelike, Local, NaiveDate};
use tracing::debug;

use shared::{Expense, ExpenseFormData};

use crate::domain::calendar;
use crate::domain::expense_service::ExpenseService;
use crate::error::AppResult;

/// State of the add/edit expense dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogState {
    Closed,
    /// Creating a new expense, pre-filled with the clicked date.
    Creating { date: NaiveDate },
    /// Editing an expense from the currently loaded month.
    Editing { expense_id: String },
}

/// Identifies which month a fetch belongs to, so a late response for a
/// previously selected month can be discarded.
pub type MonthKey = (i32, u32);

pub struct AppController {
    service: ExpenseService,
    /// First day of the currently selected month.
    month_cursor: NaiveDate,
    dialog: DialogState,
    /// Expenses most recently applied for `month_cursor`.
    expenses: Vec<Expense>,
    /// Last user-visible failure, consumed by the notification surface.
    notification: Option<String>,
}

impl AppController {
    /// Start on the current month with the dialog closed.
    pub fn new(service: ExpenseService) -> Self {
        let today = Local::now().date_naive();
        Self {
            service,
            month_cursor: today.with_day(1).unwrap_or(today),
            dialog: DialogState::Closed,
            expenses: Vec::new(),
            notification: None,
        }
    }

    pub fn current_month(&self) -> MonthKey {
        (self.month_cursor.year(), self.month_cursor.month())
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// Take the pending notification, clearing it.
    pub fn take_notification(&mut self) -> Option<String> {
        self.notification.take()
    }

    /// Shift the selected month by one in either direction, keeping the
    /// day-1 anchor, then refetch.
    pub async fn select_month(&mut self, delta: i32) {
        let (year, month) = self.current_month();
        let (year, month) = if delta < 0 {
            calendar::previous_month(year, month)
        } else {
            calendar::next_month(year, month)
        };
        if let Some(anchor) = NaiveDate::from_ymd_opt(year, month, 1) {
            self.month_cursor = anchor;
        }
        self.refresh().await;
    }

    /// Refetch the current month and apply the response.
    pub async fn refresh(&mut self) {
        let key = self.current_month();
        let result = self.service.list_by_month(key.0, key.1).await;
        self.apply_fetch(key, result);
    }

    /// Apply a fetch response. In-flight fetches are not cancelled when
    /// the user navigates away, so a response keyed to a month other than
    /// the currently selected one is stale and must be discarded rather
    /// than overwrite a newer month's view.
    pub fn apply_fetch(&mut self, key: MonthKey, result: AppResult<Vec<Expense>>) {
        if key != self.current_month() {
            debug!("discarding stale fetch for {}-{}", key.0, key.1);
            return;
        }
        match result {
            Ok(expenses) => self.expenses = expenses,
            Err(err) => self.notification = Some(format!("Failed to load expenses: {err}")),
        }
    }

    /// Open the dialog for a new expense on the given date.
    pub fn open_create(&mut self, date: NaiveDate) {
        self.dialog = DialogState::Creating { date };
    }

    /// Open the editor for a loaded expense. Unknown ids are a no-op.
    pub fn open_edit(&mut self, id: &str) {
        if self.expenses.iter().any(|e| e.id == id) {
            self.dialog = DialogState::Editing {
                expense_id: id.to_string(),
            };
        }
    }

    pub fn close_dialog(&mut self) {
        self.dialog = DialogState::Closed;
    }

    /// Persist the dialog contents: an empty id creates, otherwise the
    /// record is replaced. On success the dialog closes and the month is
    /// refetched; on failure the dialog stays open so the user can retry.
    pub async fn save(&mut self, form: ExpenseFormData) {
        match self.service.save(form).await {
            Ok(_) => {
                self.dialog = DialogState::Closed;
                self.refresh().await;
            }
            Err(err) => {
                self.notification = Some(format!("Failed to save expense: {err}"));
            }
        }
    }

    /// Delete an expense and refetch.
    pub async fn remove(&mut self, id: &str) {
        match self.service.delete(id).await {
            Ok(()) => self.refresh().await,
            Err(err) => {
                self.notification = Some(format!("Failed to delete expense: {err}"));
            }
        }
    }
}
