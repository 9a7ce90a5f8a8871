//! JSON-file fallback cache for expenses.
//!
//! Mirrors the shape of the primary row store under a fixed namespace so
//! the application keeps working while the backend is unreachable. Dates
//! serialize as ISO `YYYY-MM-DD` strings. Records written here are never
//! mirrored back to the primary store.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Datelike;
use tracing::debug;
use uuid::Uuid;

use shared::{Expense, ExpenseFormData};

use crate::error::{AppError, AppResult};
use crate::storage::traits::ExpenseStore;

/// Fixed namespace the cache file lives under.
const STORAGE_NAMESPACE: &str = "expense-tracker-data";

/// File-backed expense store holding the whole collection in one JSON
/// document.
///
/// Every operation is a read-all / modify / write-all cycle. That region
/// is not atomic: concurrent mutations from the same process can race and
/// lose a write. This is acceptable only because the UI serializes
/// user-triggered mutations; any other caller must provide its own
/// serialization.
pub struct LocalExpenseStore {
    file_path: PathBuf,
}

impl LocalExpenseStore {
    /// Create a store rooted at `data_dir`, creating the directory if it
    /// does not exist yet.
    pub fn new(data_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = data_dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::unavailable(format!("cannot create data dir: {e}")))?;
        Ok(Self {
            file_path: dir.join(format!("{STORAGE_NAMESPACE}.json")),
        })
    }

    /// Read the whole collection. A missing file is an empty collection.
    fn read_expenses(&self) -> AppResult<Vec<Expense>> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.file_path)
            .map_err(|e| AppError::unavailable(format!("cannot open cache file: {e}")))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| AppError::unavailable(format!("corrupt cache file: {e}")))
    }

    /// Rewrite the whole collection.
    fn write_expenses(&self, expenses: &[Expense]) -> AppResult<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.file_path)
            .map_err(|e| AppError::unavailable(format!("cannot open cache file: {e}")))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, expenses)
            .map_err(|e| AppError::unavailable(format!("cannot write cache file: {e}")))
    }
}

#[async_trait]
impl ExpenseStore for LocalExpenseStore {
    async fn list_by_month(&self, year: i32, month: u32) -> AppResult<Vec<Expense>> {
        let mut expenses: Vec<Expense> = self
            .read_expenses()?
            .into_iter()
            .filter(|e| e.date.year() == year && e.date.month() == month)
            .collect();
        // Stable sort keeps insertion order within a day, which the
        // highest-spending-day tie-break depends on.
        expenses.sort_by_key(|e| e.date);
        Ok(expenses)
    }

    async fn add(&self, form: ExpenseFormData) -> AppResult<Expense> {
        let mut expenses = self.read_expenses()?;
        let id = if form.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            form.id
        };
        let expense = Expense {
            id,
            amount: form.amount,
            category: form.category,
            date: form.date,
            notes: form.notes,
        };
        expenses.push(expense.clone());
        self.write_expenses(&expenses)?;
        debug!("cached expense {} in local store", expense.id);
        Ok(expense)
    }

    async fn update(&self, form: ExpenseFormData) -> AppResult<Expense> {
        let mut expenses = self.read_expenses()?;
        let index = expenses
            .iter()
            .position(|e| e.id == form.id)
            .ok_or_else(|| AppError::not_found(format!("expense {}", form.id)))?;
        expenses[index] = Expense {
            id: form.id,
            amount: form.amount,
            category: form.category,
            date: form.date,
            notes: form.notes,
        };
        let updated = expenses[index].clone();
        self.write_expenses(&expenses)?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut expenses = self.read_expenses()?;
        expenses.retain(|e| e.id != id);
        self.write_expenses(&expenses)?;
        Ok(())
    }
}
