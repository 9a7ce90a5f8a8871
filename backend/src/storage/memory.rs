//! In-memory expense store.
//!
//! Backs unit tests and ad-hoc development sessions where neither the
//! remote backend nor an on-disk cache is wanted. Same contract as the
//! other backends.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Datelike;
use uuid::Uuid;

use shared::{Expense, ExpenseFormData};

use crate::error::{AppError, AppResult};
use crate::storage::traits::ExpenseStore;

#[derive(Default)]
pub struct InMemoryExpenseStore {
    expenses: Mutex<Vec<Expense>>,
}

impl InMemoryExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Vec<Expense>>> {
        self.expenses
            .lock()
            .map_err(|_| AppError::unavailable("expense store mutex poisoned"))
    }
}

#[async_trait]
impl ExpenseStore for InMemoryExpenseStore {
    async fn list_by_month(&self, year: i32, month: u32) -> AppResult<Vec<Expense>> {
        let expenses = self.lock()?;
        let mut matching: Vec<Expense> = expenses
            .iter()
            .filter(|e| e.date.year() == year && e.date.month() == month)
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.date);
        Ok(matching)
    }

    async fn add(&self, form: ExpenseFormData) -> AppResult<Expense> {
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
        self.lock()?.push(expense.clone());
        Ok(expense)
    }

    async fn update(&self, form: ExpenseFormData) -> AppResult<Expense> {
        let mut expenses = self.lock()?;
        let slot = expenses
            .iter_mut()
            .find(|e| e.id == form.id)
            .ok_or_else(|| AppError::not_found(format!("expense {}", form.id)))?;
        *slot = Expense {
            id: form.id,
            amount: form.amount,
            category: form.category,
            date: form.date,
            notes: form.notes,
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.lock()?.retain(|e| e.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ExpenseCategory;

    #[tokio::test]
    async fn test_add_and_list() {
        let store = InMemoryExpenseStore::new();
        let stored = store
            .add(ExpenseFormData {
                id: String::new(),
                amount: 42.0,
                category: ExpenseCategory::Shopping,
                date: "2024-03-09".parse().unwrap(),
                notes: String::new(),
            })
            .await
            .unwrap();

        let listed = store.list_by_month(2024, 3).await.unwrap();
        assert_eq!(listed, vec![stored]);
        assert!(store.list_by_month(2024, 4).await.unwrap().is_empty());
    }
}
