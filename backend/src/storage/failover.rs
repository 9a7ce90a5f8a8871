//! Failover wrapper implementing the dual-store persistence policy.
//!
//! Every operation is attempted against the primary backend first. When
//! the primary is unavailable, the same operation runs against the local
//! fallback cache and its result is returned instead, so callers never see
//! a primary outage. Semantic errors (validation, missing id) propagate
//! directly; only availability failures trigger the fallback, and callers
//! observe an error only when both stores fail.
//!
//! The two stores are never reconciled: a record written while the primary
//! is reachable exists only in the primary, and one written during an
//! outage exists only in the fallback cache. Consumers must not assume the
//! stores agree. A reconciliation sync would be a future extension; it is
//! deliberately not implemented here.

use async_trait::async_trait;
use tracing::warn;

use shared::{Expense, ExpenseFormData};

use crate::error::{AppError, AppResult};
use crate::storage::traits::ExpenseStore;

pub struct FailoverExpenseStore<P, F> {
    primary: P,
    fallback: F,
}

impl<P: ExpenseStore, F: ExpenseStore> FailoverExpenseStore<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

/// Only availability failures are masked; a semantic error from the
/// primary is a real answer and propagates as-is.
fn should_fail_over(err: &AppError) -> bool {
    matches!(err, AppError::BackendUnavailable(_))
}

/// A semantic error from the fallback is still a real answer; anything
/// else means both stores are down.
fn double_failure(primary_err: &AppError, fallback_err: AppError) -> AppError {
    match fallback_err {
        AppError::NotFound(_) | AppError::Validation(_) => fallback_err,
        other => AppError::PersistenceFailure {
            primary: primary_err.to_string(),
            fallback: other.to_string(),
        },
    }
}

#[async_trait]
impl<P: ExpenseStore, F: ExpenseStore> ExpenseStore for FailoverExpenseStore<P, F> {
    async fn list_by_month(&self, year: i32, month: u32) -> AppResult<Vec<Expense>> {
        match self.primary.list_by_month(year, month).await {
            Ok(expenses) => Ok(expenses),
            Err(err) if should_fail_over(&err) => {
                warn!("primary store failed listing {year}-{month}, using fallback cache: {err}");
                self.fallback
                    .list_by_month(year, month)
                    .await
                    .map_err(|fb| double_failure(&err, fb))
            }
            Err(err) => Err(err),
        }
    }

    async fn add(&self, form: ExpenseFormData) -> AppResult<Expense> {
        match self.primary.add(form.clone()).await {
            Ok(expense) => Ok(expense),
            Err(err) if should_fail_over(&err) => {
                warn!("primary store failed adding expense, using fallback cache: {err}");
                self.fallback
                    .add(form)
                    .await
                    .map_err(|fb| double_failure(&err, fb))
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, form: ExpenseFormData) -> AppResult<Expense> {
        match self.primary.update(form.clone()).await {
            Ok(expense) => Ok(expense),
            Err(err) if should_fail_over(&err) => {
                warn!(
                    "primary store failed updating expense {}, using fallback cache: {err}",
                    form.id
                );
                self.fallback
                    .update(form)
                    .await
                    .map_err(|fb| double_failure(&err, fb))
            }
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        match self.primary.delete(id).await {
            Ok(()) => Ok(()),
            Err(err) if should_fail_over(&err) => {
                warn!("primary store failed deleting expense {id}, using fallback cache: {err}");
                self.fallback
                    .delete(id)
                    .await
                    .map_err(|fb| double_failure(&err, fb))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryExpenseStore;
    use shared::ExpenseCategory;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Wraps a real store and fails every call while `down` is set.
    struct FlakyStore {
        inner: InMemoryExpenseStore,
        down: Arc<AtomicBool>,
    }

    impl FlakyStore {
        fn new(down: Arc<AtomicBool>) -> Self {
            Self {
                inner: InMemoryExpenseStore::new(),
                down,
            }
        }

        fn check(&self) -> AppResult<()> {
            if self.down.load(Ordering::SeqCst) {
                Err(AppError::unavailable("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ExpenseStore for FlakyStore {
        async fn list_by_month(&self, year: i32, month: u32) -> AppResult<Vec<Expense>> {
            self.check()?;
            self.inner.list_by_month(year, month).await
        }

        async fn add(&self, form: ExpenseFormData) -> AppResult<Expense> {
            self.check()?;
            self.inner.add(form).await
        }

        async fn update(&self, form: ExpenseFormData) -> AppResult<Expense> {
            self.check()?;
            self.inner.update(form).await
        }

        async fn delete(&self, id: &str) -> AppResult<()> {
            self.check()?;
            self.inner.delete(id).await
        }
    }

    /// A store whose every operation fails.
    struct DeadStore;

    #[async_trait]
    impl ExpenseStore for DeadStore {
        async fn list_by_month(&self, _year: i32, _month: u32) -> AppResult<Vec<Expense>> {
            Err(AppError::unavailable("disk on fire"))
        }

        async fn add(&self, _form: ExpenseFormData) -> AppResult<Expense> {
            Err(AppError::unavailable("disk on fire"))
        }

        async fn update(&self, _form: ExpenseFormData) -> AppResult<Expense> {
            Err(AppError::unavailable("disk on fire"))
        }

        async fn delete(&self, _id: &str) -> AppResult<()> {
            Err(AppError::unavailable("disk on fire"))
        }
    }

    fn form(amount: f64, date: &str) -> ExpenseFormData {
        ExpenseFormData {
            id: String::new(),
            amount,
            category: ExpenseCategory::Food,
            date: date.parse().unwrap(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_primary_result_is_used_when_healthy() {
        let down = Arc::new(AtomicBool::new(false));
        let store = FailoverExpenseStore::new(
            FlakyStore::new(down),
            InMemoryExpenseStore::new(),
        );

        let stored = store.add(form(10.0, "2024-03-05")).await.unwrap();
        let listed = store.list_by_month(2024, 3).await.unwrap();

        assert_eq!(listed, vec![stored]);
    }

    #[tokio::test]
    async fn test_outage_is_masked_and_stores_diverge() {
        let down = Arc::new(AtomicBool::new(true));
        let store = FailoverExpenseStore::new(
            FlakyStore::new(Arc::clone(&down)),
            InMemoryExpenseStore::new(),
        );

        // Primary down: the add succeeds against the fallback and the
        // caller never sees the outage.
        let stored = store.add(form(10.0, "2024-03-05")).await.unwrap();
        let listed = store.list_by_month(2024, 3).await.unwrap();
        assert_eq!(listed, vec![stored]);

        // Primary restored: the record was never mirrored, so the primary
        // path does not show it. The documented inconsistency.
        down.store(false, Ordering::SeqCst);
        let listed = store.list_by_month(2024, 3).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_record_added_while_healthy_is_absent_from_fallback() {
        let down = Arc::new(AtomicBool::new(false));
        let store = FailoverExpenseStore::new(
            FlakyStore::new(Arc::clone(&down)),
            InMemoryExpenseStore::new(),
        );

        store.add(form(10.0, "2024-03-05")).await.unwrap();

        // Outage: the fallback never heard about the record.
        down.store(true, Ordering::SeqCst);
        let listed = store.list_by_month(2024, 3).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_double_failure_surfaces_persistence_failure() {
        let store = FailoverExpenseStore::new(DeadStore, DeadStore);

        let result = store.list_by_month(2024, 3).await;
        assert!(matches!(
            result,
            Err(AppError::PersistenceFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_semantic_error_from_primary_propagates() {
        let down = Arc::new(AtomicBool::new(false));
        let store = FailoverExpenseStore::new(
            FlakyStore::new(down),
            InMemoryExpenseStore::new(),
        );

        // Healthy primary answering NotFound is a real answer, not an
        // outage; no fallback attempt is made.
        let mut missing = form(5.0, "2024-03-05");
        missing.id = "ghost".to_string();
        let result = store.update(missing).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_semantic_error_from_fallback_propagates() {
        let store = FailoverExpenseStore::new(DeadStore, InMemoryExpenseStore::new());

        let mut missing = form(5.0, "2024-03-05");
        missing.id = "ghost".to_string();
        let result = store.update(missing).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_through_failover() {
        let store = FailoverExpenseStore::new(DeadStore, InMemoryExpenseStore::new());

        store.delete("never-existed").await.unwrap();
        store.delete("never-existed").await.unwrap();
    }
}
