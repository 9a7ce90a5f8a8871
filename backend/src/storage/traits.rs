//! Storage abstraction for expense persistence.
//!
//! The trait keeps the domain layer independent of where rows actually
//! live (remote row store, local JSON cache, memory), so backends can be
//! swapped or stacked without touching the services.

use async_trait::async_trait;
use shared::{Expense, ExpenseFormData};

use crate::error::AppResult;

/// Interface for expense CRUD against a backing store.
///
/// All operations are asynchronous and may suspend on I/O. There is no
/// concurrent-write coordination: two operations targeting the same record
/// resolve last-response-wins.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// All expenses dated within the given month, ascending by date.
    ///
    /// Implementations must clamp to `[first_of_month, last_of_month]`
    /// even if the underlying store hands back adjacent-month rows.
    async fn list_by_month(&self, year: i32, month: u32) -> AppResult<Vec<Expense>>;

    /// Persist a new expense, assigning a fresh unique id when `form.id`
    /// is empty, and return the stored record with server-assigned fields
    /// echoed back.
    ///
    /// Not idempotent for empty ids: calling twice creates two records, so
    /// callers must not retry blindly.
    async fn add(&self, form: ExpenseFormData) -> AppResult<Expense>;

    /// Replace the stored record matching `form.id` wholesale.
    ///
    /// Fails with `NotFound` when no such record exists. Idempotent:
    /// replaying the same input yields the same stored state.
    async fn update(&self, form: ExpenseFormData) -> AppResult<Expense>;

    /// Remove the record with the given id.
    ///
    /// Idempotent: deleting an id that does not exist is not an error.
    async fn delete(&self, id: &str) -> AppResult<()>;
}
