//! HTTP client for the primary expense row store.
//!
//! Speaks the hosted backend's REST dialect: exact-match and range filters
//! as query parameters (`date=gte.2024-03-01`), `Prefer:
//! return=representation` to get the stored row echoed back, and the
//! public API key plus a bearer token on every request.
//!
//! Rows are decoded through [`ExpenseRow`] at this boundary: anything that
//! does not fit the strict expense model fails with a validation error
//! instead of leaking loosely-typed data into the domain.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use shared::{Expense, ExpenseCategory, ExpenseFormData};

use crate::domain::calendar;
use crate::error::{AppError, AppResult};
use crate::storage::traits::ExpenseStore;

/// Path of the expenses table in the row-store REST API.
const EXPENSES_PATH: &str = "/rest/v1/expenses";

/// Builder for [`RemoteExpenseStore`]; the base URL override doubles as
/// the test seam for mock servers.
#[derive(Debug, Default)]
pub struct RemoteExpenseStoreBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
}

impl RemoteExpenseStoreBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn build(self) -> AppResult<RemoteExpenseStore> {
        let base_url = self
            .base_url
            .ok_or_else(|| AppError::validation("remote store requires a base url"))?;
        let http = reqwest::Client::builder().build()?;
        Ok(RemoteExpenseStore {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: self.api_key.unwrap_or_default(),
        })
    }
}

/// Client for the backend's expenses table.
pub struct RemoteExpenseStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Wire representation of a stored expense row.
#[derive(Debug, Deserialize)]
struct ExpenseRow {
    id: String,
    amount: f64,
    category: ExpenseCategory,
    date: NaiveDate,
    #[serde(default)]
    notes: String,
}

impl ExpenseRow {
    /// Validate and convert into the strict domain type.
    fn into_expense(self) -> AppResult<Expense> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(AppError::validation(format!(
                "row {} has invalid amount {}",
                self.id, self.amount
            )));
        }
        Ok(Expense {
            id: self.id,
            amount: self.amount,
            category: self.category,
            date: self.date,
            notes: self.notes,
        })
    }
}

/// Payload for inserts and full-record updates. The id is omitted on
/// insert when the caller left it empty, so the backend assigns one.
#[derive(Debug, Serialize)]
struct ExpensePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    amount: f64,
    category: ExpenseCategory,
    date: NaiveDate,
    notes: &'a str,
}

impl<'a> ExpensePayload<'a> {
    fn from_form(form: &'a ExpenseFormData) -> Self {
        Self {
            id: (!form.id.is_empty()).then_some(form.id.as_str()),
            amount: form.amount,
            category: form.category,
            date: form.date,
            notes: &form.notes,
        }
    }
}

impl RemoteExpenseStore {
    pub fn builder() -> RemoteExpenseStoreBuilder {
        RemoteExpenseStoreBuilder::default()
    }

    fn expenses_url(&self) -> String {
        format!("{}{}", self.base_url, EXPENSES_PATH)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers
    }

    /// Check the status and decode the row array every endpoint returns.
    async fn expect_rows(response: reqwest::Response) -> AppResult<Vec<ExpenseRow>> {
        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| AppError::validation(format!("undecodable row payload: {e}")))
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(AppError::unavailable(format!(
                "backend returned {status}: {message}"
            )))
        }
    }
}

#[async_trait]
impl ExpenseStore for RemoteExpenseStore {
    async fn list_by_month(&self, year: i32, month: u32) -> AppResult<Vec<Expense>> {
        let (first, last) = calendar::month_bounds(year, month)
            .ok_or_else(|| AppError::validation(format!("invalid month: {year}-{month}")))?;

        let response = self
            .http
            .get(self.expenses_url())
            .headers(self.headers())
            .query(&[
                ("date", format!("gte.{first}")),
                ("date", format!("lte.{last}")),
                ("order", "date.asc".to_string()),
            ])
            .send()
            .await?;

        let rows = Self::expect_rows(response).await?;
        let mut expenses = rows
            .into_iter()
            .map(ExpenseRow::into_expense)
            .collect::<AppResult<Vec<_>>>()?;
        // Never trust the backend to have honored the range filter.
        expenses.retain(|e| e.date >= first && e.date <= last);
        expenses.sort_by_key(|e| e.date);
        Ok(expenses)
    }

    async fn add(&self, form: ExpenseFormData) -> AppResult<Expense> {
        let response = self
            .http
            .post(self.expenses_url())
            .headers(self.headers())
            .header("Prefer", "return=representation")
            .json(&ExpensePayload::from_form(&form))
            .send()
            .await?;

        let mut rows = Self::expect_rows(response).await?;
        rows.pop()
            .ok_or_else(|| AppError::unavailable("backend returned no row for insert"))?
            .into_expense()
    }

    async fn update(&self, form: ExpenseFormData) -> AppResult<Expense> {
        let response = self
            .http
            .patch(self.expenses_url())
            .headers(self.headers())
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{}", form.id))])
            .json(&ExpensePayload::from_form(&form))
            .send()
            .await?;

        let mut rows = Self::expect_rows(response).await?;
        // An empty representation means no row matched the id filter.
        rows.pop()
            .ok_or_else(|| AppError::not_found(format!("expense {}", form.id)))?
            .into_expense()
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let response = self
            .http
            .delete(self.expenses_url())
            .headers(self.headers())
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;

        let status = response.status();
        // Deleting a missing row matches nothing, which the backend
        // reports as success (or 404 on some deployments); both are fine.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(AppError::unavailable(format!(
                "backend returned {status}: {message}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn form(id: &str, amount: f64, date: &str) -> ExpenseFormData {
        ExpenseFormData {
            id: id.to_string(),
            amount,
            category: ExpenseCategory::Food,
            date: date.parse().unwrap(),
            notes: "groceries".to_string(),
        }
    }

    async fn store_for(server: &MockServer) -> RemoteExpenseStore {
        RemoteExpenseStore::builder()
            .base_url(server.uri())
            .api_key("test-key")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_base_url() {
        let result = RemoteExpenseStore::builder().api_key("k").build();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_decodes_and_sorts_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EXPENSES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "b", "amount": 5.0, "category": "travel", "date": "2024-03-20", "notes": ""},
                {"id": "a", "amount": 12.0, "category": "food", "date": "2024-03-02"},
            ])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let expenses = store.list_by_month(2024, 3).await.unwrap();

        let ids: Vec<&str> = expenses.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(expenses[0].notes, "");
    }

    #[tokio::test]
    async fn test_list_clamps_adjacent_month_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EXPENSES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "feb", "amount": 1.0, "category": "food", "date": "2024-02-29"},
                {"id": "mar", "amount": 2.0, "category": "food", "date": "2024-03-01"},
                {"id": "apr", "amount": 3.0, "category": "food", "date": "2024-04-01"},
            ])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let expenses = store.list_by_month(2024, 3).await.unwrap();

        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].id, "mar");
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_enum_category() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EXPENSES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "x", "amount": 1.0, "category": "groceries", "date": "2024-03-01"},
            ])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let result = store.list_by_month(2024, 3).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_rejects_negative_amount_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EXPENSES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "x", "amount": -4.0, "category": "food", "date": "2024-03-01"},
            ])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let result = store.list_by_month(2024, 3).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_backend_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EXPENSES_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let result = store.list_by_month(2024, 3).await;

        assert!(matches!(result, Err(AppError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn test_add_echoes_server_assigned_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EXPENSES_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                {"id": "srv-1", "amount": 12.5, "category": "food", "date": "2024-03-05", "notes": "groceries"},
            ])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let stored = store.add(form("", 12.5, "2024-03-05")).await.unwrap();

        assert_eq!(stored.id, "srv-1");
        assert_eq!(stored.amount, 12.5);
    }

    #[tokio::test]
    async fn test_update_with_no_matching_row_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(EXPENSES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let result = store.update(form("ghost", 5.0, "2024-03-05")).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_row_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(EXPENSES_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        assert!(store.delete("ghost").await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_backend_unavailable() {
        // Point at a port nothing listens on.
        let store = RemoteExpenseStore::builder()
            .base_url("http://127.0.0.1:1")
            .api_key("k")
            .build()
            .unwrap();

        let result = store.list_by_month(2024, 3).await;
        assert!(matches!(result, Err(AppError::BackendUnavailable(_))));
    }
}
