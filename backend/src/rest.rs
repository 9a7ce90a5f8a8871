//! REST API over the domain services.
//!
//! Thin axum handlers: resolve the bearer token, delegate to a service,
//! map the error taxonomy onto status codes. All state is injected through
//! [`AppState`]; nothing global.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use shared::{
    CalendarMonthResponse, Expense, ExpenseFormData, SessionResponse, SignInRequest,
    SignUpRequest, UpdateEmailRequest, UpdateRoleRequest, UserProfile,
};

use crate::domain::auth_service::AuthService;
use crate::domain::expense_service::ExpenseService;
use crate::error::{AppError, AppResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub expense_service: ExpenseService,
    pub auth_service: AuthService,
}

impl AppState {
    pub fn new(expense_service: ExpenseService, auth_service: AuthService) -> Self {
        Self {
            expense_service,
            auth_service,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::PersistenceFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Query parameters for month-scoped endpoints.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/login", post(sign_in))
        .route("/api/auth/logout", post(sign_out))
        .route("/api/auth/me", get(me))
        .route("/api/auth/profile", put(update_email))
        .route("/api/expenses", get(list_expenses).post(create_expense))
        .route(
            "/api/expenses/:id",
            put(update_expense).delete(delete_expense),
        )
        .route("/api/calendar", get(calendar_month))
        .route("/api/admin/users", get(admin_list_users))
        .route("/api/admin/users/:id/role", put(admin_set_role))
        .with_state(state)
}

async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> AppResult<Json<UserProfile>> {
    info!("POST /api/auth/signup - {}", request.email);
    let profile = state
        .auth_service
        .sign_up(&request.email, &request.password)
        .await?;
    Ok(Json(profile))
}

async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> AppResult<Json<SessionResponse>> {
    info!("POST /api/auth/login - {}", request.email);
    let session = state
        .auth_service
        .sign_in(&request.email, &request.password)
        .await?;
    Ok(Json(session))
}

async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> AppResult<StatusCode> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    state.auth_service.sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<UserProfile>> {
    let user = state
        .auth_service
        .require_user(bearer_token(&headers))
        .await?;
    Ok(Json(user))
}

async fn update_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdateEmailRequest>,
) -> AppResult<Json<UserProfile>> {
    let updated = state
        .auth_service
        .update_email(bearer_token(&headers), &request.email)
        .await?;
    Ok(Json(updated))
}

async fn list_expenses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<Vec<Expense>>> {
    state
        .auth_service
        .require_user(bearer_token(&headers))
        .await?;
    info!("GET /api/expenses - {}/{}", query.year, query.month);
    let expenses = state
        .expense_service
        .list_by_month(query.year, query.month)
        .await?;
    Ok(Json(expenses))
}

async fn create_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<ExpenseFormData>,
) -> AppResult<(StatusCode, Json<Expense>)> {
    state
        .auth_service
        .require_user(bearer_token(&headers))
        .await?;
    info!("POST /api/expenses - {} on {}", form.category, form.date);
    let expense = state.expense_service.add(form).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn update_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut form): Json<ExpenseFormData>,
) -> AppResult<Json<Expense>> {
    state
        .auth_service
        .require_user(bearer_token(&headers))
        .await?;
    info!("PUT /api/expenses/{id}");
    // The path owns the identity; the body is the replacement record.
    form.id = id;
    let expense = state.expense_service.update(form).await?;
    Ok(Json(expense))
}

async fn delete_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state
        .auth_service
        .require_user(bearer_token(&headers))
        .await?;
    info!("DELETE /api/expenses/{id}");
    state.expense_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn calendar_month(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<CalendarMonthResponse>> {
    state
        .auth_service
        .require_user(bearer_token(&headers))
        .await?;
    info!("GET /api/calendar - {}/{}", query.year, query.month);
    let view = state
        .expense_service
        .calendar_month(query.year, query.month)
        .await?;
    Ok(Json(view))
}

async fn admin_list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<UserProfile>>> {
    info!("GET /api/admin/users");
    let users = state
        .auth_service
        .list_users(bearer_token(&headers))
        .await?;
    Ok(Json(users))
}

async fn admin_set_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserProfile>> {
    info!("PUT /api/admin/users/{id}/role - {}", request.role);
    let updated = state
        .auth_service
        .set_role(bearer_token(&headers), &id, request.role)
        .await?;
    Ok(Json(updated))
}
