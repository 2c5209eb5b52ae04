//! Loan lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, Loan, LoanDetails, UpdateLoan},
    AppState,
};

use super::ValidatedJson;

pub(super) fn with_overdue_flag(loans: Vec<Loan>) -> Vec<LoanDetails> {
    let now = Utc::now();
    loans
        .into_iter()
        .map(|loan| LoanDetails::new(loan, now))
        .collect()
}

/// Create a loan
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanDetails),
        (status = 400, description = "Invalid request, unknown book or reader, or no copies left"),
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<LoanDetails>)> {
    let loan = state.services.loans.create_loan(request).await?;
    Ok((StatusCode::CREATED, Json(LoanDetails::new(loan, Utc::now()))))
}

/// Get a loan
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get_loan(id).await?;
    Ok(Json(LoanDetails::new(loan, Utc::now())))
}

/// Update a loan (return it, move it to another book, change dates)
#[utoipa::path(
    put,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = UpdateLoan,
    responses(
        (status = 200, description = "Loan updated", body = LoanDetails),
        (status = 400, description = "Invalid request, unknown book or reader, or no copies left"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "A returned loan cannot be borrowed again")
    )
)]
pub async fn update_loan(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(changes): ValidatedJson<UpdateLoan>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.update_loan(id, changes).await?;
    Ok(Json(LoanDetails::new(loan, Utc::now())))
}

/// Delete a loan
#[utoipa::path(
    delete,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn delete_loan(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.loans.delete_loan(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List every overdue loan
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    responses(
        (status = 200, description = "Borrowed loans past their due date", body = Vec<LoanDetails>)
    )
)]
pub async fn list_overdue_loans(State(state): State<AppState>) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.overdue_loans(Utc::now(), None).await?;
    Ok(Json(with_overdue_flag(loans)))
}
