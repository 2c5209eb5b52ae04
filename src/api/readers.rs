//! Reader registration and loan listings

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::{
        loan::LoanDetails,
        reader::{CreateReader, Reader},
    },
    AppState,
};

use super::{loans::with_overdue_flag, ValidatedJson};

/// Register a reader
#[utoipa::path(
    post,
    path = "/readers",
    tag = "readers",
    request_body = CreateReader,
    responses(
        (status = 201, description = "Reader registered", body = Reader),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_reader(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateReader>,
) -> AppResult<(StatusCode, Json<Reader>)> {
    let reader = state.services.catalog.create_reader(request).await?;
    Ok((StatusCode::CREATED, Json(reader)))
}

/// Get a reader
#[utoipa::path(
    get,
    path = "/readers/{id}",
    tag = "readers",
    params(
        ("id" = i32, Path, description = "Reader ID")
    ),
    responses(
        (status = 200, description = "Reader details", body = Reader),
        (status = 404, description = "Reader not found")
    )
)]
pub async fn get_reader(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Reader>> {
    let reader = state.services.catalog.get_reader(id).await?;
    Ok(Json(reader))
}

/// List all loans of a reader
#[utoipa::path(
    get,
    path = "/readers/{id}/loans",
    tag = "readers",
    params(
        ("id" = i32, Path, description = "Reader ID")
    ),
    responses(
        (status = 200, description = "Loans of the reader", body = Vec<LoanDetails>)
    )
)]
pub async fn get_reader_loans(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.loans_by_reader(id).await?;
    Ok(Json(with_overdue_flag(loans)))
}

/// List the loans a reader still holds
#[utoipa::path(
    get,
    path = "/readers/{id}/active-loans",
    tag = "readers",
    params(
        ("id" = i32, Path, description = "Reader ID")
    ),
    responses(
        (status = 200, description = "Borrowed loans of the reader", body = Vec<LoanDetails>)
    )
)]
pub async fn get_reader_active_loans(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.active_loans_by_reader(id).await?;
    Ok(Json(with_overdue_flag(loans)))
}

/// List a reader's overdue loans
#[utoipa::path(
    get,
    path = "/readers/{id}/overdue-loans",
    tag = "readers",
    params(
        ("id" = i32, Path, description = "Reader ID")
    ),
    responses(
        (status = 200, description = "Overdue loans of the reader", body = Vec<LoanDetails>)
    )
)]
pub async fn get_reader_overdue_loans(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state
        .services
        .loans
        .overdue_loans(Utc::now(), Some(id))
        .await?;
    Ok(Json(with_overdue_flag(loans)))
}
