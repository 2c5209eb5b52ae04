//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, loans, readers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "1.0.0",
        description = "Loan lifecycle and inventory REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Loans
        loans::create_loan,
        loans::get_loan,
        loans::update_loan,
        loans::delete_loan,
        loans::list_overdue_loans,
        // Books
        books::create_book,
        books::get_book,
        books::get_book_loans,
        // Readers
        readers::create_reader,
        readers::get_reader,
        readers::get_reader_loans,
        readers::get_reader_active_loans,
        readers::get_reader_overdue_loans,
    ),
    components(
        schemas(
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanDetails,
            crate::models::loan::CreateLoan,
            crate::models::loan::UpdateLoan,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            // Readers
            crate::models::reader::Reader,
            crate::models::reader::CreateReader,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loans", description = "Loan lifecycle"),
        (name = "books", description = "Book registration and availability"),
        (name = "readers", description = "Reader registration and loan listings")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
