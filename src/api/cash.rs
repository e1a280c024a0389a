use crate::{
    aggregate::cash_summary,
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::cash::NewCashTransaction,
    report::cash_summary_lines,
    store::Store,
    utils::pdf::render_lines,
    validation::validate_cash_transaction,
};
use actix_web::{
    HttpResponse,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web,
};
use tracing::{error, info};

/// Record a cash inflow or outflow
#[utoipa::path(
    post,
    path = "/cash/transaction",
    request_body = NewCashTransaction,
    responses(
        (status = 200, description = "Transaction recorded", body = crate::model::cash::CashTransaction),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "detail": "Amount must be positive.", "code": "INVALID_ARGUMENT"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Cash"
)]
pub async fn add_transaction(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<NewCashTransaction>,
) -> ApiResult<HttpResponse> {
    let txn = validate_cash_transaction(payload.into_inner())?;
    let txn = store.add_cash_transaction(auth.user_id, txn);
    info!(user_id = %auth.user_id, kind = txn.kind.as_str(), amount = txn.amount, "Cash transaction recorded");
    Ok(HttpResponse::Ok().json(txn))
}

/// Totals over the caller's transactions
#[utoipa::path(
    get,
    path = "/cash/summary",
    responses(
        (status = 200, description = "Cash summary", body = crate::model::cash::CashSummary),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Cash"
)]
pub async fn summary(auth: AuthUser, store: web::Data<Store>) -> HttpResponse {
    HttpResponse::Ok().json(cash_summary(&store.cash_transactions(auth.user_id)))
}

/// Cash summary as a PDF document
#[utoipa::path(
    get,
    path = "/cash/summary/pdf",
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Cash"
)]
pub async fn summary_pdf(auth: AuthUser, store: web::Data<Store>) -> ApiResult<HttpResponse> {
    let summary = cash_summary(&store.cash_transactions(auth.user_id));
    let bytes = render_lines("Financial Summary", 16.0, &cash_summary_lines(&summary)).map_err(|e| {
        error!(error = %e, user_id = %auth.user_id, "Failed to render cash summary");
        ApiError::Internal("Failed to render document".into())
    })?;

    Ok(pdf_response(bytes, "summary.pdf"))
}

pub(crate) fn pdf_response(bytes: Vec<u8>, filename: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename.to_string())],
        })
        .body(bytes)
}
