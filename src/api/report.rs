use crate::{
    aggregate::aggregate_sessions,
    api::cash::pdf_response,
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    report::export_lines,
    store::Store,
    utils::pdf::render_lines,
};
use actix_web::{HttpResponse, web};
use tracing::{error, info};

/// Departments, employees and session totals as a PDF report
#[utoipa::path(
    get,
    path = "/export/pdf",
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn export_pdf(auth: AuthUser, store: web::Data<Store>) -> ApiResult<HttpResponse> {
    let lines = export_lines(
        &store.list_departments(auth.user_id),
        &store.list_employees(auth.user_id),
        &aggregate_sessions(&store.sessions()),
    );

    let bytes = render_lines("Report", 12.0, &lines).map_err(|e| {
        error!(error = %e, user_id = %auth.user_id, "Failed to render report");
        ApiError::Internal("Failed to render document".into())
    })?;
    info!(user_id = %auth.user_id, lines = lines.len(), "Report exported");

    Ok(pdf_response(bytes, "report.pdf"))
}
