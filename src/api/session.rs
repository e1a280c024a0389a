use std::collections::BTreeMap;

use crate::{
    aggregate::aggregate_sessions,
    auth::auth::AuthUser,
    error::ApiResult,
    model::session::{Session, SessionTotals},
    store::Store,
};
use actix_web::{HttpResponse, web};
use tracing::debug;

/// Record a session for an existing employee
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = Session,
    responses(
        (status = 200, description = "Session recorded", body = Session),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found", "code": "NOT_FOUND"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Session"
)]
pub async fn create_session(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<Session>,
) -> ApiResult<HttpResponse> {
    let session = store.add_session(payload.into_inner())?;
    debug!(user_id = %auth.user_id, employee_id = %session.employee_id, "Session recorded");
    Ok(HttpResponse::Ok().json(session))
}

/// Expected and actual totals per employee, across all sessions
#[utoipa::path(
    get,
    path = "/sessions/aggregate",
    responses(
        (status = 200, description = "Totals keyed by employee id", body = Object, example = json!({
            "emp-001": {"expected_total": 16, "actual_total": 15}
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Session"
)]
pub async fn session_aggregate(_auth: AuthUser, store: web::Data<Store>) -> HttpResponse {
    let totals: BTreeMap<String, SessionTotals> = aggregate_sessions(&store.sessions());
    HttpResponse::Ok().json(totals)
}
