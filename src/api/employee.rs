use crate::{auth::auth::AuthUser, error::ApiResult, model::employee::Employee, store::Store};
use actix_web::{HttpResponse, web};
use tracing::info;

/// Create Employee
#[utoipa::path(
    post,
    path = "/employees",
    request_body = Employee,
    responses(
        (status = 200, description = "Employee created", body = Employee),
        (status = 400, description = "Employee already exists", body = Object, example = json!({
            "detail": "Employee already exists", "code": "ALREADY_EXISTS"
        })),
        (status = 404, description = "Department not found", body = Object, example = json!({
            "detail": "Department not found", "code": "NOT_FOUND"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<Employee>,
) -> ApiResult<HttpResponse> {
    let emp = store.add_employee(auth.user_id, payload.into_inner())?;
    info!(user_id = %auth.user_id, employee_id = %emp.id, "Employee created");
    Ok(HttpResponse::Ok().json(emp))
}

/// List employees created by the caller
#[utoipa::path(
    get,
    path = "/employees",
    responses(
        (status = 200, description = "Employee list", body = [Employee]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(auth: AuthUser, store: web::Data<Store>) -> HttpResponse {
    HttpResponse::Ok().json(store.list_employees(auth.user_id))
}
