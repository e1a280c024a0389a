use crate::{auth::auth::AuthUser, error::ApiResult, model::department::Department, store::Store};
use actix_web::{HttpResponse, web};
use tracing::info;

/// Create a department in the caller's scope
#[utoipa::path(
    post,
    path = "/departments",
    request_body = Department,
    responses(
        (status = 200, description = "Department created", body = Department),
        (status = 400, description = "Department already exists", body = Object, example = json!({
            "detail": "Department already exists", "code": "ALREADY_EXISTS"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn create_department(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<Department>,
) -> ApiResult<HttpResponse> {
    let dept = store.add_department(auth.user_id, payload.into_inner())?;
    info!(user_id = %auth.user_id, department_id = %dept.id, "Department created");
    Ok(HttpResponse::Ok().json(dept))
}

/// List the caller's departments
#[utoipa::path(
    get,
    path = "/departments",
    responses(
        (status = 200, description = "Departments owned by the caller", body = [Department]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn list_departments(auth: AuthUser, store: web::Data<Store>) -> HttpResponse {
    HttpResponse::Ok().json(store.list_departments(auth.user_id))
}
