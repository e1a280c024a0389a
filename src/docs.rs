use crate::model::cash::{CashFlow, CashSummary, CashTransaction, NewCashTransaction};
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::session::{Session, SessionTotals};
use crate::model::upload::UploadResponse;
use crate::model::user::UserRead;
use crate::models::{
    DetailResponse, LoginReqDto, LoginResponse, RegisterReq, RequestVerifyReq, UserUpdate,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Business Data API",
        version = "1.0.0",
        description = r#"
## Business Data Tracking

Multi-tenant API for recording departments, employees, work sessions and cash
transactions, with aggregated views and PDF exports.

### Key Features
- **Departments and Employees**: per-user registries
- **Sessions**: expected vs. actual units, aggregated per employee
- **Cash**: in/out ledger with a derived financial summary
- **Reports**: PDF export of the registry and of the cash summary
- **Upload**: CSV or XLSX dataset upload

### Security
Protected endpoints accept a **JWT Bearer** token or the `auth` cookie set at login.
`/users/{id}` routes are restricted to superusers.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::request_verify,
        crate::auth::handlers::verify,
        crate::auth::handlers::login,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,
        crate::auth::handlers::update_me,
        crate::auth::handlers::get_user,
        crate::auth::handlers::update_user,
        crate::auth::handlers::delete_user,

        crate::api::department::create_department,
        crate::api::department::list_departments,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,

        crate::api::session::create_session,
        crate::api::session::session_aggregate,

        crate::api::cash::add_transaction,
        crate::api::cash::summary,
        crate::api::cash::summary_pdf,

        crate::api::report::export_pdf,

        crate::api::upload::upload_data,
        crate::api::upload::uploaded_data
    ),
    components(
        schemas(
            RegisterReq,
            RequestVerifyReq,
            LoginReqDto,
            LoginResponse,
            DetailResponse,
            UserRead,
            UserUpdate,
            Department,
            Employee,
            Session,
            SessionTotals,
            CashFlow,
            NewCashTransaction,
            CashTransaction,
            CashSummary,
            UploadResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, verification and login"),
        (name = "Users", description = "Profile and superuser account management"),
        (name = "Department", description = "Department registry"),
        (name = "Employee", description = "Employee registry"),
        (name = "Session", description = "Work sessions and aggregates"),
        (name = "Cash", description = "Cash ledger and summary"),
        (name = "Report", description = "PDF exports"),
        (name = "Upload", description = "Dataset upload"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/register",
            "/auth/verify",
            "/auth/jwt/login",
            "/users/me",
            "/users/{id}",
            "/departments",
            "/employees",
            "/sessions",
            "/sessions/aggregate",
            "/cash/transaction",
            "/cash/summary",
            "/cash/summary/pdf",
            "/export/pdf",
            "/upload-data",
            "/uploaded-data",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
