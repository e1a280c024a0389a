use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::upload::{Record, UploadResponse},
    store::Store,
    utils::spreadsheet::parse_table,
    validation::upload_format,
};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::TryStreamExt;
use tracing::{info, warn};

const FILE_FIELD: &str = "file";

fn malformed(e: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("Malformed multipart body: {e}"))
}

/// Reads the `file` field, returning its file name and contents. Files over `limit` bytes are refused.
async fn read_file_field(
    payload: &mut Multipart,
    limit: usize,
) -> ApiResult<Option<(String, Vec<u8>)>> {
    let mut upload = None;

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let is_file_field = field.name() == Some(FILE_FIELD);

        match filename {
            Some(filename) if is_file_field && upload.is_none() => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.try_next().await.map_err(malformed)? {
                    if bytes.len() + chunk.len() > limit {
                        return Err(ApiError::BadRequest(format!(
                            "File too large. The limit is {limit} bytes."
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                upload = Some((filename, bytes));
            }
            _ => while field.try_next().await.map_err(malformed)?.is_some() {},
        }
    }

    Ok(upload)
}

/// Upload a CSV or Excel file, replacing the previously uploaded dataset
#[utoipa::path(
    post,
    path = "/upload-data",
    request_body(content = String, content_type = "multipart/form-data", description = "Form field `file` holding a .csv or .xlsx file"),
    responses(
        (status = 200, description = "Dataset accepted", body = UploadResponse),
        (status = 400, description = "Unsupported, oversized, empty or unparsable file", body = Object, example = json!({
            "detail": "Uploaded file contains no data.", "code": "BAD_REQUEST"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Upload"
)]
pub async fn upload_data(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    mut payload: Multipart,
) -> ApiResult<HttpResponse> {
    let (filename, bytes) = read_file_field(&mut payload, config.max_upload_bytes)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No file uploaded.".into()))?;

    let format = upload_format(&filename)?;

    let table = parse_table(format, &bytes).map_err(|e| {
        warn!(error = %e, filename = %filename, "Upload could not be parsed");
        ApiError::BadRequest("Failed to parse file. Please check your file format.".into())
    })?;

    if table.rows.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file contains no data.".into()));
    }

    let response = UploadResponse {
        columns: table.columns.clone(),
        rows: table.rows.len(),
    };
    store.replace_upload(table);
    info!(user_id = %auth.user_id, filename = %filename, rows = response.rows, "Dataset uploaded");

    Ok(HttpResponse::Ok().json(response))
}

/// Rows of the most recent upload, or an empty list
#[utoipa::path(
    get,
    path = "/uploaded-data",
    responses(
        (status = 200, description = "Uploaded rows", body = Object, example = json!([
            {"month": "Jan", "revenue": 100}
        ]))
    ),
    tag = "Upload"
)]
pub async fn uploaded_data(store: web::Data<Store>) -> HttpResponse {
    let rows: Vec<Record> = store.uploaded_rows();
    HttpResponse::Ok().json(rows)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{TestApp, init_app};
    use crate::config::Config;
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    const BOUNDARY: &str = "----bizdata-test-boundary";

    fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload(app: &TestApp, token: &str, field: &str, filename: &str, content: &[u8]) -> test::TestRequest {
        app.post("/upload-data", token)
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(field, filename, content))
    }

    #[actix_web::test]
    async fn csv_upload_replaces_the_dataset() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let token = app.login_as("jane@example.com");

        let resp = test::call_service(
            &svc,
            upload(&app, &token, "file", "sales.csv", b"month,revenue\nJan,100\nFeb,250\n").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"columns": ["month", "revenue"], "rows": 2}));

        // public endpoint, no token
        let resp = test::call_service(&svc, test::TestRequest::get().uri("/uploaded-data").to_request()).await;
        let rows: Value = test::read_body_json(resp).await;
        assert_eq!(
            rows,
            json!([{"month": "Jan", "revenue": 100}, {"month": "Feb", "revenue": 250}])
        );

        let resp = test::call_service(
            &svc,
            upload(&app, &token, "file", "costs.csv", b"item\nrent\n").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = test::call_service(&svc, test::TestRequest::get().uri("/uploaded-data").to_request()).await;
        let rows: Value = test::read_body_json(resp).await;
        assert_eq!(rows, json!([{"item": "rent"}]));
    }

    #[actix_web::test]
    async fn oversized_file_is_rejected_and_keeps_previous_dataset() {
        let app = TestApp::with_config(Config {
            max_upload_bytes: 64,
            ..Config::for_tests()
        });
        let svc = init_app!(app);
        let token = app.login_as("jane@example.com");

        let resp = test::call_service(
            &svc,
            upload(&app, &token, "file", "small.csv", b"item\nrent\n").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let mut big = b"item\n".to_vec();
        big.extend(std::iter::repeat_n(b"rent\n".as_slice(), 50).flatten());
        let resp = test::call_service(&svc, upload(&app, &token, "file", "big.csv", &big).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["detail"].as_str().unwrap().starts_with("File too large"));

        assert_eq!(app.store.uploaded_rows().len(), 1);
    }

    #[actix_web::test]
    async fn nothing_uploaded_yet_is_an_empty_list() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let resp = test::call_service(&svc, test::TestRequest::get().uri("/uploaded-data").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let rows: Value = test::read_body_json(resp).await;
        assert_eq!(rows, json!([]));
    }

    #[actix_web::test]
    async fn unsupported_extension_is_rejected() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let token = app.login_as("jane@example.com");

        let resp = test::call_service(&svc, upload(&app, &token, "file", "test.txt", b"bad data").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "UNSUPPORTED_MEDIA_TYPE");
    }

    #[actix_web::test]
    async fn empty_or_broken_files_are_bad_requests() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let token = app.login_as("jane@example.com");

        for (name, content) in [
            ("empty.csv", &b""[..]),
            ("header.csv", &b"a,b\n"[..]),
            ("ragged.csv", &b"a,b\n1,2\n3,4,5\n"[..]),
            ("book.xlsx", &b"not a workbook"[..]),
        ] {
            let resp = test::call_service(&svc, upload(&app, &token, "file", name, content).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{name}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["code"], "BAD_REQUEST", "{name}");
        }

        let resp = test::call_service(&svc, test::TestRequest::get().uri("/uploaded-data").to_request()).await;
        let rows: Value = test::read_body_json(resp).await;
        assert_eq!(rows, json!([]));
    }

    #[actix_web::test]
    async fn missing_file_field_is_a_bad_request() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let token = app.login_as("jane@example.com");

        let resp = test::call_service(&svc, upload(&app, &token, "other", "data.csv", b"a\n1\n").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn upload_requires_authentication() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let resp = test::call_service(
            &svc,
            test::TestRequest::post()
                .uri("/upload-data")
                .insert_header(("content-type", format!("multipart/form-data; boundary={BOUNDARY}")))
                .set_payload(multipart_body("file", "data.csv", b"a\n1\n"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
