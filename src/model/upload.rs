use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

pub type Record = Map<String, Value>;

/// A parsed spreadsheet. Column order follows the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Xlsx,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({"columns": ["month", "revenue"], "rows": 12}))]
pub struct UploadResponse {
    pub columns: Vec<String>,
    pub rows: usize,
}
