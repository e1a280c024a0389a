use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One attendance-like record: how many were expected and how many showed up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "s-1",
    "employee_id": "emp-001",
    "expected": 8,
    "actual": 7
}))]
pub struct Session {
    pub id: String,
    pub employee_id: String,
    pub expected: i64,
    pub actual: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SessionTotals {
    #[schema(example = 16)]
    pub expected_total: i64,
    #[schema(example = 15)]
    pub actual_total: i64,
}
