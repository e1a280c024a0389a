use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "emp-001",
    "name": "John Doe",
    "department_id": "ops"
}))]
pub struct Employee {
    #[schema(example = "emp-001")]
    pub id: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "ops")]
    pub department_id: String,
}

/// An employee together with the user that created it.
#[derive(Debug, Clone)]
pub struct OwnedEmployee {
    pub owner: UserId,
    pub employee: Employee,
}
