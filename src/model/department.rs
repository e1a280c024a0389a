use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"id": "ops", "name": "Operations"}))]
pub struct Department {
    pub id: String,
    pub name: String,
}

/// Departments are unique per owner, so the same id may exist under two users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepartmentKey {
    pub user_id: UserId,
    pub department_id: String,
}

impl DepartmentKey {
    pub fn new(user_id: UserId, department_id: impl Into<String>) -> Self {
        Self {
            user_id,
            department_id: department_id.into(),
        }
    }
}
