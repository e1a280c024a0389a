//! Process-wide in-memory entity store.
//!
//! Every collection sits behind a single `RwLock`; each check-then-insert runs
//! under one write guard, so duplicate detection cannot race.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{ApiError, ApiResult};
use crate::model::cash::CashTransaction;
use crate::model::department::{Department, DepartmentKey};
use crate::model::employee::{Employee, OwnedEmployee};
use crate::model::session::Session;
use crate::model::upload::{Record, UploadedTable};
use crate::model::user::{User, UserId, UserPatch};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    departments: HashMap<DepartmentKey, Department>,
    /// Keyed by employee id alone: ids are unique across all users.
    employees: HashMap<String, OwnedEmployee>,
    sessions: Vec<Session>,
    cash: HashMap<UserId, Vec<CashTransaction>>,
    upload: Option<UploadedTable>,
}

#[derive(Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ---------- users ----------

    pub fn register_user(
        &self,
        email: &str,
        username: Option<&str>,
        hashed_password: String,
    ) -> ApiResult<User> {
        let email = normalize_email(email);
        let mut tables = self.write();

        if tables.users.values().any(|u| u.email == email) {
            return Err(ApiError::AlreadyExists("REGISTER_USER_ALREADY_EXISTS".into()));
        }
        if let Some(name) = username {
            if tables
                .users
                .values()
                .any(|u| u.username.as_deref() == Some(name))
            {
                return Err(ApiError::AlreadyExists("Username already taken".into()));
            }
        }

        let user = User {
            id: UserId::new(),
            email,
            username: username.map(str::to_string),
            hashed_password,
            is_active: true,
            is_superuser: false,
            is_verified: false,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn user(&self, id: UserId) -> Option<User> {
        self.read().users.get(&id).cloned()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let email = normalize_email(email);
        self.read().users.values().find(|u| u.email == email).cloned()
    }

    /// Looks a user up by email first, then by username.
    pub fn find_user_by_login(&self, login: &str) -> Option<User> {
        self.find_user_by_email(login).or_else(|| {
            self.read()
                .users
                .values()
                .find(|u| u.username.as_deref() == Some(login.trim()))
                .cloned()
        })
    }

    pub fn mark_verified(&self, id: UserId) -> ApiResult<User> {
        let mut tables = self.write();
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
        user.is_verified = true;
        Ok(user.clone())
    }

    pub fn update_user(&self, id: UserId, patch: UserPatch) -> ApiResult<User> {
        let mut tables = self.write();
        if !tables.users.contains_key(&id) {
            return Err(ApiError::NotFound("User not found".into()));
        }

        let email = patch.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if tables.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(ApiError::AlreadyExists(
                    "UPDATE_USER_EMAIL_ALREADY_EXISTS".into(),
                ));
            }
        }
        if let Some(name) = patch.username.as_deref() {
            if tables
                .users
                .values()
                .any(|u| u.id != id && u.username.as_deref() == Some(name))
            {
                return Err(ApiError::AlreadyExists("Username already taken".into()));
            }
        }

        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(username) = patch.username {
            user.username = Some(username);
        }
        if let Some(hashed) = patch.hashed_password {
            user.hashed_password = hashed;
        }
        if let Some(active) = patch.is_active {
            user.is_active = active;
        }
        if let Some(superuser) = patch.is_superuser {
            user.is_superuser = superuser;
        }
        if let Some(verified) = patch.is_verified {
            user.is_verified = verified;
        }
        Ok(user.clone())
    }

    /// Removes the account together with every record it owns. Sessions are shared and stay.
    pub fn delete_user(&self, id: UserId) -> ApiResult<()> {
        let mut tables = self.write();
        if tables.users.remove(&id).is_none() {
            return Err(ApiError::NotFound("User not found".into()));
        }
        tables.departments.retain(|key, _| key.user_id != id);
        tables.employees.retain(|_, owned| owned.owner != id);
        tables.cash.remove(&id);
        Ok(())
    }

    // ---------- departments ----------

    pub fn add_department(&self, user: UserId, dept: Department) -> ApiResult<Department> {
        let key = DepartmentKey::new(user, dept.id.clone());
        let mut tables = self.write();
        if tables.departments.contains_key(&key) {
            return Err(ApiError::AlreadyExists("Department already exists".into()));
        }
        tables.departments.insert(key, dept.clone());
        Ok(dept)
    }

    pub fn list_departments(&self, user: UserId) -> Vec<Department> {
        let tables = self.read();
        let mut departments: Vec<Department> = tables
            .departments
            .iter()
            .filter(|(key, _)| key.user_id == user)
            .map(|(_, dept)| dept.clone())
            .collect();
        departments.sort_by(|a, b| a.id.cmp(&b.id));
        departments
    }

    // ---------- employees ----------

    pub fn add_employee(&self, user: UserId, emp: Employee) -> ApiResult<Employee> {
        let mut tables = self.write();
        if tables.employees.contains_key(&emp.id) {
            return Err(ApiError::AlreadyExists("Employee already exists".into()));
        }
        let department = DepartmentKey::new(user, emp.department_id.clone());
        if !tables.departments.contains_key(&department) {
            return Err(ApiError::NotFound("Department not found".into()));
        }
        tables.employees.insert(
            emp.id.clone(),
            OwnedEmployee {
                owner: user,
                employee: emp.clone(),
            },
        );
        Ok(emp)
    }

    pub fn list_employees(&self, user: UserId) -> Vec<Employee> {
        let tables = self.read();
        let mut employees: Vec<Employee> = tables
            .employees
            .values()
            .filter(|owned| owned.owner == user)
            .map(|owned| owned.employee.clone())
            .collect();
        employees.sort_by(|a, b| a.id.cmp(&b.id));
        employees
    }

    // ---------- sessions ----------

    pub fn add_session(&self, session: Session) -> ApiResult<Session> {
        let mut tables = self.write();
        if !tables.employees.contains_key(&session.employee_id) {
            return Err(ApiError::NotFound("Employee not found".into()));
        }
        tables.sessions.push(session.clone());
        Ok(session)
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.read().sessions.clone()
    }

    // ---------- cash ----------

    /// Takes an already validated transaction and appends it to the user's ledger.
    pub fn add_cash_transaction(&self, user: UserId, txn: CashTransaction) -> CashTransaction {
        self.write()
            .cash
            .entry(user)
            .or_default()
            .push(txn.clone());
        txn
    }

    pub fn cash_transactions(&self, user: UserId) -> Vec<CashTransaction> {
        self.read().cash.get(&user).cloned().unwrap_or_default()
    }

    // ---------- uploaded dataset ----------

    pub fn replace_upload(&self, table: UploadedTable) {
        self.write().upload = Some(table);
    }

    pub fn uploaded_rows(&self) -> Vec<Record> {
        self.read()
            .upload
            .as_ref()
            .map(|table| table.rows.clone())
            .unwrap_or_default()
    }
}
