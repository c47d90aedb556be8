use serde::{Deserialize, Serialize};

use super::{department::Department, role::Role};

/// Roster entry owned by the identity side of the system; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department: Department,
}
