use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
pub enum EmployeeRole {
    Manager,
    Cashier,
    Cook,
    Waiter,
    Cleaner,
}

#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
pub enum ShiftStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

impl ShiftStatus {
    /// Non-terminal shifts are the ones the overlap rule applies to.
    pub fn is_open(self) -> bool {
        matches!(self, ShiftStatus::Scheduled | ShiftStatus::Active)
    }
}

#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
pub enum InviteStatus {
    Active,
    Consumed,
    Expired,
    Revoked,
}

#[derive(Debug, Clone, Serialize)]
pub struct Employee {
    pub id: String,
    pub restaurant_id: String,
    pub principal_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: EmployeeRole,
    pub hourly_wage_minor: Option<i64>,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Shift {
    pub id: String,
    pub employee_id: String,
    pub scheduled_start: i64,
    pub scheduled_end: i64,
    pub actual_start: Option<i64>,
    pub actual_end: Option<i64>,
    pub break_minutes: i64,
    pub status: ShiftStatus,
    pub notes: Option<String>,
    pub pay_minor: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Invite {
    pub id: String,
    pub token: String,
    pub restaurant_id: String,
    pub granted_role: EmployeeRole,
    pub hourly_wage_minor: Option<i64>,
    pub expires_at: i64,
    pub max_uses: i64,
    pub used_count: i64,
    pub status: InviteStatus,
    pub created_by_principal_id: String,
    pub created_at: i64,
}
