mod employee;
mod invite;
mod payroll;
pub mod repository;
mod shift;
mod sweeper;
mod types;

use sqlx::SqlitePool;

pub use employee::{CreateEmployeeInput, UpdateEmployeeInput};
pub use invite::{ConsumeInviteInput, CreateInviteInput};
pub use payroll::{PayrollLine, payroll_rollup};
pub use shift::{ScheduleShiftInput, compute_shift_pay};
pub use sweeper::{MissedShiftSweeper, ShiftReminder};
pub use types::{Employee, EmployeeRole, Invite, InviteStatus, Shift, ShiftStatus};

/// Owns employees, shifts and invite tokens; the authoritative timekeeping
/// ledger payroll reads from.
#[derive(Clone)]
pub struct WorkforceLedger {
    write_db: SqlitePool,
}

impl WorkforceLedger {
    pub fn new(write_db: SqlitePool) -> Self {
        Self { write_db }
    }

    pub(crate) fn write_db(&self) -> &SqlitePool {
        &self.write_db
    }
}
