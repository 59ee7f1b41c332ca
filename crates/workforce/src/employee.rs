use foodcourtio_shared::{Error, Result, new_id, now_unix};
use serde::Deserialize;
use sqlx::SqliteConnection;
use validator::Validate;

use crate::WorkforceLedger;
use crate::repository::{self, EmployeePatch, FindEmployee, map_phone_conflict};
use crate::types::{Employee, EmployeeRole};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEmployeeInput {
    pub restaurant_id: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 5, max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    pub role: EmployeeRole,
    pub hourly_wage_minor: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEmployeeInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: Option<EmployeeRole>,
    /// `Some(None)` clears the wage.
    pub hourly_wage_minor: Option<Option<i64>>,
    pub active: Option<bool>,
}

impl WorkforceLedger {
    pub async fn create_employee(&self, input: CreateEmployeeInput) -> Result<Employee> {
        input.validate()?;
        if let Some(wage) = input.hourly_wage_minor
            && wage < 0
        {
            return Err(Error::Validation("hourly wage must be non-negative".into()));
        }

        let input = &input;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db().begin().await.map_err(Error::from)?;
            let employee = create_employee_in_tx(&mut tx, input).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(employee)
        })
        .await
    }

    pub async fn update_employee(
        &self,
        employee_id: &str,
        input: UpdateEmployeeInput,
    ) -> Result<Employee> {
        let input = &input;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db().begin().await.map_err(Error::from)?;
            let employee = update_employee_in_tx(&mut tx, employee_id, input).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(employee)
        })
        .await
    }
}

async fn create_employee_in_tx(
    conn: &mut SqliteConnection,
    input: &CreateEmployeeInput,
) -> Result<Employee> {
    let now = now_unix();
    let employee = Employee {
        id: new_id(),
        restaurant_id: input.restaurant_id.clone(),
        principal_id: None,
        name: input.name.clone(),
        phone: input.phone.clone(),
        email: input.email.clone(),
        role: input.role,
        hourly_wage_minor: input.hourly_wage_minor,
        active: true,
        created_at: now,
        updated_at: now,
    };

    repository::insert_employee(&mut *conn, &employee)
        .await
        .map_err(map_phone_conflict)?;

    Ok(employee)
}

async fn update_employee_in_tx(
    conn: &mut SqliteConnection,
    employee_id: &str,
    input: &UpdateEmployeeInput,
) -> Result<Employee> {
    let existing = repository::find_employee(&mut *conn, FindEmployee::Id(employee_id.to_owned()))
        .await?
        .ok_or_else(|| Error::NotFound(format!("employee {employee_id}")))?;

    repository::update_employee(
        &mut *conn,
        &existing.id,
        EmployeePatch {
            name: input.name.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            role: input.role,
            hourly_wage_minor: input.hourly_wage_minor,
            active: input.active,
        },
    )
    .await
    .map_err(map_phone_conflict)?;

    repository::find_employee(&mut *conn, FindEmployee::Id(existing.id.clone()))
        .await?
        .ok_or_else(|| Error::NotFound(format!("employee {employee_id}")))
}
