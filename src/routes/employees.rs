use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use foodcourtio_identity::{Action, ResourceScope};
use foodcourtio_shared::Error;
use foodcourtio_workforce::repository::{self, FindEmployee};
use foodcourtio_workforce::{
    ConsumeInviteInput, CreateEmployeeInput, CreateInviteInput, Employee, Invite, PayrollLine,
    ScheduleShiftInput, Shift, UpdateEmployeeInput, payroll_rollup,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::CurrentPrincipal;
use crate::routes::AppState;

async fn load_employee(state: &AppState, id: &str) -> Result<Employee, ApiError> {
    let mut conn = state.read_db.acquire().await.map_err(Error::from)?;

    Ok(
        repository::find_employee(&mut conn, FindEmployee::Id(id.to_owned()))
            .await?
            .ok_or_else(|| Error::NotFound(format!("employee {id}")))?,
    )
}

async fn caller_employee(state: &AppState, principal_id: &str) -> Result<Employee, ApiError> {
    let mut conn = state.read_db.acquire().await.map_err(Error::from)?;

    Ok(repository::find_employee(
        &mut conn,
        FindEmployee::ActiveByPrincipal(principal_id.to_owned()),
    )
    .await?
    .ok_or_else(|| Error::NotFound("employee for caller".to_owned()))?)
}

pub async fn create(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(input): Json<CreateEmployeeInput>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    state
        .access
        .authorize(
            &principal,
            Action::ManageEmployees,
            &ResourceScope::restaurant(&input.restaurant_id),
        )
        .await?;

    let employee = state.workforce.create_employee(input).await?;

    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    Json(input): Json<UpdateEmployeeInput>,
) -> Result<Json<Employee>, ApiError> {
    let employee = load_employee(&state, &id).await?;

    state
        .access
        .authorize(
            &principal,
            Action::ManageEmployees,
            &ResourceScope::restaurant(&employee.restaurant_id),
        )
        .await?;

    let employee = state.workforce.update_employee(&id, input).await?;

    Ok(Json(employee))
}

pub async fn create_invite(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(mut input): Json<CreateInviteInput>,
) -> Result<(StatusCode, Json<Invite>), ApiError> {
    state
        .access
        .authorize(
            &principal,
            Action::CreateInvite,
            &ResourceScope::restaurant(&input.restaurant_id),
        )
        .await?;

    input.created_by_principal_id = principal.id.clone();
    let invite = state.workforce.create_invite(input).await?;

    Ok((StatusCode::CREATED, Json(invite)))
}

pub async fn consume_invite(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(input): Json<ConsumeInviteInput>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    state
        .access
        .authorize(&principal, Action::ConsumeInvite, &ResourceScope::default())
        .await?;

    let employee = state.workforce.consume_invite(&principal, input).await?;

    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn clock_in(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<(StatusCode, Json<Shift>), ApiError> {
    let employee = caller_employee(&state, &principal.id).await?;

    state
        .access
        .authorize(
            &principal,
            Action::ClockInOut,
            &ResourceScope {
                restaurant_id: Some(employee.restaurant_id.clone()),
                employee_principal_id: Some(principal.id.clone()),
                ..ResourceScope::default()
            },
        )
        .await?;

    let shift = state.workforce.clock_in(&principal.id).await?;

    Ok((StatusCode::CREATED, Json(shift)))
}

pub async fn clock_out(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Json<Shift>, ApiError> {
    let employee = caller_employee(&state, &principal.id).await?;

    state
        .access
        .authorize(
            &principal,
            Action::ClockInOut,
            &ResourceScope {
                restaurant_id: Some(employee.restaurant_id.clone()),
                employee_principal_id: Some(principal.id.clone()),
                ..ResourceScope::default()
            },
        )
        .await?;

    let shift = state.workforce.clock_out(&principal.id).await?;

    Ok(Json(shift))
}

pub async fn schedule_shift(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(input): Json<ScheduleShiftInput>,
) -> Result<(StatusCode, Json<Shift>), ApiError> {
    let employee = load_employee(&state, &input.employee_id).await?;

    state
        .access
        .authorize(
            &principal,
            Action::ManageEmployees,
            &ResourceScope::restaurant(&employee.restaurant_id),
        )
        .await?;

    let shift = state.workforce.schedule_shift(input).await?;

    Ok((StatusCode::CREATED, Json(shift)))
}

#[derive(Deserialize)]
pub struct PeriodQuery {
    pub restaurant_id: String,
    pub from: i64,
    pub to: i64,
}

pub async fn list_shifts(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<Shift>>, ApiError> {
    state
        .access
        .authorize(
            &principal,
            Action::ManageEmployees,
            &ResourceScope::restaurant(&query.restaurant_id),
        )
        .await?;

    let shifts = repository::shifts_for_restaurant(
        &state.read_db,
        &query.restaurant_id,
        query.from,
        query.to,
    )
    .await?;

    Ok(Json(shifts))
}

pub async fn payroll(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<PayrollLine>>, ApiError> {
    state
        .access
        .authorize(
            &principal,
            Action::ManageEmployees,
            &ResourceScope::restaurant(&query.restaurant_id),
        )
        .await?;

    let lines = payroll_rollup(
        &state.read_db,
        &query.restaurant_id,
        query.from,
        query.to,
    )
    .await?;

    Ok(Json(lines))
}
