use crate::config::{Config, SolverOptions};
use crate::data::{Assignment, ProblemInstance, SolverResult, Timetable};
use crate::error::SolveError;
use crate::{export, solver};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderName, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinError;

type ApiError = (StatusCode, String);

/// Carries the [`SolveStatus`] of a CSV export, since an infeasible or
/// undecided export has no rows to tell the two apart.
pub const TIMETABLE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-timetable-status");

/// Shared, read-only handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    solver: SolverOptions,
    solve_timeout: Duration,
}

impl AppState {
    pub fn new(solver: SolverOptions, solve_timeout: Duration) -> Self {
        Self {
            solver,
            solve_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.solver.clone(), config.server.solve_timeout())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Solved,
    Infeasible,
    /// The deadline passed before the solver decided.
    Unknown,
}

impl SolveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Solved => "solved",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unknown => "unknown",
        }
    }
}

/// One row of the timetable, with one-based indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDto {
    pub course: usize,
    pub teacher: usize,
    pub slot: usize,
}

impl From<&Assignment> for AssignmentDto {
    fn from(a: &Assignment) -> Self {
        Self {
            course: a.course + 1,
            teacher: a.teacher + 1,
            slot: a.slot + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    pub status: SolveStatus,
    pub assignments: Vec<AssignmentDto>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/timetable/solve", post(solve_handler))
        .route("/v1/timetable/export", post(export_handler))
        .with_state(state)
}

pub async fn run_server(config: &Config) -> std::io::Result<()> {
    let app = router(AppState::from_config(config));

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr.as_str()).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

async fn solve_handler(
    State(state): State<AppState>,
    Json(problem): Json<ProblemInstance>,
) -> Result<Json<SolveResponse>, ApiError> {
    let (status, timetable) = solve_with_deadline(&state, problem).await?;
    Ok(Json(SolveResponse {
        status,
        assignments: timetable.iter().map(AssignmentDto::from).collect(),
    }))
}

async fn export_handler(
    State(state): State<AppState>,
    Json(problem): Json<ProblemInstance>,
) -> Result<impl IntoResponse, ApiError> {
    let (status, timetable) = solve_with_deadline(&state, problem).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (TIMETABLE_STATUS_HEADER, status.as_str()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"timetable.csv\"",
            ),
        ],
        export::to_csv(&timetable),
    ))
}

/// Runs the solver off the async runtime. Infeasible and timed-out solves
/// come back with an empty timetable.
async fn solve_with_deadline(
    state: &AppState,
    problem: ProblemInstance,
) -> Result<(SolveStatus, Timetable), ApiError> {
    // bad input never reaches the blocking pool
    problem
        .validate_within(state.solver.max_variables)
        .map_err(api_error)?;

    let options = state.solver.clone();
    let outcome = run_blocking_with_deadline(state.solve_timeout, move || {
        solver::solve(&problem, &options)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("solve task failed: {e}"),
        )
    })?;

    match outcome {
        Some(Ok(SolverResult::Solved(timetable))) => {
            info!("Solved: {} assignments", timetable.len());
            Ok((SolveStatus::Solved, timetable))
        }
        Some(Ok(SolverResult::Infeasible)) => {
            info!("Infeasible");
            Ok((SolveStatus::Infeasible, Timetable::default()))
        }
        Some(Err(e)) => Err(api_error(e)),
        None => {
            warn!(
                "Solve did not finish within {:.2?}; reporting unknown",
                state.solve_timeout
            );
            Ok((SolveStatus::Unknown, Timetable::default()))
        }
    }
}

/// `Ok(None)` when `deadline` passes first. The job itself cannot be
/// cancelled and keeps running on the blocking pool.
async fn run_blocking_with_deadline<T, F>(deadline: Duration, job: F) -> Result<Option<T>, JoinError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);
    match tokio::time::timeout(deadline, handle).await {
        Ok(joined) => joined.map(Some),
        Err(_) => Ok(None),
    }
}

fn api_error(e: SolveError) -> ApiError {
    let status = match &e {
        SolveError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SolveError::SolverFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("{e}");
    (status, e.to_string())
}
