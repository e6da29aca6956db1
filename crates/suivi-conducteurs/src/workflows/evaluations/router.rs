use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;

use super::domain::{EvaluationId, EvaluationTypeId, NewCriterion, NewDriver};
use super::repository::EvaluationRepository;
use super::service::{
    EvaluationFilter, EvaluationService, EvaluationServiceError, NoteCheckRequest,
};
use super::submission::EvaluationSubmission;
use crate::error::AppError;
use crate::store::UnitOfWork;
use crate::workflows::evaluators::{EvaluatorRepository, ServiceRepository};

#[derive(Debug, Deserialize)]
pub(crate) struct NamedRequest {
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CriterionRequest {
    pub(crate) name: String,
    pub(crate) min: i32,
    pub(crate) max: i32,
    #[serde(default = "default_active")]
    pub(crate) active: bool,
}

fn default_active() -> bool {
    true
}

/// Router builder exposing evaluation entry, review and catalogue upkeep.
pub fn evaluation_router<S>(evaluations: Arc<EvaluationService<S>>) -> Router
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    Router::new()
        .route(
            "/api/v1/evaluations",
            get(list_handler::<S>).post(submit_handler::<S>),
        )
        .route("/api/v1/evaluations/form", get(form_handler::<S>))
        .route(
            "/api/v1/evaluations/validate-note",
            post(check_note_handler::<S>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id",
            get(detail_handler::<S>).delete(delete_handler::<S>),
        )
        .route(
            "/api/v1/evaluation-types",
            post(create_evaluation_type_handler::<S>),
        )
        .route(
            "/api/v1/evaluation-types/:type_id/criteria",
            get(criteria_handler::<S>).post(create_criterion_handler::<S>),
        )
        .route("/api/v1/companies", post(create_company_handler::<S>))
        .route("/api/v1/sites", post(create_site_handler::<S>))
        .route("/api/v1/drivers", post(create_driver_handler::<S>))
        .route("/api/v1/dashboard", get(dashboard_handler::<S>))
        .with_state(evaluations)
}

fn respond<T: serde::Serialize>(
    status: StatusCode,
    result: Result<T, EvaluationServiceError>,
) -> Result<Response, AppError> {
    let value = result?;
    Ok((status, Json(value)).into_response())
}

pub(crate) async fn submit_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    payload: Result<Json<EvaluationSubmission>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    let Json(payload) = payload?;
    let evaluation = evaluations.submit(payload)?;
    Ok((StatusCode::CREATED, Json(evaluation)).into_response())
}

pub(crate) async fn list_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    Query(filter): Query<EvaluationFilter>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    respond(StatusCode::OK, evaluations.list(filter))
}

pub(crate) async fn form_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    respond(StatusCode::OK, evaluations.form_choices())
}

pub(crate) async fn check_note_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    payload: Result<Json<NoteCheckRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    let Json(payload) = payload?;
    respond(StatusCode::OK, evaluations.check_note(payload))
}

pub(crate) async fn detail_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    Path(evaluation_id): Path<u64>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    respond(StatusCode::OK, evaluations.detail(EvaluationId(evaluation_id)))
}

pub(crate) async fn delete_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    Path(evaluation_id): Path<u64>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    respond(StatusCode::OK, evaluations.delete(EvaluationId(evaluation_id)))
}

pub(crate) async fn criteria_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    Path(type_id): Path<u64>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    respond(
        StatusCode::OK,
        evaluations.criteria_for_type(EvaluationTypeId(type_id)),
    )
}

pub(crate) async fn create_criterion_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    Path(type_id): Path<u64>,
    payload: Result<Json<CriterionRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    let Json(payload) = payload?;
    let criterion = NewCriterion {
        evaluation_type_id: EvaluationTypeId(type_id),
        name: payload.name,
        min: payload.min,
        max: payload.max,
        active: payload.active,
    };
    respond(StatusCode::CREATED, evaluations.create_criterion(criterion))
}

pub(crate) async fn create_evaluation_type_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    payload: Result<Json<NamedRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    let Json(payload) = payload?;
    respond(
        StatusCode::CREATED,
        evaluations.create_evaluation_type(&payload.name),
    )
}

pub(crate) async fn create_company_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    payload: Result<Json<NamedRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    let Json(payload) = payload?;
    respond(StatusCode::CREATED, evaluations.create_company(&payload.name))
}

pub(crate) async fn create_site_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    payload: Result<Json<NamedRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    let Json(payload) = payload?;
    respond(StatusCode::CREATED, evaluations.create_site(&payload.name))
}

pub(crate) async fn create_driver_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
    payload: Result<Json<NewDriver>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    let Json(payload) = payload?;
    respond(StatusCode::CREATED, evaluations.create_driver(payload))
}

pub(crate) async fn dashboard_handler<S>(
    State(evaluations): State<Arc<EvaluationService<S>>>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    let today = Local::now().date_naive();
    respond(StatusCode::OK, evaluations.dashboard(today))
}
