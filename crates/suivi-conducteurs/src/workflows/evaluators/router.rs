use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use super::domain::{EvaluatorView, Service};
use super::repository::{EvaluatorRepository, ServiceRepository};
use super::service::EvaluatorDirectory;
use crate::error::AppError;
use crate::store::UnitOfWork;
use crate::workflows::groups::{DirectoryError, UserId};

/// Router builder exposing evaluator and service listings.
pub fn evaluator_router<S>(evaluators: Arc<EvaluatorDirectory<S>>) -> Router
where
    S: UnitOfWork + 'static,
    S::Tx: ServiceRepository + EvaluatorRepository,
{
    Router::new()
        .route("/api/v1/evaluators", get(list_handler::<S>))
        .route("/api/v1/services", get(services_handler::<S>))
        .route(
            "/api/v1/users/:user_id/evaluator",
            get(user_evaluator_handler::<S>),
        )
        .with_state(evaluators)
}

pub(crate) async fn list_handler<S>(
    State(evaluators): State<Arc<EvaluatorDirectory<S>>>,
) -> Result<Json<Vec<EvaluatorView>>, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: ServiceRepository + EvaluatorRepository,
{
    Ok(Json(evaluators.list()?))
}

pub(crate) async fn services_handler<S>(
    State(evaluators): State<Arc<EvaluatorDirectory<S>>>,
) -> Result<Json<Vec<Service>>, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: ServiceRepository + EvaluatorRepository,
{
    Ok(Json(evaluators.services()?))
}

pub(crate) async fn user_evaluator_handler<S>(
    State(evaluators): State<Arc<EvaluatorDirectory<S>>>,
    Path(user_id): Path<u64>,
) -> Result<Json<EvaluatorView>, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: ServiceRepository + EvaluatorRepository,
{
    let view = evaluators
        .for_user(UserId(user_id))?
        .ok_or(DirectoryError::not_found("evaluator of user", user_id))?;
    Ok(Json(view))
}
