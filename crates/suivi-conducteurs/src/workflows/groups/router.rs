use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{GroupId, NewPermission, NewUser, PermissionId, UserId, UserUpdate};
use super::repository::DirectoryRepository;
use super::service::{DirectoryError, GroupDirectory};
use crate::error::AppError;
use crate::store::UnitOfWork;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateGroupRequest {
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MembersRequest {
    pub(crate) user_ids: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PermissionsRequest {
    pub(crate) permission_ids: Vec<PermissionId>,
}

/// Router builder exposing account, group and permission management.
pub fn group_router<S>(directory: Arc<GroupDirectory<S>>) -> Router
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    Router::new()
        .route("/api/v1/users", post(create_user_handler::<S>))
        .route("/api/v1/users/:user_id", patch(update_user_handler::<S>))
        .route("/api/v1/users/:user_id/groups", get(user_groups_handler::<S>))
        .route("/api/v1/users/:user_id/profile", get(profile_handler::<S>))
        .route("/api/v1/permissions", post(create_permission_handler::<S>))
        .route("/api/v1/groups", post(create_group_handler::<S>))
        .route(
            "/api/v1/groups/:group_id",
            axum::routing::delete(delete_group_handler::<S>),
        )
        .route(
            "/api/v1/groups/:group_id/members",
            post(add_members_handler::<S>),
        )
        .route(
            "/api/v1/groups/:group_id/members/remove",
            post(remove_members_handler::<S>),
        )
        .route(
            "/api/v1/groups/:group_id/permissions",
            post(grant_permissions_handler::<S>),
        )
        .route(
            "/api/v1/groups/:group_id/permissions/remove",
            post(revoke_permissions_handler::<S>),
        )
        .route(
            "/api/v1/groups/:group_id/history",
            get(history_handler::<S>),
        )
        .with_state(directory)
}

fn respond<T: serde::Serialize>(
    status: StatusCode,
    result: Result<T, DirectoryError>,
) -> Result<Response, AppError> {
    let value = result?;
    Ok((status, Json(value)).into_response())
}

pub(crate) async fn create_user_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    let Json(payload) = payload?;
    respond(StatusCode::CREATED, directory.create_user(payload))
}

pub(crate) async fn update_user_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    Path(user_id): Path<u64>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    let Json(payload) = payload?;
    respond(StatusCode::OK, directory.update_user(UserId(user_id), payload))
}

pub(crate) async fn user_groups_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    Path(user_id): Path<u64>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    respond(StatusCode::OK, directory.user_groups(UserId(user_id)))
}

pub(crate) async fn profile_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    Path(user_id): Path<u64>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    respond(StatusCode::OK, directory.profile(UserId(user_id)))
}

pub(crate) async fn create_permission_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    payload: Result<Json<NewPermission>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    let Json(payload) = payload?;
    respond(StatusCode::CREATED, directory.create_permission(payload))
}

pub(crate) async fn create_group_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    let Json(payload) = payload?;
    respond(StatusCode::CREATED, directory.create_group(&payload.name))
}

pub(crate) async fn delete_group_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    Path(group_id): Path<u64>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    respond(StatusCode::OK, directory.delete_group(GroupId(group_id)))
}

pub(crate) async fn add_members_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    Path(group_id): Path<u64>,
    payload: Result<Json<MembersRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    let Json(payload) = payload?;
    respond(
        StatusCode::OK,
        directory.add_members(GroupId(group_id), &payload.user_ids),
    )
}

pub(crate) async fn remove_members_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    Path(group_id): Path<u64>,
    payload: Result<Json<MembersRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    let Json(payload) = payload?;
    respond(
        StatusCode::OK,
        directory.remove_members(GroupId(group_id), &payload.user_ids),
    )
}

pub(crate) async fn grant_permissions_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    Path(group_id): Path<u64>,
    payload: Result<Json<PermissionsRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    let Json(payload) = payload?;
    respond(
        StatusCode::OK,
        directory.grant_permissions(GroupId(group_id), &payload.permission_ids),
    )
}

pub(crate) async fn revoke_permissions_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    Path(group_id): Path<u64>,
    payload: Result<Json<PermissionsRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    let Json(payload) = payload?;
    respond(
        StatusCode::OK,
        directory.revoke_permissions(GroupId(group_id), &payload.permission_ids),
    )
}

pub(crate) async fn history_handler<S>(
    State(directory): State<Arc<GroupDirectory<S>>>,
    Path(group_id): Path<u64>,
) -> Result<Response, AppError>
where
    S: UnitOfWork + 'static,
    S::Tx: DirectoryRepository,
{
    respond(StatusCode::OK, directory.group_history(GroupId(group_id)))
}
