use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::config::EvaluatorPolicy;
use crate::store::{InMemoryStore, RepositoryError, Tables};
use crate::workflows::groups::{
    DirectoryEvent, DirectoryEventHandler, Group, GroupDirectory, NewPermission, NewUser,
    Permission, User,
};

pub(super) fn directory() -> GroupDirectory<InMemoryStore> {
    GroupDirectory::with_default_handlers(Arc::new(InMemoryStore::new()), EvaluatorPolicy::default())
}

pub(super) fn alice(directory: &GroupDirectory<InMemoryStore>) -> User {
    directory
        .create_user(NewUser::named("alice", "Alice", "Martin"))
        .expect("user created")
}

pub(super) fn group(directory: &GroupDirectory<InMemoryStore>, name: &str) -> Group {
    directory.create_group(name).expect("group created")
}

pub(super) fn view_driver(directory: &GroupDirectory<InMemoryStore>) -> Permission {
    directory
        .create_permission(NewPermission {
            codename: "view_driver".to_string(),
            name: "Voir les conducteurs".to_string(),
        })
        .expect("permission created")
}

/// Handler that refuses every membership change.
pub(super) struct RejectingHandler;

impl DirectoryEventHandler<Tables> for RejectingHandler {
    fn name(&self) -> &'static str {
        "rejecting"
    }

    fn handle(&self, _tx: &mut Tables, event: &DirectoryEvent) -> Result<(), RepositoryError> {
        match event {
            DirectoryEvent::MembersAdded { .. } | DirectoryEvent::MembersRemoved { .. } => Err(
                RepositoryError::Unavailable("downstream refused".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json body")
}
