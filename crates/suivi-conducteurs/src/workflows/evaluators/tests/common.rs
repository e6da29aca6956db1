use std::sync::Arc;

use crate::config::{EvaluatorPolicy, EvaluatorRetention};
use crate::store::InMemoryStore;
use crate::workflows::evaluators::{EvaluatorDirectory, EvaluatorView};
use crate::workflows::groups::{Group, GroupDirectory, NewUser, User, UserId};

pub(super) struct Fixture {
    pub(super) groups: GroupDirectory<InMemoryStore>,
    pub(super) evaluators: EvaluatorDirectory<InMemoryStore>,
}

impl Fixture {
    pub(super) fn new() -> Self {
        Self::with_retention(EvaluatorRetention::Retain)
    }

    pub(super) fn with_retention(retention: EvaluatorRetention) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            groups: GroupDirectory::with_default_handlers(
                store.clone(),
                EvaluatorPolicy { retention },
            ),
            evaluators: EvaluatorDirectory::new(store),
        }
    }

    pub(super) fn user(&self, username: &str, first_name: &str, last_name: &str) -> User {
        self.groups
            .create_user(NewUser::named(username, first_name, last_name))
            .expect("user created")
    }

    pub(super) fn group(&self, name: &str) -> Group {
        self.groups.create_group(name).expect("group created")
    }

    pub(super) fn join(&self, group: &Group, user: &User) {
        self.groups
            .add_members(group.id, &[user.id])
            .expect("member added");
    }

    pub(super) fn leave(&self, group: &Group, user: &User) {
        self.groups
            .remove_members(group.id, &[user.id])
            .expect("member removed");
    }

    pub(super) fn evaluator_of(&self, user_id: UserId) -> Option<EvaluatorView> {
        self.evaluators.for_user(user_id).expect("evaluator lookup")
    }

    pub(super) fn service_name_of(&self, user_id: UserId) -> Option<String> {
        self.evaluator_of(user_id)
            .and_then(|view| view.service)
            .map(|service| service.name)
    }
}
