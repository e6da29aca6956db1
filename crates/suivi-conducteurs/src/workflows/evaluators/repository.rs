use super::domain::{Evaluator, EvaluatorId, NewEvaluator, Service, ServiceId};
use crate::store::RepositoryError;
use crate::workflows::groups::UserId;

/// Services are unique by name; inserting a known name fails with `Conflict`.
pub trait ServiceRepository {
    fn service(&self, id: ServiceId) -> Result<Option<Service>, RepositoryError>;
    fn service_by_name(&self, name: &str) -> Result<Option<Service>, RepositoryError>;
    fn insert_service(&mut self, name: &str, abbreviation: &str)
        -> Result<Service, RepositoryError>;
    fn services(&self) -> Result<Vec<Service>, RepositoryError>;
}

/// At most one evaluator per user; a second insert fails with `Conflict`.
pub trait EvaluatorRepository {
    fn evaluator(&self, id: EvaluatorId) -> Result<Option<Evaluator>, RepositoryError>;
    fn evaluator_for_user(&self, user: UserId) -> Result<Option<Evaluator>, RepositoryError>;
    fn insert_evaluator(&mut self, evaluator: NewEvaluator) -> Result<Evaluator, RepositoryError>;
    fn update_evaluator(&mut self, evaluator: Evaluator) -> Result<(), RepositoryError>;
    fn evaluators(&self) -> Result<Vec<Evaluator>, RepositoryError>;
}
