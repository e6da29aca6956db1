//! Evaluator records derived from RH / Exploitation group membership.

pub mod domain;
pub mod repository;
pub mod resolver;
pub mod router;
pub mod service;
pub mod sync;

#[cfg(test)]
mod tests;

pub use domain::{
    Evaluator, EvaluatorId, EvaluatorView, NewEvaluator, Service, ServiceId,
    FIRST_NAME_PLACEHOLDER, NAME_PLACEHOLDER,
};
pub use repository::{EvaluatorRepository, ServiceRepository};
pub use resolver::{
    evaluator_groups, ServiceResolutionError, ServiceResolver, ServiceRoute, EVALUATOR_GROUPS,
};
pub use router::evaluator_router;
pub use service::EvaluatorDirectory;
pub use sync::{EvaluatorSynchronizer, MembershipTrigger, SyncOutcome};
