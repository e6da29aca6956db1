use std::sync::Arc;

use super::domain::{Evaluator, EvaluatorView, Service};
use super::repository::{EvaluatorRepository, ServiceRepository};
use crate::store::{RepositoryError, UnitOfWork};
use crate::workflows::groups::UserId;

/// Read side over evaluators and their services.
pub struct EvaluatorDirectory<S> {
    store: Arc<S>,
}

impl<S> EvaluatorDirectory<S>
where
    S: UnitOfWork,
    S::Tx: ServiceRepository + EvaluatorRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Evaluators ordered by service name, name, then first name.
    pub fn list(&self) -> Result<Vec<EvaluatorView>, RepositoryError> {
        self.store.read(|tx| {
            let mut views = tx
                .evaluators()?
                .into_iter()
                .map(|evaluator| view(tx, evaluator))
                .collect::<Result<Vec<_>, RepositoryError>>()?;
            views.sort_by(|a, b| {
                let service = |view: &EvaluatorView| {
                    view.service
                        .as_ref()
                        .map(|service| service.name.clone())
                        .unwrap_or_default()
                };
                service(a)
                    .cmp(&service(b))
                    .then_with(|| a.evaluator.name.cmp(&b.evaluator.name))
                    .then_with(|| a.evaluator.first_name.cmp(&b.evaluator.first_name))
            });
            Ok(views)
        })
    }

    pub fn for_user(&self, user_id: UserId) -> Result<Option<EvaluatorView>, RepositoryError> {
        self.store.read(|tx| {
            tx.evaluator_for_user(user_id)?
                .map(|evaluator| view(tx, evaluator))
                .transpose()
        })
    }

    pub fn services(&self) -> Result<Vec<Service>, RepositoryError> {
        self.store.read(|tx| tx.services())
    }
}

pub(crate) fn view<Tx>(tx: &Tx, evaluator: Evaluator) -> Result<EvaluatorView, RepositoryError>
where
    Tx: ServiceRepository,
{
    let service = tx.service(evaluator.service_id)?;
    Ok(EvaluatorView {
        display_name: evaluator.display_name(),
        evaluator,
        service,
    })
}
