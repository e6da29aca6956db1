use super::domain::{
    Company, CompanyId, Criterion, CriterionId, Driver, DriverId, Evaluation, EvaluationId,
    EvaluationKey, EvaluationType, EvaluationTypeId, NewCriterion, NewDriver, NewEvaluation,
    Note, Site, SiteId,
};
use crate::store::RepositoryError;

/// Catalogue (companies, sites, drivers, types, criteria) and evaluations.
pub trait EvaluationRepository {
    fn company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError>;
    fn insert_company(&mut self, name: &str) -> Result<Company, RepositoryError>;
    fn site(&self, id: SiteId) -> Result<Option<Site>, RepositoryError>;
    fn insert_site(&mut self, name: &str) -> Result<Site, RepositoryError>;

    fn driver(&self, id: DriverId) -> Result<Option<Driver>, RepositoryError>;
    /// Fails with `NotFound` when the company or site is unknown.
    fn insert_driver(&mut self, driver: NewDriver) -> Result<Driver, RepositoryError>;
    /// Drivers ordered by last then first name.
    fn drivers(&self, active_only: bool) -> Result<Vec<Driver>, RepositoryError>;

    fn evaluation_type(
        &self,
        id: EvaluationTypeId,
    ) -> Result<Option<EvaluationType>, RepositoryError>;
    fn insert_evaluation_type(&mut self, name: &str) -> Result<EvaluationType, RepositoryError>;
    fn evaluation_types(&self) -> Result<Vec<EvaluationType>, RepositoryError>;

    fn criterion(&self, id: CriterionId) -> Result<Option<Criterion>, RepositoryError>;
    /// Fails with `Invalid` when `min > max`, `NotFound` for an unknown type.
    fn insert_criterion(&mut self, criterion: NewCriterion) -> Result<Criterion, RepositoryError>;
    /// Criteria of a type ordered by name.
    fn criteria_for_type(
        &self,
        evaluation_type: EvaluationTypeId,
        active_only: bool,
    ) -> Result<Vec<Criterion>, RepositoryError>;

    fn evaluation(&self, id: EvaluationId) -> Result<Option<Evaluation>, RepositoryError>;
    fn evaluation_by_key(&self, key: &EvaluationKey)
        -> Result<Option<Evaluation>, RepositoryError>;
    /// Inserts the evaluation and its notes. `Conflict` when the key is
    /// taken, `Invalid` when a note breaks its criterion's bounds or repeats
    /// a criterion.
    fn insert_evaluation(&mut self, evaluation: NewEvaluation)
        -> Result<Evaluation, RepositoryError>;
    /// Removes the evaluation and its notes.
    fn delete_evaluation(&mut self, id: EvaluationId) -> Result<Evaluation, RepositoryError>;
    fn evaluations(&self) -> Result<Vec<Evaluation>, RepositoryError>;
    fn notes_for(&self, evaluation: EvaluationId) -> Result<Vec<Note>, RepositoryError>;
}
