use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Company, Criterion, CriterionId, Driver, DriverId, Evaluation, EvaluationId, EvaluationType,
    EvaluationTypeId, NewCriterion, NewDriver, Site,
};
use super::repository::EvaluationRepository;
use super::submission::{EvaluationSubmission, NoteInput, ParsedNote, SubmissionError};
use crate::store::{RepositoryError, UnitOfWork};
use crate::workflows::evaluators::{
    service::view, EvaluatorRepository, EvaluatorView, ServiceRepository,
};

/// Number of evaluations shown on the dashboard.
const RECENT_EVALUATIONS: usize = 5;

/// Choices offered when drafting a new evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationFormChoices {
    pub drivers: Vec<Driver>,
    pub evaluators: Vec<EvaluatorView>,
    pub evaluation_types: Vec<EvaluationType>,
}

/// Live check of a single note while the form is being filled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteCheckRequest {
    #[serde(default)]
    pub criterion_id: Option<CriterionId>,
    #[serde(default)]
    pub value: Option<NoteInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NoteCheck {
    fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteView {
    pub criterion_id: CriterionId,
    pub criterion: String,
    pub min: i32,
    pub max: i32,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteStats {
    pub average: f64,
    pub total_criteria: usize,
    pub scored: usize,
}

impl NoteStats {
    pub fn from_notes(notes: &[NoteView], total_criteria: usize) -> Self {
        let scored = notes.len();
        let average = if scored == 0 {
            0.0
        } else {
            notes.iter().map(|note| f64::from(note.value)).sum::<f64>() / scored as f64
        };
        Self {
            average,
            total_criteria,
            scored,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationDetail {
    pub evaluation: Evaluation,
    pub driver: Driver,
    pub evaluator: EvaluatorView,
    pub evaluation_type: EvaluationType,
    pub notes: Vec<NoteView>,
    pub stats: NoteStats,
}

/// Listing row with the names a reader needs.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub driver_name: String,
    pub evaluator_name: String,
    pub evaluation_type: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EvaluationFilter {
    #[serde(default)]
    pub driver_id: Option<DriverId>,
    #[serde(default)]
    pub evaluation_type_id: Option<EvaluationTypeId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub active_drivers: usize,
    pub total_evaluations: usize,
    pub evaluations_this_month: usize,
    pub recent: Vec<EvaluationSummary>,
}

/// Error raised by the evaluation service outside of submissions.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Service composing evaluation submission, reads and catalogue upkeep.
pub struct EvaluationService<S> {
    store: Arc<S>,
}

impl<S> EvaluationService<S>
where
    S: UnitOfWork,
    S::Tx: EvaluationRepository + EvaluatorRepository + ServiceRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate then commit the evaluation and its notes in one transaction.
    pub fn submit(&self, submission: EvaluationSubmission) -> Result<Evaluation, SubmissionError> {
        let evaluation = self.store.atomically(|tx| {
            let validated = submission.validate(&*tx)?;
            validated.commit(tx)
        })?;

        info!(
            evaluation_id = %evaluation.id,
            driver_id = %evaluation.key.driver_id,
            evaluator_id = %evaluation.key.evaluator_id,
            "evaluation committed"
        );
        Ok(evaluation)
    }

    pub fn check_note(&self, request: NoteCheckRequest) -> Result<NoteCheck, EvaluationServiceError> {
        let (Some(criterion_id), Some(value)) = (request.criterion_id, request.value) else {
            return Ok(NoteCheck::invalid("Données manquantes"));
        };

        let Some(criterion) = self.store.read(|tx| tx.criterion(criterion_id))? else {
            return Ok(NoteCheck::invalid("Critère invalide"));
        };

        Ok(match value.parse() {
            ParsedNote::Blank => NoteCheck::invalid("Données manquantes"),
            ParsedNote::NotANumber => NoteCheck::invalid("Nombre requis"),
            ParsedNote::Value(value) if criterion.accepts(value) => NoteCheck::valid(),
            ParsedNote::Value(_) => NoteCheck::invalid(format!(
                "Note entre {} et {}",
                criterion.min, criterion.max
            )),
        })
    }

    /// Active criteria of a type, ordered by name.
    pub fn criteria_for_type(
        &self,
        evaluation_type_id: EvaluationTypeId,
    ) -> Result<Vec<Criterion>, EvaluationServiceError> {
        self.store.read(|tx| {
            tx.evaluation_type(evaluation_type_id)?
                .ok_or(EvaluationServiceError::NotFound {
                    entity: "evaluation type",
                    id: evaluation_type_id.0,
                })?;
            Ok(tx.criteria_for_type(evaluation_type_id, true)?)
        })
    }

    pub fn form_choices(&self) -> Result<EvaluationFormChoices, EvaluationServiceError> {
        self.store.read(|tx| {
            let mut evaluators = tx
                .evaluators()?
                .into_iter()
                .map(|evaluator| view(tx, evaluator))
                .collect::<Result<Vec<_>, RepositoryError>>()?;
            evaluators.sort_by_key(|view| {
                (
                    view.service
                        .as_ref()
                        .map(|service| service.name.clone())
                        .unwrap_or_default(),
                    view.evaluator.name.clone(),
                    view.evaluator.first_name.clone(),
                )
            });

            Ok(EvaluationFormChoices {
                drivers: tx.drivers(true)?,
                evaluators,
                evaluation_types: tx.evaluation_types()?,
            })
        })
    }

    pub fn detail(&self, evaluation_id: EvaluationId) -> Result<EvaluationDetail, EvaluationServiceError> {
        self.store.read(|tx| {
            let evaluation = tx
                .evaluation(evaluation_id)?
                .ok_or(EvaluationServiceError::NotFound {
                    entity: "evaluation",
                    id: evaluation_id.0,
                })?;
            let key = evaluation.key;

            let driver = tx
                .driver(key.driver_id)?
                .ok_or(RepositoryError::NotFound)?;
            let evaluator = tx
                .evaluator(key.evaluator_id)?
                .ok_or(RepositoryError::NotFound)?;
            let evaluation_type = tx
                .evaluation_type(key.evaluation_type_id)?
                .ok_or(RepositoryError::NotFound)?;

            let mut notes = Vec::new();
            for note in tx.notes_for(evaluation_id)? {
                let criterion = tx
                    .criterion(note.criterion_id)?
                    .ok_or(RepositoryError::NotFound)?;
                notes.push(NoteView {
                    criterion_id: criterion.id,
                    criterion: criterion.name,
                    min: criterion.min,
                    max: criterion.max,
                    value: note.value,
                });
            }
            notes.sort_by(|a, b| a.criterion.cmp(&b.criterion));
            let total_criteria = tx
                .criteria_for_type(key.evaluation_type_id, true)?
                .len();
            let stats = NoteStats::from_notes(&notes, total_criteria);

            Ok(EvaluationDetail {
                evaluation,
                driver,
                evaluator: view(tx, evaluator)?,
                evaluation_type,
                notes,
                stats,
            })
        })
    }

    /// Evaluations, most recent date first.
    pub fn list(&self, filter: EvaluationFilter) -> Result<Vec<EvaluationSummary>, EvaluationServiceError> {
        self.store.read(|tx| {
            let evaluations = tx
                .evaluations()?
                .into_iter()
                .filter(|evaluation| {
                    filter
                        .driver_id
                        .map_or(true, |driver_id| evaluation.key.driver_id == driver_id)
                        && filter.evaluation_type_id.map_or(true, |type_id| {
                            evaluation.key.evaluation_type_id == type_id
                        })
                })
                .collect();
            Ok(summarize(tx, evaluations)?)
        })
    }

    /// Removes an evaluation together with its notes.
    pub fn delete(&self, evaluation_id: EvaluationId) -> Result<Evaluation, EvaluationServiceError> {
        let evaluation = self.store.atomically(|tx| {
            tx.delete_evaluation(evaluation_id).map_err(|error| match error {
                RepositoryError::NotFound => EvaluationServiceError::NotFound {
                    entity: "evaluation",
                    id: evaluation_id.0,
                },
                other => EvaluationServiceError::Repository(other),
            })
        })?;
        info!(evaluation_id = %evaluation.id, "evaluation deleted");
        Ok(evaluation)
    }

    pub fn dashboard(&self, today: NaiveDate) -> Result<DashboardSummary, EvaluationServiceError> {
        let month_start = today.with_day(1).unwrap_or(today);
        self.store.read(|tx| {
            let evaluations = tx.evaluations()?;
            let total_evaluations = evaluations.len();
            let evaluations_this_month = evaluations
                .iter()
                .filter(|evaluation| evaluation.key.evaluated_on >= month_start)
                .count();
            let mut recent = summarize(tx, evaluations)?;
            recent.truncate(RECENT_EVALUATIONS);

            Ok(DashboardSummary {
                active_drivers: tx.drivers(true)?.len(),
                total_evaluations,
                evaluations_this_month,
                recent,
            })
        })
    }

    pub fn create_company(&self, name: &str) -> Result<Company, EvaluationServiceError> {
        let name = required(name, "company name")?;
        self.store.atomically(|tx| Ok(tx.insert_company(name)?))
    }

    pub fn create_site(&self, name: &str) -> Result<Site, EvaluationServiceError> {
        let name = required(name, "site name")?;
        self.store.atomically(|tx| Ok(tx.insert_site(name)?))
    }

    pub fn create_driver(&self, driver: NewDriver) -> Result<Driver, EvaluationServiceError> {
        required(&driver.last_name, "driver last name")?;
        self.store.atomically(|tx| Ok(tx.insert_driver(driver)?))
    }

    pub fn create_evaluation_type(&self, name: &str) -> Result<EvaluationType, EvaluationServiceError> {
        let name = required(name, "evaluation type name")?;
        self.store.atomically(|tx| Ok(tx.insert_evaluation_type(name)?))
    }

    pub fn create_criterion(&self, criterion: NewCriterion) -> Result<Criterion, EvaluationServiceError> {
        required(&criterion.name, "criterion name")?;
        if criterion.min > criterion.max {
            return Err(EvaluationServiceError::Invalid(format!(
                "criterion bounds [{}, {}] are inverted",
                criterion.min, criterion.max
            )));
        }
        self.store.atomically(|tx| Ok(tx.insert_criterion(criterion)?))
    }
}

fn required<'a>(value: &'a str, label: &str) -> Result<&'a str, EvaluationServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EvaluationServiceError::Invalid(format!("{label} is required")));
    }
    Ok(value)
}

/// Orders by date then id, both descending, and joins display names.
fn summarize<Tx>(
    tx: &Tx,
    mut evaluations: Vec<Evaluation>,
) -> Result<Vec<EvaluationSummary>, RepositoryError>
where
    Tx: EvaluationRepository + EvaluatorRepository,
{
    evaluations.sort_by(|a, b| {
        b.key
            .evaluated_on
            .cmp(&a.key.evaluated_on)
            .then_with(|| b.id.cmp(&a.id))
    });

    evaluations
        .into_iter()
        .map(|evaluation| {
            let key = evaluation.key;
            let driver_name = tx
                .driver(key.driver_id)?
                .map(|driver| driver.full_name())
                .unwrap_or_default();
            let evaluator_name = tx
                .evaluator(key.evaluator_id)?
                .map(|evaluator| evaluator.display_name())
                .unwrap_or_default();
            let evaluation_type = tx
                .evaluation_type(key.evaluation_type_id)?
                .map(|evaluation_type| evaluation_type.name)
                .unwrap_or_default();
            Ok(EvaluationSummary {
                evaluation,
                driver_name,
                evaluator_name,
                evaluation_type,
            })
        })
        .collect()
}
