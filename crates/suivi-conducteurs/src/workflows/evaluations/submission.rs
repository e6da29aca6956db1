use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    parse_date, Criterion, CriterionId, Driver, DriverId, Evaluation,
    EvaluationKey, EvaluationType, EvaluationTypeId, NewEvaluation, NewNote,
};
use super::repository::EvaluationRepository;
use crate::store::RepositoryError;
use crate::workflows::evaluators::{Evaluator, EvaluatorId, EvaluatorRepository};

/// A note as posted by a client: a JSON number, the raw form text, or any
/// other JSON value, which reads as "not a number".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoteInput {
    Integer(i64),
    Text(String),
    Other(serde_json::Value),
}

/// Result of reading a note before range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedNote {
    Blank,
    NotANumber,
    Value(i64),
}

impl NoteInput {
    pub fn parse(&self) -> ParsedNote {
        match self {
            NoteInput::Integer(value) => ParsedNote::Value(*value),
            NoteInput::Text(raw) if raw.trim().is_empty() => ParsedNote::Blank,
            NoteInput::Text(raw) => raw
                .trim()
                .parse::<i64>()
                .map(ParsedNote::Value)
                .unwrap_or(ParsedNote::NotANumber),
            NoteInput::Other(serde_json::Value::Null) => ParsedNote::Blank,
            NoteInput::Other(_) => ParsedNote::NotANumber,
        }
    }
}

impl From<i64> for NoteInput {
    fn from(value: i64) -> Self {
        NoteInput::Integer(value)
    }
}

impl From<&str> for NoteInput {
    fn from(value: &str) -> Self {
        NoteInput::Text(value.to_string())
    }
}

/// Draft evaluation exactly as submitted; nothing is trusted yet.
///
/// Notes are keyed by criterion id, either bare (`"12"`) or with the form
/// prefix (`"note_12"`). The date stays raw text until validation so a
/// malformed value is reported like any other input problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSubmission {
    #[serde(default)]
    pub driver_id: Option<DriverId>,
    #[serde(default)]
    pub evaluator_id: Option<EvaluatorId>,
    #[serde(default)]
    pub evaluation_type_id: Option<EvaluationTypeId>,
    #[serde(default)]
    pub evaluated_on: Option<String>,
    #[serde(default)]
    pub notes: BTreeMap<String, NoteInput>,
}

/// Input problems reported back to the person filling the form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Tous les champs obligatoires doivent être remplis.")]
    MissingField { field: &'static str },
    #[error("La date d'évaluation {value} est invalide (format attendu AAAA-MM-JJ).")]
    InvalidDate { value: String },
    #[error("La note pour le critère {criterion} est obligatoire.")]
    MissingNote {
        criterion_id: CriterionId,
        criterion: String,
    },
    #[error("La note pour {criterion} doit être un nombre.")]
    InvalidNote {
        criterion_id: CriterionId,
        criterion: String,
    },
    #[error("La note pour {criterion} doit être entre {min} et {max}.")]
    NoteOutOfRange {
        criterion_id: CriterionId,
        criterion: String,
        min: i32,
        max: i32,
        value: i64,
    },
}

/// Why a submission was rejected. Nothing is persisted in any of these cases.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} {id} introuvable.")]
    NotFound { entity: &'static str, id: u64 },
    #[error("Une évaluation existe déjà pour ce conducteur, évaluateur, type et date.")]
    Duplicate,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Submission that passed every check and is ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEvaluation {
    pub driver: Driver,
    pub evaluator: Evaluator,
    pub evaluation_type: EvaluationType,
    pub key: EvaluationKey,
    pub notes: Vec<NewNote>,
}

impl EvaluationSubmission {
    pub fn new(
        driver_id: DriverId,
        evaluator_id: EvaluatorId,
        evaluation_type_id: EvaluationTypeId,
        evaluated_on: NaiveDate,
    ) -> Self {
        Self {
            driver_id: Some(driver_id),
            evaluator_id: Some(evaluator_id),
            evaluation_type_id: Some(evaluation_type_id),
            evaluated_on: Some(evaluated_on.format("%Y-%m-%d").to_string()),
            notes: BTreeMap::new(),
        }
    }

    pub fn with_note(mut self, criterion_id: CriterionId, note: impl Into<NoteInput>) -> Self {
        self.notes.insert(criterion_id.to_string(), note.into());
        self
    }

    pub fn note_for(&self, criterion_id: CriterionId) -> Option<&NoteInput> {
        self.notes
            .get(&criterion_id.to_string())
            .or_else(|| self.notes.get(&format!("note_{criterion_id}")))
    }

    /// Checks run in order and the first failure wins: required fields,
    /// referenced rows, one valid note per active criterion, then the
    /// uniqueness pre-check.
    pub fn validate<R>(&self, repository: &R) -> Result<ValidatedEvaluation, SubmissionError>
    where
        R: EvaluationRepository + EvaluatorRepository,
    {
        let (driver_id, evaluator_id, evaluation_type_id, evaluated_on) = self.required_fields()?;

        let driver = repository
            .driver(driver_id)?
            .ok_or(SubmissionError::NotFound {
                entity: "Conducteur",
                id: driver_id.0,
            })?;
        let evaluator = repository
            .evaluator(evaluator_id)?
            .ok_or(SubmissionError::NotFound {
                entity: "Évaluateur",
                id: evaluator_id.0,
            })?;
        let evaluation_type =
            repository
                .evaluation_type(evaluation_type_id)?
                .ok_or(SubmissionError::NotFound {
                    entity: "Type d'évaluation",
                    id: evaluation_type_id.0,
                })?;

        let criteria = repository.criteria_for_type(evaluation_type_id, true)?;
        let notes = criteria
            .iter()
            .map(|criterion| self.checked_note(criterion))
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let key = EvaluationKey {
            driver_id,
            evaluator_id,
            evaluation_type_id,
            evaluated_on,
        };
        if repository.evaluation_by_key(&key)?.is_some() {
            return Err(SubmissionError::Duplicate);
        }

        Ok(ValidatedEvaluation {
            driver,
            evaluator,
            evaluation_type,
            key,
            notes,
        })
    }

    fn required_fields(
        &self,
    ) -> Result<(DriverId, EvaluatorId, EvaluationTypeId, NaiveDate), ValidationError> {
        let missing = |field| ValidationError::MissingField { field };
        let driver_id = self.driver_id.ok_or(missing("driver_id"))?;
        let evaluator_id = self.evaluator_id.ok_or(missing("evaluator_id"))?;
        let evaluation_type_id = self
            .evaluation_type_id
            .ok_or(missing("evaluation_type_id"))?;
        let raw_date = self
            .evaluated_on
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(missing("evaluated_on"))?;
        let evaluated_on = parse_date(raw_date).map_err(|_| ValidationError::InvalidDate {
            value: raw_date.to_string(),
        })?;
        Ok((driver_id, evaluator_id, evaluation_type_id, evaluated_on))
    }

    fn checked_note(&self, criterion: &Criterion) -> Result<NewNote, ValidationError> {
        let parsed = self
            .note_for(criterion.id)
            .map(NoteInput::parse)
            .unwrap_or(ParsedNote::Blank);

        let value = match parsed {
            ParsedNote::Blank => {
                return Err(ValidationError::MissingNote {
                    criterion_id: criterion.id,
                    criterion: criterion.name.clone(),
                })
            }
            ParsedNote::NotANumber => {
                return Err(ValidationError::InvalidNote {
                    criterion_id: criterion.id,
                    criterion: criterion.name.clone(),
                })
            }
            ParsedNote::Value(value) => value,
        };

        let out_of_range = || ValidationError::NoteOutOfRange {
            criterion_id: criterion.id,
            criterion: criterion.name.clone(),
            min: criterion.min,
            max: criterion.max,
            value,
        };
        if !criterion.accepts(value) {
            return Err(out_of_range());
        }
        let value = i32::try_from(value).map_err(|_| out_of_range())?;

        Ok(NewNote {
            criterion_id: criterion.id,
            value,
        })
    }
}

impl ValidatedEvaluation {
    /// Writes the evaluation and its notes. The store's uniqueness constraint
    /// is the final word on duplicates.
    pub fn commit<R>(self, repository: &mut R) -> Result<Evaluation, SubmissionError>
    where
        R: EvaluationRepository,
    {
        repository
            .insert_evaluation(NewEvaluation {
                key: self.key,
                notes: self.notes,
            })
            .map_err(|error| match error {
                RepositoryError::Conflict => SubmissionError::Duplicate,
                other => SubmissionError::Repository(other),
            })
    }
}
