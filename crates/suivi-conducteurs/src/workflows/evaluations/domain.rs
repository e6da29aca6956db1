use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::evaluators::EvaluatorId;

entity_id!(CompanyId);
entity_id!(SiteId);
entity_id!(
    /// Identifier of a driver (conducteur).
    DriverId
);
entity_id!(EvaluationTypeId);
entity_id!(CriterionId);
entity_id!(EvaluationId);
entity_id!(NoteId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub last_name: String,
    pub first_name: String,
    pub active: bool,
    pub company_id: CompanyId,
    pub site_id: SiteId,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDriver {
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub company_id: CompanyId,
    pub site_id: SiteId,
}

/// Category of evaluation (typologie), owning a set of criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationType {
    pub id: EvaluationTypeId,
    pub name: String,
}

/// Scored dimension of an evaluation type with an inclusive note range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub evaluation_type_id: EvaluationTypeId,
    pub name: String,
    pub min: i32,
    pub max: i32,
    pub active: bool,
}

impl Criterion {
    pub fn accepts(&self, value: i64) -> bool {
        (i64::from(self.min)..=i64::from(self.max)).contains(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCriterion {
    pub evaluation_type_id: EvaluationTypeId,
    pub name: String,
    pub min: i32,
    pub max: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// The tuple an evaluation is unique on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvaluationKey {
    pub driver_id: DriverId,
    pub evaluator_id: EvaluatorId,
    pub evaluation_type_id: EvaluationTypeId,
    pub evaluated_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    #[serde(flatten)]
    pub key: EvaluationKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub evaluation_id: EvaluationId,
    pub criterion_id: CriterionId,
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewNote {
    pub criterion_id: CriterionId,
    pub value: i32,
}

/// Evaluation row plus every note, written in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvaluation {
    pub key: EvaluationKey,
    pub notes: Vec<NewNote>,
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn default_active() -> bool {
    true
}
