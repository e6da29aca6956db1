//! Driver evaluations: catalogue, validated submission and review.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod submission;

#[cfg(test)]
mod tests;

pub use domain::{
    parse_date, Company, CompanyId, Criterion, CriterionId, Driver, DriverId, Evaluation,
    EvaluationId, EvaluationKey, EvaluationType, EvaluationTypeId, NewCriterion, NewDriver,
    NewEvaluation, NewNote, Note, NoteId, Site, SiteId,
};
pub use repository::EvaluationRepository;
pub use router::evaluation_router;
pub use service::{
    DashboardSummary, EvaluationDetail, EvaluationFilter, EvaluationFormChoices,
    EvaluationService, EvaluationServiceError, EvaluationSummary, NoteCheck, NoteCheckRequest,
    NoteStats, NoteView,
};
pub use submission::{
    EvaluationSubmission, NoteInput, ParsedNote, SubmissionError, ValidatedEvaluation,
    ValidationError,
};
