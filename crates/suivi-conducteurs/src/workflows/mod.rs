pub mod evaluations;
pub mod evaluators;
pub mod groups;
