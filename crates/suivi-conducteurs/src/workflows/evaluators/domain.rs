use serde::{Deserialize, Serialize};

use crate::workflows::groups::{User, UserId};

entity_id!(ServiceId);
entity_id!(EvaluatorId);

/// Seeded into evaluators created from accounts with a blank last name.
pub const NAME_PLACEHOLDER: &str = "Nom";
/// Seeded into evaluators created from accounts with a blank first name.
pub const FIRST_NAME_PLACEHOLDER: &str = "Prénom";

/// Organisational department owning evaluators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub abbreviation: String,
}

/// Staff member allowed to evaluate drivers, bound to exactly one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluator {
    pub id: EvaluatorId,
    pub user_id: UserId,
    pub name: String,
    pub first_name: String,
    pub service_id: ServiceId,
    pub active: bool,
}

impl Evaluator {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvaluator {
    pub user_id: UserId,
    pub name: String,
    pub first_name: String,
    pub service_id: ServiceId,
}

impl NewEvaluator {
    pub fn for_user(user: &User, service: &Service) -> Self {
        Self {
            user_id: user.id,
            name: or_placeholder(&user.last_name, NAME_PLACEHOLDER),
            first_name: or_placeholder(&user.first_name, FIRST_NAME_PLACEHOLDER),
            service_id: service.id,
        }
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// Evaluator joined with its service for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluatorView {
    #[serde(flatten)]
    pub evaluator: Evaluator,
    pub display_name: String,
    pub service: Option<Service>,
}
