use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::EvaluatorPolicy;
use crate::store::InMemoryStore;
use crate::workflows::evaluations::{
    Criterion, Driver, EvaluationService, EvaluationSubmission, EvaluationType, NewCriterion,
    NewDriver,
};
use crate::workflows::evaluators::{EvaluatorDirectory, EvaluatorId};
use crate::workflows::groups::{GroupDirectory, NewUser};

/// A driver, an RH evaluator and a "Conduite" type with two active criteria
/// (Ponctualité 1..5, Sécurité 0..10) and one retired criterion.
pub(super) struct Catalogue {
    pub(super) service: Arc<EvaluationService<InMemoryStore>>,
    pub(super) driver: Driver,
    pub(super) evaluator_id: EvaluatorId,
    pub(super) evaluation_type: EvaluationType,
    pub(super) punctuality: Criterion,
    pub(super) safety: Criterion,
    pub(super) retired: Criterion,
}

pub(super) fn january_10() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date")
}

pub(super) fn catalogue() -> Catalogue {
    let store = Arc::new(InMemoryStore::new());

    let groups = GroupDirectory::with_default_handlers(store.clone(), EvaluatorPolicy::default());
    let user = groups
        .create_user(NewUser::named("mdupont", "Marie", "Dupont"))
        .expect("user created");
    let rh = groups.create_group("RH").expect("group created");
    groups.add_members(rh.id, &[user.id]).expect("member added");
    let evaluator_id = EvaluatorDirectory::new(store.clone())
        .for_user(user.id)
        .expect("lookup succeeds")
        .expect("evaluator provisioned")
        .evaluator
        .id;

    let service = Arc::new(EvaluationService::new(store));
    let company = service.create_company("Transports Rive").unwrap();
    let site = service.create_site("Lyon Gerland").unwrap();
    let driver = service
        .create_driver(NewDriver {
            last_name: "Martin".to_string(),
            first_name: "Paul".to_string(),
            active: true,
            company_id: company.id,
            site_id: site.id,
        })
        .unwrap();
    let evaluation_type = service.create_evaluation_type("Conduite").unwrap();
    let criterion = |name: &str, min: i32, max: i32, active: bool| {
        service
            .create_criterion(NewCriterion {
                evaluation_type_id: evaluation_type.id,
                name: name.to_string(),
                min,
                max,
                active,
            })
            .unwrap()
    };
    let punctuality = criterion("Ponctualité", 1, 5, true);
    let safety = criterion("Sécurité", 0, 10, true);
    let retired = criterion("Ancien critère", 1, 3, false);

    Catalogue {
        service,
        driver,
        evaluator_id,
        evaluation_type,
        punctuality,
        safety,
        retired,
    }
}

impl Catalogue {
    pub(super) fn draft(&self, evaluated_on: NaiveDate) -> EvaluationSubmission {
        EvaluationSubmission::new(
            self.driver.id,
            self.evaluator_id,
            self.evaluation_type.id,
            evaluated_on,
        )
    }

    /// Ponctualité 4, Sécurité "8" as typed in a form.
    pub(super) fn complete(&self, evaluated_on: NaiveDate) -> EvaluationSubmission {
        self.draft(evaluated_on)
            .with_note(self.punctuality.id, 4_i64)
            .with_note(self.safety.id, "8")
    }
}

pub(super) fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json body")
}
