use chrono::NaiveDate;

use super::common::*;
use crate::workflows::evaluations::{
    CriterionId, EvaluationFilter, EvaluationServiceError, EvaluationTypeId, NewCriterion,
    NewDriver, NoteCheck, NoteCheckRequest, NoteInput,
};

fn check(
    catalogue: &Catalogue,
    criterion_id: Option<CriterionId>,
    value: Option<NoteInput>,
) -> NoteCheck {
    catalogue
        .service
        .check_note(NoteCheckRequest {
            criterion_id,
            value,
        })
        .unwrap()
}

#[test]
fn note_check_reports_each_failure() {
    let catalogue = catalogue();
    let punctuality = Some(catalogue.punctuality.id);

    let cases = [
        (None, Some(NoteInput::Integer(3)), Some("Données manquantes")),
        (punctuality, None, Some("Données manquantes")),
        (
            Some(CriterionId(404)),
            Some(NoteInput::Integer(3)),
            Some("Critère invalide"),
        ),
        (
            punctuality,
            Some(NoteInput::Text("trois".to_string())),
            Some("Nombre requis"),
        ),
        (punctuality, Some(NoteInput::Integer(9)), Some("Note entre 1 et 5")),
        (punctuality, Some(NoteInput::Text("5".to_string())), None),
    ];

    for (criterion_id, value, expected) in cases {
        let outcome = check(&catalogue, criterion_id, value);
        assert_eq!(outcome.valid, expected.is_none());
        assert_eq!(outcome.error.as_deref(), expected);
    }
}

#[test]
fn criteria_for_type_lists_active_criteria_by_name() {
    let catalogue = catalogue();

    let names: Vec<String> = catalogue
        .service
        .criteria_for_type(catalogue.evaluation_type.id)
        .unwrap()
        .into_iter()
        .map(|criterion| criterion.name)
        .collect();
    assert_eq!(names, vec!["Ponctualité".to_string(), "Sécurité".to_string()]);

    assert!(matches!(
        catalogue.service.criteria_for_type(EvaluationTypeId(77)),
        Err(EvaluationServiceError::NotFound { id: 77, .. })
    ));
}

#[test]
fn form_choices_offer_active_drivers_only() {
    let catalogue = catalogue();
    catalogue
        .service
        .create_driver(NewDriver {
            last_name: "Bernard".to_string(),
            first_name: "Louis".to_string(),
            active: false,
            company_id: catalogue.driver.company_id,
            site_id: catalogue.driver.site_id,
        })
        .unwrap();

    let choices = catalogue.service.form_choices().unwrap();
    assert_eq!(choices.drivers, vec![catalogue.driver.clone()]);
    assert_eq!(choices.evaluators.len(), 1);
    assert_eq!(choices.evaluators[0].display_name, "Marie Dupont");
    assert_eq!(choices.evaluation_types, vec![catalogue.evaluation_type.clone()]);
}

#[test]
fn list_is_most_recent_first_and_filterable() {
    let catalogue = catalogue();
    let older = catalogue
        .service
        .submit(catalogue.complete(january_10()))
        .unwrap();
    let newer = catalogue
        .service
        .submit(catalogue.complete(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()))
        .unwrap();

    let listed: Vec<_> = catalogue
        .service
        .list(EvaluationFilter::default())
        .unwrap()
        .into_iter()
        .map(|summary| summary.evaluation.id)
        .collect();
    assert_eq!(listed, vec![newer.id, older.id]);

    let summary = &catalogue
        .service
        .list(EvaluationFilter {
            driver_id: Some(catalogue.driver.id),
            evaluation_type_id: None,
        })
        .unwrap()[0];
    assert_eq!(summary.driver_name, "Martin Paul");
    assert_eq!(summary.evaluator_name, "Marie Dupont");
    assert_eq!(summary.evaluation_type, "Conduite");

    let other_type = catalogue
        .service
        .list(EvaluationFilter {
            driver_id: None,
            evaluation_type_id: Some(EvaluationTypeId(99)),
        })
        .unwrap();
    assert!(other_type.is_empty());
}

#[test]
fn delete_removes_the_evaluation() {
    let catalogue = catalogue();
    let evaluation = catalogue
        .service
        .submit(catalogue.complete(january_10()))
        .unwrap();

    catalogue.service.delete(evaluation.id).unwrap();

    assert!(matches!(
        catalogue.service.detail(evaluation.id),
        Err(EvaluationServiceError::NotFound { entity: "evaluation", .. })
    ));
    assert!(matches!(
        catalogue.service.delete(evaluation.id),
        Err(EvaluationServiceError::NotFound { .. })
    ));
    catalogue
        .service
        .submit(catalogue.complete(january_10()))
        .expect("key is free again");
}

#[test]
fn dashboard_counts_the_current_month() {
    let catalogue = catalogue();
    catalogue
        .service
        .submit(catalogue.complete(january_10()))
        .unwrap();
    catalogue
        .service
        .submit(catalogue.complete(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()))
        .unwrap();

    let dashboard = catalogue
        .service
        .dashboard(NaiveDate::from_ymd_opt(2024, 2, 20).unwrap())
        .unwrap();
    assert_eq!(dashboard.active_drivers, 1);
    assert_eq!(dashboard.total_evaluations, 2);
    assert_eq!(dashboard.evaluations_this_month, 1);
    assert_eq!(dashboard.recent.len(), 2);
    assert_eq!(
        dashboard.recent[0].evaluation.key.evaluated_on,
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    );
}

#[test]
fn inverted_criterion_bounds_are_rejected() {
    let catalogue = catalogue();

    let result = catalogue.service.create_criterion(NewCriterion {
        evaluation_type_id: catalogue.evaluation_type.id,
        name: "Courtoisie".to_string(),
        min: 5,
        max: 1,
        active: true,
    });

    assert!(matches!(result, Err(EvaluationServiceError::Invalid(_))));
}
