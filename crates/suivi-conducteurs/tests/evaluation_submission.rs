//! Evaluation submission end to end: catalogue setup, evaluator provisioning
//! and the all-or-nothing write of an evaluation with its notes.

use std::sync::Arc;

use chrono::NaiveDate;

use suivi_conducteurs::config::EvaluatorPolicy;
use suivi_conducteurs::store::{InMemoryStore, RepositoryError, UnitOfWork};
use suivi_conducteurs::workflows::evaluations::{
    Criterion, EvaluationFilter, EvaluationRepository, EvaluationService, EvaluationSubmission,
    NewCriterion, NewDriver, SubmissionError, ValidationError,
};
use suivi_conducteurs::workflows::evaluators::{EvaluatorDirectory, EvaluatorId};
use suivi_conducteurs::workflows::groups::{GroupDirectory, NewUser};

struct World {
    store: Arc<InMemoryStore>,
    evaluations: EvaluationService<InMemoryStore>,
    submission: EvaluationSubmission,
    criteria: Vec<Criterion>,
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).expect("valid date")
}

fn world() -> World {
    let store = Arc::new(InMemoryStore::new());
    let groups = GroupDirectory::with_default_handlers(store.clone(), EvaluatorPolicy::default());
    let user = groups
        .create_user(NewUser::named("aleroy", "Anne", "Leroy"))
        .unwrap();
    let exploitation = groups.create_group("Exploitation").unwrap();
    groups.add_members(exploitation.id, &[user.id]).unwrap();
    let evaluator: EvaluatorId = EvaluatorDirectory::new(store.clone())
        .for_user(user.id)
        .unwrap()
        .expect("evaluator provisioned")
        .evaluator
        .id;

    let evaluations = EvaluationService::new(store.clone());
    let company = evaluations.create_company("Transports Rive").unwrap();
    let site = evaluations.create_site("Vénissieux").unwrap();
    let driver = evaluations
        .create_driver(NewDriver {
            last_name: "Martin".to_string(),
            first_name: "Paul".to_string(),
            active: true,
            company_id: company.id,
            site_id: site.id,
        })
        .unwrap();
    let evaluation_type = evaluations.create_evaluation_type("Sécurité routière").unwrap();
    let criteria: Vec<Criterion> = [("Anticipation", 1, 5), ("Freinage", 1, 5), ("Vitesse", 0, 3)]
        .into_iter()
        .map(|(name, min, max)| {
            evaluations
                .create_criterion(NewCriterion {
                    evaluation_type_id: evaluation_type.id,
                    name: name.to_string(),
                    min,
                    max,
                    active: true,
                })
                .unwrap()
        })
        .collect();

    let submission =
        EvaluationSubmission::new(driver.id, evaluator, evaluation_type.id, day(10));
    World {
        store,
        evaluations,
        submission,
        criteria,
    }
}

fn evaluation_rows(store: &InMemoryStore) -> usize {
    let rows: Result<_, RepositoryError> = store.read(|tx| tx.evaluations());
    rows.unwrap().len()
}

#[test]
fn persisted_notes_match_the_active_criteria() {
    let world = world();
    let submission = world
        .criteria
        .iter()
        .fold(world.submission.clone(), |draft, criterion| {
            draft.with_note(criterion.id, i64::from(criterion.max))
        });

    let evaluation = world.evaluations.submit(submission).unwrap();

    let notes = world
        .store
        .read(|tx| tx.notes_for(evaluation.id))
        .unwrap();
    let mut noted: Vec<_> = notes.iter().map(|note| note.criterion_id).collect();
    noted.sort();
    let expected: Vec<_> = world.criteria.iter().map(|criterion| criterion.id).collect();
    assert_eq!(noted, expected);
}

#[test]
fn a_single_bad_note_writes_nothing() {
    let world = world();
    let submission = world
        .submission
        .clone()
        .with_note(world.criteria[0].id, 3_i64)
        .with_note(world.criteria[1].id, 4_i64)
        .with_note(world.criteria[2].id, 7_i64);

    let error = world.evaluations.submit(submission).unwrap_err();

    assert!(matches!(
        error,
        SubmissionError::Validation(ValidationError::NoteOutOfRange { min: 0, max: 3, .. })
    ));
    assert_eq!(evaluation_rows(&world.store), 0);

    let fixed = world
        .submission
        .clone()
        .with_note(world.criteria[0].id, 3_i64)
        .with_note(world.criteria[1].id, 4_i64)
        .with_note(world.criteria[2].id, 2_i64);
    let evaluation = world.evaluations.submit(fixed).unwrap();
    let notes = world
        .store
        .read(|tx| tx.notes_for(evaluation.id))
        .unwrap();
    assert_eq!(notes.len(), 3);
}

#[test]
fn duplicate_key_keeps_exactly_one_row() {
    let world = world();
    let complete = |on: NaiveDate| {
        let mut submission = world.submission.clone();
        submission.evaluated_on = Some(on.to_string());
        world
            .criteria
            .iter()
            .fold(submission, |draft, criterion| draft.with_note(criterion.id, "2"))
    };

    world.evaluations.submit(complete(day(10))).unwrap();
    let error = world.evaluations.submit(complete(day(10))).unwrap_err();
    assert!(matches!(error, SubmissionError::Duplicate));
    assert_eq!(evaluation_rows(&world.store), 1);

    world.evaluations.submit(complete(day(11))).unwrap();
    let listed = world.evaluations.list(EvaluationFilter::default()).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].evaluation.key.evaluated_on, day(11));
}
