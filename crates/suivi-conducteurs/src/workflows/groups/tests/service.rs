use std::sync::Arc;

use super::common::*;
use crate::store::InMemoryStore;
use crate::workflows::groups::{
    DirectoryError, GroupDirectory, GroupExtension, UserUpdate, UNDEFINED_FIELD,
};

#[test]
fn default_handlers_run_in_registration_order() {
    let directory = directory();
    assert_eq!(
        directory.handler_names(),
        vec!["audit-trail", "profile-provisioner", "evaluator-sync"]
    );
}

#[test]
fn creating_a_user_provisions_a_profile() {
    let directory = directory();
    let user = alice(&directory);

    let profile = directory.profile(user.id).expect("profile exists");
    assert!(profile.active);
    assert_eq!(profile.service, UNDEFINED_FIELD);
    assert_eq!(profile.position, UNDEFINED_FIELD);
}

#[test]
fn deactivating_a_user_syncs_the_profile_flag() {
    let directory = directory();
    let user = alice(&directory);

    directory
        .update_user(
            user.id,
            UserUpdate {
                is_active: Some(false),
                ..UserUpdate::default()
            },
        )
        .expect("update succeeds");

    let profile = directory.profile(user.id).expect("profile exists");
    assert!(!profile.active);
    assert_eq!(profile.service, UNDEFINED_FIELD);
}

#[test]
fn creating_a_group_attaches_default_extension() {
    let directory = directory();
    let exploitation = group(&directory, "Exploitation");

    let extension = directory
        .group_extension(exploitation.id)
        .expect("extension exists");
    assert_eq!(extension.description, "Groupe Exploitation");
    assert_eq!(extension.color, GroupExtension::DEFAULT_COLOR);
    assert_eq!(extension.access_level, 1);
    assert!(extension.active);
}

#[test]
fn blank_and_duplicate_names_are_rejected() {
    let directory = directory();
    group(&directory, "RH");

    assert!(matches!(
        directory.create_group("   "),
        Err(DirectoryError::Invalid(_))
    ));
    assert!(matches!(
        directory.create_group("RH"),
        Err(DirectoryError::Conflict(_))
    ));
}

#[test]
fn adding_members_reports_only_new_memberships() {
    let directory = directory();
    let user = alice(&directory);
    let rh = group(&directory, "RH");

    let first = directory
        .add_members(rh.id, &[user.id, user.id])
        .expect("members added");
    assert_eq!(first.user_ids, vec![user.id]);

    let second = directory.add_members(rh.id, &[user.id]).expect("no-op");
    assert!(second.user_ids.is_empty());
    assert_eq!(directory.group_history(rh.id).unwrap().len(), 1);
}

#[test]
fn unknown_user_aborts_the_whole_change() {
    let directory = directory();
    let user = alice(&directory);
    let rh = group(&directory, "RH");

    let result = directory.add_members(rh.id, &[user.id, crate::workflows::groups::UserId(99)]);
    assert!(matches!(
        result,
        Err(DirectoryError::NotFound { entity: "user", id: 99 })
    ));
    assert!(directory.user_groups(user.id).unwrap().is_empty());
    assert!(directory.group_history(rh.id).unwrap().is_empty());
}

#[test]
fn failing_handler_rolls_back_membership() {
    let mut directory = GroupDirectory::new(Arc::new(InMemoryStore::new()));
    directory.register(crate::workflows::groups::AuditTrail);
    directory.register(RejectingHandler);

    let user = alice(&directory);
    let rh = group(&directory, "RH");

    let error = directory
        .add_members(rh.id, &[user.id])
        .expect_err("handler refuses");
    assert!(matches!(
        error,
        DirectoryError::Handler {
            handler: "rejecting",
            event: "members_added",
            ..
        }
    ));
    assert!(directory.user_groups(user.id).unwrap().is_empty());
    assert!(directory.group_history(rh.id).unwrap().is_empty());
}

#[test]
fn deleting_a_group_removes_it_and_its_history() {
    let directory = directory();
    let user = alice(&directory);
    let rh = group(&directory, "RH");
    directory.add_members(rh.id, &[user.id]).unwrap();

    let deleted = directory.delete_group(rh.id).expect("group deleted");
    assert_eq!(deleted.name, "RH");
    assert!(directory.user_groups(user.id).unwrap().is_empty());
    assert!(matches!(
        directory.group_history(rh.id),
        Err(DirectoryError::NotFound { entity: "group", .. })
    ));
    assert!(matches!(
        directory.delete_group(rh.id),
        Err(DirectoryError::NotFound { .. })
    ));
}

#[test]
fn user_groups_are_ordered_by_name() {
    let directory = directory();
    let user = alice(&directory);
    let rh = group(&directory, "RH");
    let exploitation = group(&directory, "Exploitation");
    directory.add_members(rh.id, &[user.id]).unwrap();
    directory.add_members(exploitation.id, &[user.id]).unwrap();

    let names: Vec<String> = directory
        .user_groups(user.id)
        .unwrap()
        .into_iter()
        .map(|group| group.name)
        .collect();
    assert_eq!(names, vec!["Exploitation".to_string(), "RH".to_string()]);
}
