use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::{RepositoryError, UnitOfWork};
use crate::workflows::evaluations::{
    Company, CompanyId, Criterion, CriterionId, Driver, DriverId, Evaluation, EvaluationId,
    EvaluationKey, EvaluationRepository, EvaluationType, EvaluationTypeId, NewCriterion,
    NewDriver, NewEvaluation, Note, NoteId, Site, SiteId,
};
use crate::workflows::evaluators::{
    Evaluator, EvaluatorId, EvaluatorRepository, NewEvaluator, Service, ServiceId,
    ServiceRepository,
};
use crate::workflows::groups::domain::{HistoryEntryId, NewHistoryEntry};
use crate::workflows::groups::{
    DirectoryRepository, Group, GroupExtension, GroupHistoryEntry, GroupId, NewPermission,
    NewUser, Permission, PermissionId, User, UserId, UserProfile,
};

/// Per-table id counters. Ids start at 1 and are never reused.
#[derive(Debug, Clone, Default)]
struct Sequences {
    counters: BTreeMap<&'static str, u64>,
}

impl Sequences {
    fn next(&mut self, table: &'static str) -> u64 {
        let counter = self.counters.entry(table).or_insert(0);
        *counter += 1;
        *counter
    }
}

/// Every row of the application, as one cloneable value.
///
/// `Tables` is both the committed state and the transaction handle: a unit of
/// work mutates a clone and the clone replaces the committed state on success.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    users: BTreeMap<UserId, User>,
    groups: BTreeMap<GroupId, Group>,
    permissions: BTreeMap<PermissionId, Permission>,
    memberships: BTreeSet<(GroupId, UserId)>,
    group_permissions: BTreeSet<(GroupId, PermissionId)>,
    history: Vec<GroupHistoryEntry>,
    profiles: BTreeMap<UserId, UserProfile>,
    group_extensions: BTreeMap<GroupId, GroupExtension>,
    services: BTreeMap<ServiceId, Service>,
    evaluators: BTreeMap<EvaluatorId, Evaluator>,
    companies: BTreeMap<CompanyId, Company>,
    sites: BTreeMap<SiteId, Site>,
    drivers: BTreeMap<DriverId, Driver>,
    evaluation_types: BTreeMap<EvaluationTypeId, EvaluationType>,
    criteria: BTreeMap<CriterionId, Criterion>,
    evaluations: BTreeMap<EvaluationId, Evaluation>,
    notes: BTreeMap<NoteId, Note>,
    sequences: Sequences,
}

/// Process-local store backing the API and the tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl UnitOfWork for InMemoryStore {
    type Tx = Tables;

    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut committed = self.lock()?;
        let mut staged = committed.clone();
        let value = work(&mut staged)?;
        *committed = staged;
        Ok(value)
    }

    fn read<T, E, F>(&self, query: F) -> Result<T, E>
    where
        F: FnOnce(&Self::Tx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let committed = self.lock()?;
        query(&*committed)
    }
}

fn require<K: Ord, V>(table: &BTreeMap<K, V>, key: &K) -> Result<(), RepositoryError> {
    if table.contains_key(key) {
        Ok(())
    } else {
        Err(RepositoryError::NotFound)
    }
}

impl DirectoryRepository for Tables {
    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.get(&id).cloned())
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, RepositoryError> {
        if self.users.values().any(|known| known.username == user.username) {
            return Err(RepositoryError::Conflict);
        }
        let user = User {
            id: UserId(self.sequences.next("users")),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_user(&mut self, user: User) -> Result<(), RepositoryError> {
        require(&self.users, &user.id)?;
        if self
            .users
            .values()
            .any(|known| known.id != user.id && known.username == user.username)
        {
            return Err(RepositoryError::Conflict);
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    fn group(&self, id: GroupId) -> Result<Option<Group>, RepositoryError> {
        Ok(self.groups.get(&id).cloned())
    }

    fn group_by_name(&self, name: &str) -> Result<Option<Group>, RepositoryError> {
        Ok(self.groups.values().find(|group| group.name == name).cloned())
    }

    fn insert_group(&mut self, name: &str) -> Result<Group, RepositoryError> {
        if self.group_by_name(name)?.is_some() {
            return Err(RepositoryError::Conflict);
        }
        let group = Group {
            id: GroupId(self.sequences.next("groups")),
            name: name.to_string(),
        };
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    fn delete_group(&mut self, id: GroupId) -> Result<Group, RepositoryError> {
        let group = self.groups.remove(&id).ok_or(RepositoryError::NotFound)?;
        self.memberships.retain(|(group_id, _)| *group_id != id);
        self.group_permissions.retain(|(group_id, _)| *group_id != id);
        self.group_extensions.remove(&id);
        self.history.retain(|entry| entry.group_id != id);
        Ok(group)
    }

    fn permission(&self, id: PermissionId) -> Result<Option<Permission>, RepositoryError> {
        Ok(self.permissions.get(&id).cloned())
    }

    fn insert_permission(
        &mut self,
        permission: NewPermission,
    ) -> Result<Permission, RepositoryError> {
        if self
            .permissions
            .values()
            .any(|known| known.codename == permission.codename)
        {
            return Err(RepositoryError::Conflict);
        }
        let permission = Permission {
            id: PermissionId(self.sequences.next("permissions")),
            codename: permission.codename,
            name: permission.name,
        };
        self.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    fn add_member(&mut self, group: GroupId, user: UserId) -> Result<bool, RepositoryError> {
        require(&self.groups, &group)?;
        require(&self.users, &user)?;
        Ok(self.memberships.insert((group, user)))
    }

    fn remove_member(&mut self, group: GroupId, user: UserId) -> Result<bool, RepositoryError> {
        Ok(self.memberships.remove(&(group, user)))
    }

    fn groups_for_user(&self, user: UserId) -> Result<Vec<Group>, RepositoryError> {
        let mut groups: Vec<Group> = self
            .memberships
            .iter()
            .filter(|(_, member)| *member == user)
            .filter_map(|(group_id, _)| self.groups.get(group_id).cloned())
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    fn grant_permission(
        &mut self,
        group: GroupId,
        permission: PermissionId,
    ) -> Result<bool, RepositoryError> {
        require(&self.groups, &group)?;
        require(&self.permissions, &permission)?;
        Ok(self.group_permissions.insert((group, permission)))
    }

    fn revoke_permission(
        &mut self,
        group: GroupId,
        permission: PermissionId,
    ) -> Result<bool, RepositoryError> {
        Ok(self.group_permissions.remove(&(group, permission)))
    }

    fn group_permissions(&self, group: GroupId) -> Result<BTreeSet<PermissionId>, RepositoryError> {
        Ok(self
            .group_permissions
            .iter()
            .filter(|(group_id, _)| *group_id == group)
            .map(|(_, permission)| *permission)
            .collect())
    }

    fn record_history(
        &mut self,
        entry: NewHistoryEntry,
    ) -> Result<GroupHistoryEntry, RepositoryError> {
        require(&self.groups, &entry.group_id)?;
        let entry = GroupHistoryEntry {
            id: HistoryEntryId(self.sequences.next("group_history")),
            group_id: entry.group_id,
            action: entry.action,
            target_user: entry.target_user,
            target_permission: entry.target_permission,
            details: entry.details,
            recorded_at: Utc::now(),
        };
        self.history.push(entry.clone());
        Ok(entry)
    }

    fn history(&self, group: GroupId) -> Result<Vec<GroupHistoryEntry>, RepositoryError> {
        Ok(self
            .history
            .iter()
            .filter(|entry| entry.group_id == group)
            .cloned()
            .collect())
    }

    fn profile(&self, user: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.profiles.get(&user).cloned())
    }

    fn save_profile(&mut self, profile: UserProfile) -> Result<(), RepositoryError> {
        require(&self.users, &profile.user_id)?;
        self.profiles.insert(profile.user_id, profile);
        Ok(())
    }

    fn group_extension(&self, group: GroupId) -> Result<Option<GroupExtension>, RepositoryError> {
        Ok(self.group_extensions.get(&group).cloned())
    }

    fn save_group_extension(&mut self, extension: GroupExtension) -> Result<(), RepositoryError> {
        require(&self.groups, &extension.group_id)?;
        self.group_extensions.insert(extension.group_id, extension);
        Ok(())
    }
}

impl ServiceRepository for Tables {
    fn service(&self, id: ServiceId) -> Result<Option<Service>, RepositoryError> {
        Ok(self.services.get(&id).cloned())
    }

    fn service_by_name(&self, name: &str) -> Result<Option<Service>, RepositoryError> {
        Ok(self
            .services
            .values()
            .find(|service| service.name == name)
            .cloned())
    }

    fn insert_service(
        &mut self,
        name: &str,
        abbreviation: &str,
    ) -> Result<Service, RepositoryError> {
        if self.service_by_name(name)?.is_some() {
            return Err(RepositoryError::Conflict);
        }
        let service = Service {
            id: ServiceId(self.sequences.next("services")),
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
        };
        self.services.insert(service.id, service.clone());
        Ok(service)
    }

    fn services(&self) -> Result<Vec<Service>, RepositoryError> {
        let mut services: Vec<Service> = self.services.values().cloned().collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }
}

impl EvaluatorRepository for Tables {
    fn evaluator(&self, id: EvaluatorId) -> Result<Option<Evaluator>, RepositoryError> {
        Ok(self.evaluators.get(&id).cloned())
    }

    fn evaluator_for_user(&self, user: UserId) -> Result<Option<Evaluator>, RepositoryError> {
        Ok(self
            .evaluators
            .values()
            .find(|evaluator| evaluator.user_id == user)
            .cloned())
    }

    fn insert_evaluator(&mut self, evaluator: NewEvaluator) -> Result<Evaluator, RepositoryError> {
        require(&self.users, &evaluator.user_id)?;
        require(&self.services, &evaluator.service_id)?;
        if self.evaluator_for_user(evaluator.user_id)?.is_some() {
            return Err(RepositoryError::Conflict);
        }
        let evaluator = Evaluator {
            id: EvaluatorId(self.sequences.next("evaluators")),
            user_id: evaluator.user_id,
            name: evaluator.name,
            first_name: evaluator.first_name,
            service_id: evaluator.service_id,
            active: true,
        };
        self.evaluators.insert(evaluator.id, evaluator.clone());
        Ok(evaluator)
    }

    fn update_evaluator(&mut self, evaluator: Evaluator) -> Result<(), RepositoryError> {
        require(&self.evaluators, &evaluator.id)?;
        require(&self.services, &evaluator.service_id)?;
        if self
            .evaluators
            .values()
            .any(|known| known.id != evaluator.id && known.user_id == evaluator.user_id)
        {
            return Err(RepositoryError::Conflict);
        }
        self.evaluators.insert(evaluator.id, evaluator);
        Ok(())
    }

    fn evaluators(&self) -> Result<Vec<Evaluator>, RepositoryError> {
        Ok(self.evaluators.values().cloned().collect())
    }
}

impl EvaluationRepository for Tables {
    fn company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(self.companies.get(&id).cloned())
    }

    fn insert_company(&mut self, name: &str) -> Result<Company, RepositoryError> {
        let company = Company {
            id: CompanyId(self.sequences.next("companies")),
            name: name.to_string(),
        };
        self.companies.insert(company.id, company.clone());
        Ok(company)
    }

    fn site(&self, id: SiteId) -> Result<Option<Site>, RepositoryError> {
        Ok(self.sites.get(&id).cloned())
    }

    fn insert_site(&mut self, name: &str) -> Result<Site, RepositoryError> {
        let site = Site {
            id: SiteId(self.sequences.next("sites")),
            name: name.to_string(),
        };
        self.sites.insert(site.id, site.clone());
        Ok(site)
    }

    fn driver(&self, id: DriverId) -> Result<Option<Driver>, RepositoryError> {
        Ok(self.drivers.get(&id).cloned())
    }

    fn insert_driver(&mut self, driver: NewDriver) -> Result<Driver, RepositoryError> {
        require(&self.companies, &driver.company_id)?;
        require(&self.sites, &driver.site_id)?;
        let driver = Driver {
            id: DriverId(self.sequences.next("drivers")),
            last_name: driver.last_name,
            first_name: driver.first_name,
            active: driver.active,
            company_id: driver.company_id,
            site_id: driver.site_id,
        };
        self.drivers.insert(driver.id, driver.clone());
        Ok(driver)
    }

    fn drivers(&self, active_only: bool) -> Result<Vec<Driver>, RepositoryError> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .values()
            .filter(|driver| driver.active || !active_only)
            .cloned()
            .collect();
        drivers.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(drivers)
    }

    fn evaluation_type(
        &self,
        id: EvaluationTypeId,
    ) -> Result<Option<EvaluationType>, RepositoryError> {
        Ok(self.evaluation_types.get(&id).cloned())
    }

    fn insert_evaluation_type(&mut self, name: &str) -> Result<EvaluationType, RepositoryError> {
        if self
            .evaluation_types
            .values()
            .any(|known| known.name == name)
        {
            return Err(RepositoryError::Conflict);
        }
        let evaluation_type = EvaluationType {
            id: EvaluationTypeId(self.sequences.next("evaluation_types")),
            name: name.to_string(),
        };
        self.evaluation_types
            .insert(evaluation_type.id, evaluation_type.clone());
        Ok(evaluation_type)
    }

    fn evaluation_types(&self) -> Result<Vec<EvaluationType>, RepositoryError> {
        let mut types: Vec<EvaluationType> = self.evaluation_types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    fn criterion(&self, id: CriterionId) -> Result<Option<Criterion>, RepositoryError> {
        Ok(self.criteria.get(&id).cloned())
    }

    fn insert_criterion(&mut self, criterion: NewCriterion) -> Result<Criterion, RepositoryError> {
        require(&self.evaluation_types, &criterion.evaluation_type_id)?;
        if criterion.min > criterion.max {
            return Err(RepositoryError::Invalid(format!(
                "criterion '{}' has min {} above max {}",
                criterion.name, criterion.min, criterion.max
            )));
        }
        let criterion = Criterion {
            id: CriterionId(self.sequences.next("criteria")),
            evaluation_type_id: criterion.evaluation_type_id,
            name: criterion.name,
            min: criterion.min,
            max: criterion.max,
            active: criterion.active,
        };
        self.criteria.insert(criterion.id, criterion.clone());
        Ok(criterion)
    }

    fn criteria_for_type(
        &self,
        evaluation_type: EvaluationTypeId,
        active_only: bool,
    ) -> Result<Vec<Criterion>, RepositoryError> {
        let mut criteria: Vec<Criterion> = self
            .criteria
            .values()
            .filter(|criterion| criterion.evaluation_type_id == evaluation_type)
            .filter(|criterion| criterion.active || !active_only)
            .cloned()
            .collect();
        criteria.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(criteria)
    }

    fn evaluation(&self, id: EvaluationId) -> Result<Option<Evaluation>, RepositoryError> {
        Ok(self.evaluations.get(&id).cloned())
    }

    fn evaluation_by_key(
        &self,
        key: &EvaluationKey,
    ) -> Result<Option<Evaluation>, RepositoryError> {
        Ok(self
            .evaluations
            .values()
            .find(|evaluation| evaluation.key == *key)
            .cloned())
    }

    fn insert_evaluation(
        &mut self,
        evaluation: NewEvaluation,
    ) -> Result<Evaluation, RepositoryError> {
        let key = evaluation.key;
        require(&self.drivers, &key.driver_id)?;
        require(&self.evaluators, &key.evaluator_id)?;
        require(&self.evaluation_types, &key.evaluation_type_id)?;
        if self.evaluation_by_key(&key)?.is_some() {
            return Err(RepositoryError::Conflict);
        }

        let mut seen = BTreeSet::new();
        for note in &evaluation.notes {
            let criterion = self
                .criteria
                .get(&note.criterion_id)
                .filter(|criterion| criterion.evaluation_type_id == key.evaluation_type_id)
                .ok_or_else(|| {
                    RepositoryError::Invalid(format!(
                        "criterion {} does not belong to evaluation type {}",
                        note.criterion_id, key.evaluation_type_id
                    ))
                })?;
            if !criterion.accepts(i64::from(note.value)) {
                return Err(RepositoryError::Invalid(format!(
                    "note {} for criterion {} is outside [{}, {}]",
                    note.value, criterion.id, criterion.min, criterion.max
                )));
            }
            if !seen.insert(note.criterion_id) {
                return Err(RepositoryError::Invalid(format!(
                    "criterion {} is noted twice",
                    note.criterion_id
                )));
            }
        }

        let stored = Evaluation {
            id: EvaluationId(self.sequences.next("evaluations")),
            key,
        };
        self.evaluations.insert(stored.id, stored.clone());
        for note in evaluation.notes {
            let note = Note {
                id: NoteId(self.sequences.next("notes")),
                evaluation_id: stored.id,
                criterion_id: note.criterion_id,
                value: note.value,
            };
            self.notes.insert(note.id, note);
        }
        Ok(stored)
    }

    fn delete_evaluation(&mut self, id: EvaluationId) -> Result<Evaluation, RepositoryError> {
        let evaluation = self
            .evaluations
            .remove(&id)
            .ok_or(RepositoryError::NotFound)?;
        self.notes.retain(|_, note| note.evaluation_id != id);
        Ok(evaluation)
    }

    fn evaluations(&self) -> Result<Vec<Evaluation>, RepositoryError> {
        Ok(self.evaluations.values().cloned().collect())
    }

    fn notes_for(&self, evaluation: EvaluationId) -> Result<Vec<Note>, RepositoryError> {
        Ok(self
            .notes
            .values()
            .filter(|note| note.evaluation_id == evaluation)
            .cloned()
            .collect())
    }
}
