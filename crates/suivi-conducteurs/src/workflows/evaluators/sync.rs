use tracing::{debug, info, warn};

use super::domain::{Evaluator, NewEvaluator};
use super::repository::{EvaluatorRepository, ServiceRepository};
use super::resolver::{evaluator_groups, ServiceResolver};
use crate::config::{EvaluatorPolicy, EvaluatorRetention};
use crate::store::RepositoryError;
use crate::workflows::groups::{DirectoryEvent, DirectoryEventHandler, DirectoryRepository, UserId};

/// Direction of the membership change being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipTrigger {
    Added,
    Removed,
}

/// What a reconciliation did to the user's evaluator record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    UnknownUser,
    LookupFailed,
    NotEvaluator,
    NoServiceResolved,
    Created(Evaluator),
    Updated(Evaluator),
    Unchanged,
    Retained,
    Deactivated(Evaluator),
}

/// Creates and updates evaluator records from RH / Exploitation membership.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvaluatorSynchronizer {
    resolver: ServiceResolver,
    policy: EvaluatorPolicy,
}

impl EvaluatorSynchronizer {
    pub fn new(policy: EvaluatorPolicy) -> Self {
        Self {
            resolver: ServiceResolver,
            policy,
        }
    }

    /// Lookup failures skip the user; write failures abort the transaction.
    pub fn sync_user<Tx>(
        &self,
        tx: &mut Tx,
        user_id: UserId,
        trigger: MembershipTrigger,
    ) -> Result<SyncOutcome, RepositoryError>
    where
        Tx: DirectoryRepository + ServiceRepository + EvaluatorRepository,
    {
        let user = match tx.user(user_id) {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!(%user_id, "user vanished before evaluator sync");
                return Ok(SyncOutcome::UnknownUser);
            }
            Err(error) => return Ok(lookup_failed(user_id, error)),
        };

        let names: Vec<String> = match tx.groups_for_user(user_id) {
            Ok(groups) => groups.into_iter().map(|group| group.name).collect(),
            Err(error) => return Ok(lookup_failed(user_id, error)),
        };
        let groups = evaluator_groups(names);

        let existing = match tx.evaluator_for_user(user_id) {
            Ok(existing) => existing,
            Err(error) => return Ok(lookup_failed(user_id, error)),
        };

        match (existing, groups.is_empty()) {
            (None, true) => Ok(SyncOutcome::NotEvaluator),
            (Some(evaluator), true) => match trigger {
                MembershipTrigger::Added => Ok(SyncOutcome::Unchanged),
                MembershipTrigger::Removed => self.release(tx, evaluator, &user.username),
            },
            (None, false) => {
                let Some(service) = self.resolver.resolve(tx, &groups) else {
                    return Ok(SyncOutcome::NoServiceResolved);
                };
                let evaluator = tx.insert_evaluator(NewEvaluator::for_user(&user, &service))?;
                info!(
                    username = %user.username,
                    service = %service.name,
                    "evaluator created from group membership"
                );
                Ok(SyncOutcome::Created(evaluator))
            }
            (Some(mut evaluator), false) => {
                let mut changed = false;
                if let Some(service) = self.resolver.resolve(tx, &groups) {
                    if evaluator.service_id != service.id {
                        evaluator.service_id = service.id;
                        changed = true;
                        info!(
                            username = %user.username,
                            service = %service.name,
                            "evaluator service updated"
                        );
                    }
                }
                if !evaluator.active {
                    evaluator.active = true;
                    changed = true;
                    info!(username = %user.username, "evaluator reactivated");
                }

                if changed {
                    tx.update_evaluator(evaluator.clone())?;
                    Ok(SyncOutcome::Updated(evaluator))
                } else {
                    Ok(SyncOutcome::Unchanged)
                }
            }
        }
    }

    /// The user left every evaluator group; the record is never deleted.
    fn release<Tx>(
        &self,
        tx: &mut Tx,
        mut evaluator: Evaluator,
        username: &str,
    ) -> Result<SyncOutcome, RepositoryError>
    where
        Tx: EvaluatorRepository,
    {
        match self.policy.retention {
            EvaluatorRetention::Retain => {
                info!(%username, "user left evaluator groups; evaluator kept");
                Ok(SyncOutcome::Retained)
            }
            EvaluatorRetention::Deactivate if evaluator.active => {
                evaluator.active = false;
                tx.update_evaluator(evaluator.clone())?;
                info!(%username, "user left evaluator groups; evaluator deactivated");
                Ok(SyncOutcome::Deactivated(evaluator))
            }
            EvaluatorRetention::Deactivate => Ok(SyncOutcome::Unchanged),
        }
    }
}

fn lookup_failed(user_id: UserId, error: RepositoryError) -> SyncOutcome {
    warn!(%user_id, %error, "evaluator sync lookup failed; user skipped");
    SyncOutcome::LookupFailed
}

impl<Tx> DirectoryEventHandler<Tx> for EvaluatorSynchronizer
where
    Tx: DirectoryRepository + ServiceRepository + EvaluatorRepository,
{
    fn name(&self) -> &'static str {
        "evaluator-sync"
    }

    fn handle(&self, tx: &mut Tx, event: &DirectoryEvent) -> Result<(), RepositoryError> {
        let (user_ids, trigger) = match event {
            DirectoryEvent::MembersAdded { user_ids, .. } => (user_ids, MembershipTrigger::Added),
            DirectoryEvent::MembersRemoved { user_ids, .. } => {
                (user_ids, MembershipTrigger::Removed)
            }
            _ => return Ok(()),
        };

        for &user_id in user_ids {
            let outcome = self.sync_user(tx, user_id, trigger)?;
            debug!(%user_id, ?outcome, "evaluator sync");
        }
        Ok(())
    }
}
