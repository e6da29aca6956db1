use std::collections::BTreeSet;

use tracing::{info, warn};

use super::domain::Service;
use super::repository::ServiceRepository;
use crate::store::RepositoryError;

/// Maps an evaluator group to the service its members belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRoute {
    pub group: &'static str,
    pub service_name: &'static str,
    pub abbreviation: &'static str,
}

/// Evaluator groups, highest priority first.
pub const EVALUATOR_GROUPS: [ServiceRoute; 2] = [
    ServiceRoute {
        group: "RH",
        service_name: "Ressources Humaines",
        abbreviation: "RH",
    },
    ServiceRoute {
        group: "Exploitation",
        service_name: "Exploitation",
        abbreviation: "EXP",
    },
];

/// Keeps only the names of evaluator groups.
pub fn evaluator_groups<I, N>(group_names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    group_names
        .into_iter()
        .filter(|name| {
            EVALUATOR_GROUPS
                .iter()
                .any(|route| route.group == name.as_ref())
        })
        .map(|name| name.as_ref().to_string())
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceResolutionError {
    #[error("service '{service}' could not be loaded or created: {source}")]
    Store {
        service: &'static str,
        #[source]
        source: RepositoryError,
    },
    #[error("service '{service}' conflicted on insert but cannot be read back")]
    Vanished { service: &'static str },
}

/// Picks and lazily creates the service owning a user's evaluator record.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceResolver;

impl ServiceResolver {
    pub fn route_for(&self, groups: &BTreeSet<String>) -> Option<&'static ServiceRoute> {
        EVALUATOR_GROUPS
            .iter()
            .find(|route| groups.contains(route.group))
    }

    /// Resolves the service, swallowing store failures.
    ///
    /// A failure is logged and reported as `None` so the caller carries on as
    /// if no service applied.
    pub fn resolve<R>(&self, repository: &mut R, groups: &BTreeSet<String>) -> Option<Service>
    where
        R: ServiceRepository + ?Sized,
    {
        match self.try_resolve(repository, groups) {
            Ok(service) => service,
            Err(error) => {
                warn!(%error, ?groups, "service resolution failed; no service assigned");
                None
            }
        }
    }

    pub fn try_resolve<R>(
        &self,
        repository: &mut R,
        groups: &BTreeSet<String>,
    ) -> Result<Option<Service>, ServiceResolutionError>
    where
        R: ServiceRepository + ?Sized,
    {
        match self.route_for(groups) {
            Some(route) => get_or_create(repository, route).map(Some),
            None => Ok(None),
        }
    }
}

/// Lookup then insert; a unique-name conflict means another writer won and
/// the existing row is returned.
fn get_or_create<R>(
    repository: &mut R,
    route: &'static ServiceRoute,
) -> Result<Service, ServiceResolutionError>
where
    R: ServiceRepository + ?Sized,
{
    let store_error = |source| ServiceResolutionError::Store {
        service: route.service_name,
        source,
    };

    if let Some(existing) = repository
        .service_by_name(route.service_name)
        .map_err(store_error)?
    {
        return Ok(existing);
    }

    match repository.insert_service(route.service_name, route.abbreviation) {
        Ok(service) => {
            info!(service = %service.name, abbreviation = %service.abbreviation, "service created");
            Ok(service)
        }
        Err(RepositoryError::Conflict) => repository
            .service_by_name(route.service_name)
            .map_err(store_error)?
            .ok_or(ServiceResolutionError::Vanished {
                service: route.service_name,
            }),
        Err(source) => Err(store_error(source)),
    }
}
