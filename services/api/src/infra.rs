use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use suivi_conducteurs::config::EvaluatorPolicy;
use suivi_conducteurs::store::InMemoryStore;
use suivi_conducteurs::workflows::evaluations::EvaluationService;
use suivi_conducteurs::workflows::evaluators::EvaluatorDirectory;
use suivi_conducteurs::workflows::groups::GroupDirectory;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Workflow services sharing one store.
#[derive(Clone)]
pub(crate) struct Workflows {
    pub(crate) groups: Arc<GroupDirectory<InMemoryStore>>,
    pub(crate) evaluators: Arc<EvaluatorDirectory<InMemoryStore>>,
    pub(crate) evaluations: Arc<EvaluationService<InMemoryStore>>,
}

impl Workflows {
    pub(crate) fn in_memory(policy: EvaluatorPolicy) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            groups: Arc::new(GroupDirectory::with_default_handlers(store.clone(), policy)),
            evaluators: Arc::new(EvaluatorDirectory::new(store.clone())),
            evaluations: Arc::new(EvaluationService::new(store)),
        }
    }
}
