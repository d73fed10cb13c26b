use a2ui::errors::AgentResult;
use a2ui::providers::base::Provider;
use a2ui::samples::{build_app, App, Sample, SampleOptions};
use a2ui::stores::Stores;
use std::collections::HashMap;
use std::sync::Arc;
use strum::IntoEnumIterator;

/// Shared application state: one ready-built app per sample
#[derive(Clone)]
pub struct AppState {
    apps: Arc<HashMap<Sample, Arc<dyn App>>>,
}

impl AppState {
    pub fn new(apps: HashMap<Sample, Arc<dyn App>>) -> Self {
        Self {
            apps: Arc::new(apps),
        }
    }

    /// Build every sample against the same provider and stores
    pub fn from_provider(
        provider: Arc<dyn Provider>,
        stores: &Stores,
        options: &SampleOptions,
    ) -> AgentResult<Self> {
        let mut apps = HashMap::new();
        for sample in Sample::iter() {
            let app = build_app(sample, provider.clone(), stores, options)?;
            apps.insert(sample, Arc::from(app));
        }
        Ok(Self::new(apps))
    }

    pub fn app(&self, sample: Sample) -> Option<Arc<dyn App>> {
        self.apps.get(&sample).cloned()
    }

    /// Samples this server answers for, in declaration order
    pub fn samples(&self) -> Vec<Sample> {
        Sample::iter().filter(|s| self.apps.contains_key(s)).collect()
    }
}
