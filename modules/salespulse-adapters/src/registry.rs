use std::collections::HashMap;
use std::sync::Arc;

use salespulse_common::{IngestError, Platform};

use crate::adapter::WebhookAdapter;
use crate::{BraipAdapter, CaktoAdapter, HublaAdapter, KirvanoAdapter};

/// Build the adapter for a platform.
pub fn build_adapter(platform: Platform) -> Arc<dyn WebhookAdapter> {
    match platform {
        Platform::Braip => Arc::new(BraipAdapter),
        Platform::Hubla => Arc::new(HublaAdapter),
        Platform::Kirvano => Arc::new(KirvanoAdapter),
        Platform::Cakto => Arc::new(CaktoAdapter),
    }
}

/// Adapters keyed by platform. The route's platform segment is the only
/// input used to pick one; payloads are never sniffed.
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<Platform, Arc<dyn WebhookAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for platform in Platform::ALL {
            registry.register(build_adapter(platform));
        }
        registry
    }
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register (or replace) the adapter for its platform.
    pub fn register(&mut self, adapter: Arc<dyn WebhookAdapter>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn WebhookAdapter>> {
        self.adapters.get(&platform).cloned()
    }

    /// Resolve a route hint such as `"hubla"` to its adapter.
    pub fn resolve(&self, hint: &str) -> Result<Arc<dyn WebhookAdapter>, IngestError> {
        let platform: Platform = hint.parse()?;
        self.get(platform)
            .ok_or_else(|| IngestError::UnknownPlatform(hint.to_string()))
    }

    /// Registered platforms in their fixed order.
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.adapters.keys().copied().collect();
        platforms.sort();
        platforms
    }
}
