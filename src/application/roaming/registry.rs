//! Roaming provider registry: the set of partners a push fans out to

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use super::client::PushClient;
use crate::config::ProviderConfig;
use crate::domain::ids::RoamingProviderId;

struct ProviderEntry<C, T> {
    client: Arc<dyn PushClient<C, T>>,
    enabled: bool,
}

/// One fan-out slot: the provider and, when enabled, its client.
pub struct ProviderSlot<C, T> {
    pub provider_id: RoamingProviderId,
    pub client: Option<Arc<dyn PushClient<C, T>>>,
}

/// Thread-safe registry of roaming provider clients.
///
/// Owned by whoever runs the pushes; there is no process-wide instance.
pub struct RoamingProviderRegistry<C, T> {
    providers: DashMap<RoamingProviderId, ProviderEntry<C, T>>,
}

/// Shared, reference-counted provider registry
pub type SharedProviderRegistry<C, T> = Arc<RoamingProviderRegistry<C, T>>;

impl<C, T> RoamingProviderRegistry<C, T> {
    pub fn new() -> Self {
        Self {
            providers: DashMap::new(),
        }
    }

    /// Register clients, taking each one's enabled flag from `config`.
    ///
    /// Clients without a config entry are enabled. Config entries without a
    /// client are logged and skipped.
    pub fn from_config(
        config: &[ProviderConfig],
        clients: impl IntoIterator<Item = Arc<dyn PushClient<C, T>>>,
    ) -> Self {
        let registry = Self::new();
        for client in clients {
            let enabled = config
                .iter()
                .find(|p| &p.id == client.provider_id())
                .map_or(true, |p| p.enabled);
            registry.register(client, enabled);
        }
        for provider in config {
            if !registry.is_registered(&provider.id) {
                warn!(provider = %provider.id, "Configured roaming provider has no client");
            }
        }
        registry
    }

    /// Wrap in `Arc` for shared ownership
    pub fn shared(self) -> SharedProviderRegistry<C, T> {
        Arc::new(self)
    }

    /// Register a client, replacing any client with the same provider id
    pub fn register(&self, client: Arc<dyn PushClient<C, T>>, enabled: bool) {
        let provider_id = client.provider_id().clone();
        info!(provider = %provider_id, enabled, "Registering roaming provider");
        self.providers
            .insert(provider_id, ProviderEntry { client, enabled });
    }

    pub fn unregister(&self, provider_id: &RoamingProviderId) {
        if self.providers.remove(provider_id).is_some() {
            info!(provider = %provider_id, "Unregistered roaming provider");
        } else {
            warn!(provider = %provider_id, "Attempted to unregister unknown roaming provider");
        }
    }

    /// Enable or disable a provider; `false` if it is not registered.
    pub fn set_enabled(&self, provider_id: &RoamingProviderId, enabled: bool) -> bool {
        match self.providers.get_mut(provider_id) {
            Some(mut entry) => {
                entry.enabled = enabled;
                info!(provider = %provider_id, enabled, "Roaming provider state changed");
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, provider_id: &RoamingProviderId) -> bool {
        self.providers.contains_key(provider_id)
    }

    pub fn is_enabled(&self, provider_id: &RoamingProviderId) -> bool {
        self.providers
            .get(provider_id)
            .map_or(false, |entry| entry.enabled)
    }

    /// Number of registered providers
    pub fn count(&self) -> usize {
        self.providers.len()
    }

    /// Fan-out slots sorted by provider id.
    ///
    /// The order is fixed by the ids, not by registration or map order, so
    /// repeated pushes merge in the same order.
    pub fn slots(&self) -> Vec<ProviderSlot<C, T>> {
        let mut slots: Vec<ProviderSlot<C, T>> = self
            .providers
            .iter()
            .map(|entry| ProviderSlot {
                provider_id: entry.key().clone(),
                client: entry.enabled.then(|| entry.client.clone()),
            })
            .collect();
        slots.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));
        slots
    }
}

impl<C, T> Default for RoamingProviderRegistry<C, T> {
    fn default() -> Self {
        Self::new()
    }
}
