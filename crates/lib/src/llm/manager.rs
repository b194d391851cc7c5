//! Provider manager: a fixed, priority-ordered provider list with either
//! a static pin or health-probing failover.
//!
//! Priority order is a declared preference set at startup. In auto mode
//! every call re-probes health (no caching) so selection always reflects
//! current backend availability; probes are fast relative to generation.

use crate::llm::{GenerationOptions, LlmError, LlmProvider, ModelHandle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// How `get_llm` picks a provider. Configured once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Pin to the configured provider name; no health probing.
    Static,
    /// Probe providers in ascending priority order; first healthy wins.
    #[default]
    Auto,
}

pub struct ProviderManager {
    /// Sorted ascending by priority at construction; immutable afterwards.
    providers: Vec<Arc<dyn LlmProvider>>,
    mode: SelectionMode,
    static_provider: String,
    health_timeout: Duration,
}

impl ProviderManager {
    pub fn new(
        mut providers: Vec<Arc<dyn LlmProvider>>,
        mode: SelectionMode,
        static_provider: impl Into<String>,
        health_timeout: Duration,
    ) -> Self {
        providers.sort_by_key(|p| p.priority());
        Self {
            providers,
            mode,
            static_provider: static_provider.into(),
            health_timeout,
        }
    }

    /// Resolve a live model handle according to the selection mode.
    pub async fn get_llm(&self, options: &GenerationOptions) -> Result<ModelHandle, LlmError> {
        match self.mode {
            SelectionMode::Static => self.get_static(options),
            SelectionMode::Auto => self.get_auto(options).await,
        }
    }

    fn get_static(&self, options: &GenerationOptions) -> Result<ModelHandle, LlmError> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.name() == self.static_provider)
            .ok_or_else(|| LlmError::StaticProviderNotFound(self.static_provider.clone()))?;
        log::info!("using static llm provider: {}", provider.name());
        Ok(provider.get_llm(options))
    }

    async fn get_auto(&self, options: &GenerationOptions) -> Result<ModelHandle, LlmError> {
        for provider in &self.providers {
            if provider.check_health(self.health_timeout).await {
                log::info!("selected healthy llm provider: {}", provider.name());
                return Ok(provider.get_llm(options));
            }
        }
        Err(LlmError::NoHealthyProvider)
    }

    /// Probe every provider unconditionally, independent of the selection
    /// mode. Used by the operational status surface.
    pub async fn check_all_providers(&self) -> BTreeMap<String, bool> {
        let mut status = BTreeMap::new();
        for provider in &self.providers {
            let healthy = provider.check_health(self.health_timeout).await;
            status.insert(provider.name().to_string(), healthy);
        }
        status
    }
}
