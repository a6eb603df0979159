//! Model configuration
//!
//! Controls which checks `build()` runs. The effective configuration is the
//! thread-local override installed by [`ModelConfig::scope`] if one is active,
//! otherwise the process-wide default set by [`ModelConfig::install`].

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::Arc;

/// What `build()` does once a check has failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationPolicy {
    /// Run every check and report all violations together
    #[default]
    CollectAll,
    /// Stop at the first violation
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelConfig {
    /// Run the semantic checks (choice membership, reference targets,
    /// code bindings, empty leaves, primitive formats).
    pub validating: bool,
    pub check_reference_types: bool,
    pub check_fixed_code_bindings: bool,
    pub violation_policy: ViolationPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            validating: true,
            check_reference_types: true,
            check_fixed_code_bindings: true,
            violation_policy: ViolationPolicy::CollectAll,
        }
    }
}

static GLOBAL: Lazy<RwLock<Arc<ModelConfig>>> =
    Lazy::new(|| RwLock::new(Arc::new(ModelConfig::default())));

thread_local! {
    static SCOPED: RefCell<Option<Arc<ModelConfig>>> = const { RefCell::new(None) };
}

impl ModelConfig {
    /// Configuration with every semantic check switched off
    pub fn lenient() -> Self {
        Self {
            validating: false,
            ..Self::default()
        }
    }

    pub fn fail_fast() -> Self {
        Self {
            violation_policy: ViolationPolicy::FailFast,
            ..Self::default()
        }
    }

    /// Parse a configuration from YAML; missing keys take their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// The configuration `build()` calls on this thread will use
    pub fn current() -> Arc<ModelConfig> {
        SCOPED
            .with(|scoped| scoped.borrow().clone())
            .unwrap_or_else(|| GLOBAL.read().clone())
    }

    /// Replace the process-wide default
    pub fn install(self) {
        tracing::debug!(config = ?self, "installing global model configuration");
        *GLOBAL.write() = Arc::new(self);
    }

    /// Run `f` with this configuration active on the current thread only.
    ///
    /// Scopes nest; the previous override is restored when `f` returns.
    pub fn scope<R>(self, f: impl FnOnce() -> R) -> R {
        let previous = SCOPED.with(|scoped| scoped.replace(Some(Arc::new(self))));
        let _restore = RestoreScope(previous);
        f()
    }

    pub(crate) fn checks_references(&self) -> bool {
        self.validating && self.check_reference_types
    }

    pub(crate) fn checks_bindings(&self) -> bool {
        self.validating && self.check_fixed_code_bindings
    }
}

struct RestoreScope(Option<Arc<ModelConfig>>);

impl Drop for RestoreScope {
    fn drop(&mut self) {
        let previous = self.0.take();
        SCOPED.with(|scoped| *scoped.borrow_mut() = previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate_everything() {
        let config = ModelConfig::default();
        assert!(config.validating);
        assert!(config.checks_references());
        assert!(config.checks_bindings());
        assert_eq!(config.violation_policy, ViolationPolicy::CollectAll);
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = ModelConfig::from_yaml_str(
            "checkReferenceTypes: false\nviolationPolicy: fail-fast\n",
        )
        .unwrap();

        assert!(config.validating);
        assert!(!config.check_reference_types);
        assert!(!config.checks_references());
        assert_eq!(config.violation_policy, ViolationPolicy::FailFast);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_policy() {
        let err = ModelConfig::from_yaml_str("violationPolicy: sometimes\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_scope_overrides_and_restores() {
        assert!(ModelConfig::current().validating);

        ModelConfig::lenient().scope(|| {
            assert!(!ModelConfig::current().validating);

            ModelConfig::fail_fast().scope(|| {
                let inner = ModelConfig::current();
                assert!(inner.validating);
                assert_eq!(inner.violation_policy, ViolationPolicy::FailFast);
            });

            assert!(!ModelConfig::current().validating);
        });

        assert!(ModelConfig::current().validating);
    }
}
