//! Resolution Facade
//!
//! The entry point a reconciler calls. Looks up the strategy for a resource
//! type (falling back to the identity strategy) and tags every error with the
//! resource type.

use super::context::ResolveContext;
use super::error::ResolveError;
use super::params::ParameterBag;
use super::registry::{get_registry, Registry};
use super::strategy::IdentifierStrategy;

/// Resolves identifiers against a registry
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r Registry,
}

impl Resolver<'static> {
    /// Resolver over the global registry
    pub fn builtin() -> Self {
        Self::new(get_registry())
    }
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn strategy(&self, resource_type: &str) -> &'r IdentifierStrategy {
        if !self.registry.contains(resource_type) {
            tracing::debug!("no external name entry for {}, using identity", resource_type);
        }
        self.registry.lookup(resource_type)
    }

    /// Compute the identifier used to read, update or import the remote resource
    pub fn resolve_remote_id(
        &self,
        resource_type: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<String, ResolveError> {
        let strategy = self.strategy(resource_type);
        tracing::debug!(
            "resolve_remote_id: resource={}, kind={}, external_name={:?}",
            resource_type,
            strategy.kind(),
            ctx.external_name
        );

        strategy
            .derive_remote_id(ctx)
            .map_err(|e| ResolveError::new(resource_type, e))
    }

    /// Compute the external name to persist from the observed remote state
    pub fn resolve_external_name(
        &self,
        resource_type: &str,
        remote_state: &ParameterBag,
    ) -> Result<String, ResolveError> {
        let strategy = self.strategy(resource_type);
        tracing::debug!(
            "resolve_external_name: resource={}, kind={}",
            resource_type,
            strategy.kind()
        );

        strategy
            .derive_external_name(remote_state)
            .map_err(|e| ResolveError::new(resource_type, e))
    }

    /// Inject the external name into `bag` ahead of a create.
    ///
    /// Mutates `bag` in place; the caller must hold exclusive access to it.
    pub fn initialize(
        &self,
        resource_type: &str,
        bag: &mut ParameterBag,
        external_name: &str,
    ) -> Result<(), ResolveError> {
        let strategy = self.strategy(resource_type);
        tracing::debug!(
            "initialize: resource={}, kind={}, external_name={:?}",
            resource_type,
            strategy.kind(),
            external_name
        );

        strategy
            .initialize_parameters(bag, external_name)
            .map_err(|e| ResolveError::new(resource_type, e))
    }
}

/// [`Resolver::resolve_remote_id`] over the global registry
pub fn resolve_remote_id(resource_type: &str, ctx: &ResolveContext<'_>) -> Result<String, ResolveError> {
    Resolver::builtin().resolve_remote_id(resource_type, ctx)
}

/// [`Resolver::resolve_external_name`] over the global registry
pub fn resolve_external_name(
    resource_type: &str,
    remote_state: &ParameterBag,
) -> Result<String, ResolveError> {
    Resolver::builtin().resolve_external_name(resource_type, remote_state)
}

/// [`Resolver::initialize`] over the global registry
pub fn initialize(
    resource_type: &str,
    bag: &mut ParameterBag,
    external_name: &str,
) -> Result<(), ResolveError> {
    Resolver::builtin().initialize(resource_type, bag, external_name)
}
