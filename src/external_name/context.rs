//! Resolution context
//!
//! The layered, read-only input a strategy resolves against.

use super::params::ParameterBag;
use serde::{Deserialize, Serialize};

/// Resource-class wide settings and environment facts
#[derive(Debug, Clone, Copy, Default)]
pub struct Setup<'a> {
    /// Provider configuration, e.g. `region`
    pub configuration: Option<&'a ParameterBag>,
    /// Facts about the calling environment, e.g. `account_id`
    pub client_metadata: Option<&'a ParameterBag>,
}

/// Borrowed view over everything a strategy may read for one resolution
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Name currently known to the caller; empty before the first create
    pub external_name: &'a str,
    /// Desired parameters of the resource
    pub parameters: &'a ParameterBag,
    pub setup: Setup<'a>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(external_name: &'a str, parameters: &'a ParameterBag) -> Self {
        Self {
            external_name,
            parameters,
            setup: Setup::default(),
        }
    }

    pub fn with_configuration(mut self, configuration: &'a ParameterBag) -> Self {
        self.setup.configuration = Some(configuration);
        self
    }

    pub fn with_client_metadata(mut self, client_metadata: &'a ParameterBag) -> Self {
        self.setup.client_metadata = Some(client_metadata);
        self
    }
}

/// Setup layers of a [`ContextDocument`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupDocument {
    #[serde(default)]
    pub configuration: ParameterBag,
    #[serde(default)]
    pub client_metadata: ParameterBag,
}

/// Owned context in the shape the reconciler hands over:
///
/// ```json
/// {
///   "parameters": { "cluster_name": "prod" },
///   "setup": {
///     "configuration": { "region": "eu-west-1" },
///     "client_metadata": { "account_id": "123456789012" }
///   },
///   "external_name": "workers"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextDocument {
    #[serde(default)]
    pub parameters: ParameterBag,
    #[serde(default)]
    pub setup: SetupDocument,
    #[serde(default)]
    pub external_name: String,
}

impl ContextDocument {
    pub fn as_context(&self) -> ResolveContext<'_> {
        ResolveContext::new(&self.external_name, &self.parameters)
            .with_configuration(&self.setup.configuration)
            .with_client_metadata(&self.setup.client_metadata)
    }
}
