//! External name resolution
//!
//! This module maps between a managed resource's external name and the
//! identifier the remote provider addresses it by. Strategies are selected
//! per resource type from a data-driven registry.
//!
//! # Architecture
//!
//! - [`params`] - Typed access into untyped parameter bags
//! - [`template`] - `{{ path }}` identifier templates and their inversion
//! - [`strategy`] - The closed set of identifier strategies
//! - [`custom`] - One-off strategies for irregular identifier shapes
//! - [`registry`] - Loads and caches strategies from embedded JSON
//! - [`resolver`] - The facade a reconciler calls
//!
//! # Tables
//!
//! Strategies are declared in JSON files under `src/tables/`:
//! - `network.json` - VPC, EC2 networking, load balancers
//! - `compute.json` - EKS, ECS, Lambda, autoscaling
//! - `data.json` - S3, Glue, RDS, Kinesis and other data stores
//! - `services.json` - Everything else
//!
//! # Example
//!
//! ```
//! use extname::external_name::{resolve_external_name, resolve_remote_id, ParameterBag, ResolveContext};
//! use serde_json::json;
//!
//! let params: ParameterBag = serde_json::from_value(json!({"cluster_identifier": "my-cluster"})).unwrap();
//! let ctx = ResolveContext::new("my-endpoint", &params);
//! let id = resolve_remote_id("aws_neptune_cluster_endpoint", &ctx).unwrap();
//! assert_eq!(id, "my-cluster:my-endpoint");
//!
//! let state: ParameterBag = serde_json::from_value(json!({"id": id})).unwrap();
//! let name = resolve_external_name("aws_neptune_cluster_endpoint", &state).unwrap();
//! assert_eq!(name, "my-endpoint");
//! ```

pub mod context;
pub mod custom;
pub mod error;
pub mod params;
pub mod registry;
pub mod resolver;
pub mod strategy;
pub mod template;

pub use context::{ContextDocument, ResolveContext, Setup, SetupDocument};
pub use custom::CustomStrategy;
pub use error::{ExternalNameError, RegistryError, ResolveError};
pub use params::ParameterBag;
pub use registry::*;
pub use resolver::{initialize, resolve_external_name, resolve_remote_id, Resolver};
pub use strategy::{IdentifierStrategy, NamePosition};
pub use template::Template;
