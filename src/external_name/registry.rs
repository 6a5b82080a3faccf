//! Strategy Registry - Load external name strategies from JSON tables
//!
//! Declarative strategies are loaded from embedded JSON tables, one per
//! service family. Strategies that need conditional logic are registered
//! programmatically. The registry is built once and read-only afterwards.

use super::custom::CustomStrategy;
use super::error::{ExternalNameError, RegistryError};
use super::strategy::IdentifierStrategy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded external name tables (compiled into the binary)
const TABLE_FILES: &[&str] = &[
    include_str!("../tables/network.json"),
    include_str!("../tables/compute.json"),
    include_str!("../tables/data.json"),
    include_str!("../tables/services.json"),
];

/// Strategy used for resource types without an entry
static IDENTITY: IdentifierStrategy = IdentifierStrategy::NameAsIdentifier;

/// Strategy definition from a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyDescriptor {
    ProviderGenerated,
    NameAsIdentifier,
    Parameter {
        field: String,
    },
    Templated {
        #[serde(default)]
        name_field: Option<String>,
        template: String,
        /// Set when the external name part is assigned by the provider
        #[serde(default)]
        disable_name_initializer: bool,
    },
    FormattedFromProvider {
        separator: String,
        fields: Vec<String>,
    },
    FormattedNameLast {
        name_field: String,
        separator: String,
        fields: Vec<String>,
    },
    FormattedNameFirst {
        name_field: String,
        separator: String,
        fields: Vec<String>,
    },
}

impl StrategyDescriptor {
    /// Build the strategy value, parsing any template.
    ///
    /// Rejects descriptors whose forward and reverse mappings could not agree.
    pub fn build(&self) -> Result<IdentifierStrategy, ExternalNameError> {
        self.validate()?;
        let strategy = match self {
            StrategyDescriptor::ProviderGenerated => IdentifierStrategy::provider_generated(),
            StrategyDescriptor::NameAsIdentifier => IdentifierStrategy::name_as_identifier(),
            StrategyDescriptor::Parameter { field } => {
                IdentifierStrategy::parameter_as_identifier(field)
            }
            StrategyDescriptor::Templated {
                template,
                disable_name_initializer: true,
                ..
            } => IdentifierStrategy::templated_string_with_no_name(template)?,
            StrategyDescriptor::Templated {
                name_field,
                template,
                ..
            } => IdentifierStrategy::templated_string(
                name_field.as_deref().unwrap_or_default(),
                template,
            )?,
            StrategyDescriptor::FormattedFromProvider { separator, fields } => {
                IdentifierStrategy::formatted_from_provider(separator, &as_strs(fields))
            }
            StrategyDescriptor::FormattedNameLast {
                name_field,
                separator,
                fields,
            } => IdentifierStrategy::formatted_name_last(name_field, separator, &as_strs(fields)),
            StrategyDescriptor::FormattedNameFirst {
                name_field,
                separator,
                fields,
            } => IdentifierStrategy::formatted_name_first(name_field, separator, &as_strs(fields)),
        };
        Ok(strategy)
    }

    fn validate(&self) -> Result<(), ExternalNameError> {
        match self {
            StrategyDescriptor::Templated {
                name_field: Some(_),
                disable_name_initializer: true,
                ..
            } => Err(ExternalNameError::type_mismatch(
                "name_field",
                "absent when disable_name_initializer is set",
            )),
            StrategyDescriptor::FormattedFromProvider { separator, fields } => {
                if fields.is_empty() {
                    return Err(ExternalNameError::type_mismatch("fields", "a non-empty list"));
                }
                // A single field is never joined, so its separator may be empty
                if fields.len() > 1 && separator.is_empty() {
                    return Err(ExternalNameError::type_mismatch("separator", "a non-empty string"));
                }
                Ok(())
            }
            StrategyDescriptor::FormattedNameLast { separator, .. }
            | StrategyDescriptor::FormattedNameFirst { separator, .. }
                if separator.is_empty() =>
            {
                Err(ExternalNameError::type_mismatch("separator", "a non-empty string"))
            }
            _ => Ok(()),
        }
    }
}

fn as_strs(fields: &[String]) -> Vec<&str> {
    fields.iter().map(String::as_str).collect()
}

/// One row of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTableEntry")]
pub struct TableEntry {
    pub resource: String,
    #[serde(flatten)]
    pub strategy: StrategyDescriptor,
}

/// A table row as written, with every key any kind accepts
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTableEntry {
    resource: String,
    kind: String,
    field: Option<String>,
    name_field: Option<String>,
    template: Option<String>,
    disable_name_initializer: Option<bool>,
    separator: Option<String>,
    fields: Option<Vec<String>>,
}

impl RawTableEntry {
    fn present_keys(&self) -> Vec<&'static str> {
        [
            ("field", self.field.is_some()),
            ("name_field", self.name_field.is_some()),
            ("template", self.template.is_some()),
            ("disable_name_initializer", self.disable_name_initializer.is_some()),
            ("separator", self.separator.is_some()),
            ("fields", self.fields.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, present)| present.then_some(key))
        .collect()
    }
}

fn required<T>(value: Option<T>, resource: &str, key: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("{}: missing `{}`", resource, key))
}

impl TryFrom<RawTableEntry> for TableEntry {
    type Error = String;

    fn try_from(raw: RawTableEntry) -> Result<Self, Self::Error> {
        let allowed: &[&str] = match raw.kind.as_str() {
            "provider_generated" | "name_as_identifier" => &[],
            "parameter" => &["field"],
            "templated" => &["name_field", "template", "disable_name_initializer"],
            "formatted_from_provider" => &["separator", "fields"],
            "formatted_name_last" | "formatted_name_first" => &["name_field", "separator", "fields"],
            other => return Err(format!("{}: unknown kind `{}`", raw.resource, other)),
        };
        if let Some(key) = raw.present_keys().into_iter().find(|k| !allowed.contains(k)) {
            return Err(format!(
                "{}: `{}` does not apply to kind `{}`",
                raw.resource, key, raw.kind
            ));
        }

        let resource = raw.resource.as_str();
        let strategy = match raw.kind.as_str() {
            "provider_generated" => StrategyDescriptor::ProviderGenerated,
            "name_as_identifier" => StrategyDescriptor::NameAsIdentifier,
            "parameter" => StrategyDescriptor::Parameter {
                field: required(raw.field, resource, "field")?,
            },
            "templated" => StrategyDescriptor::Templated {
                name_field: raw.name_field,
                template: required(raw.template, resource, "template")?,
                disable_name_initializer: raw.disable_name_initializer.unwrap_or(false),
            },
            "formatted_from_provider" => StrategyDescriptor::FormattedFromProvider {
                separator: required(raw.separator, resource, "separator")?,
                fields: required(raw.fields, resource, "fields")?,
            },
            kind => {
                let name_field = required(raw.name_field, resource, "name_field")?;
                let separator = required(raw.separator, resource, "separator")?;
                let fields = required(raw.fields, resource, "fields")?;
                if kind == "formatted_name_first" {
                    StrategyDescriptor::FormattedNameFirst {
                        name_field,
                        separator,
                        fields,
                    }
                } else {
                    StrategyDescriptor::FormattedNameLast {
                        name_field,
                        separator,
                        fields,
                    }
                }
            }
        };

        Ok(TableEntry {
            resource: raw.resource,
            strategy,
        })
    }
}

/// Root structure of tables/*.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalNameTable {
    #[serde(default)]
    pub external_names: Vec<TableEntry>,
}

impl ExternalNameTable {
    pub fn from_json(content: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self, RegistryError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Resource types whose identifier needs conditional logic
fn custom_entries() -> [(&'static str, IdentifierStrategy); 5] {
    [
        ("aws_route", IdentifierStrategy::custom(CustomStrategy::Route)),
        (
            "aws_route_table_association",
            IdentifierStrategy::custom(CustomStrategy::RouteTableAssociation),
        ),
        (
            "aws_lambda_function_url",
            IdentifierStrategy::custom(CustomStrategy::LambdaFunctionUrl),
        ),
        (
            "aws_iam_user_group_membership",
            IdentifierStrategy::custom(CustomStrategy::IamUserGroupMembership),
        ),
        (
            "aws_eks_identity_provider_config",
            IdentifierStrategy::custom(CustomStrategy::EksIdentityProviderConfig),
        ),
    ]
}

/// Collects strategies before the registry is frozen
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    strategies: HashMap<String, IdentifierStrategy>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder seeded with the embedded tables and the custom strategies
    pub fn with_builtin() -> Result<Self, RegistryError> {
        let mut builder = Self::new();
        for content in TABLE_FILES {
            builder.load_table(ExternalNameTable::from_json(content)?)?;
        }
        for (resource_type, strategy) in custom_entries() {
            builder.register(resource_type, strategy)?;
        }
        Ok(builder)
    }

    /// Register a strategy; a resource type may only be registered once
    pub fn register(
        &mut self,
        resource_type: &str,
        strategy: IdentifierStrategy,
    ) -> Result<&mut Self, ExternalNameError> {
        if self.strategies.contains_key(resource_type) {
            return Err(ExternalNameError::DuplicateRegistration {
                resource_type: resource_type.to_string(),
            });
        }
        self.strategies.insert(resource_type.to_string(), strategy);
        Ok(self)
    }

    /// Register every entry of a table
    pub fn load_table(&mut self, table: ExternalNameTable) -> Result<&mut Self, RegistryError> {
        for entry in table.external_names {
            let strategy = entry
                .strategy
                .build()
                .map_err(|error| RegistryError::InvalidEntry {
                    resource_type: entry.resource.clone(),
                    error,
                })?;
            self.register(&entry.resource, strategy)?;
        }
        Ok(self)
    }

    pub fn build(self) -> Registry {
        tracing::debug!("external name registry built with {} entries", self.strategies.len());
        Registry {
            strategies: self.strategies,
        }
    }
}

/// Immutable mapping from resource type to strategy
#[derive(Debug, Clone, Default)]
pub struct Registry {
    strategies: HashMap<String, IdentifierStrategy>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The embedded tables plus the custom strategies
    pub fn builtin() -> Result<Self, RegistryError> {
        Ok(RegistryBuilder::with_builtin()?.build())
    }

    /// Get the strategy for a resource type, or the identity strategy when none is registered
    pub fn lookup(&self, resource_type: &str) -> &IdentifierStrategy {
        self.get(resource_type).unwrap_or(&IDENTITY)
    }

    pub fn get(&self, resource_type: &str) -> Option<&IdentifierStrategy> {
        self.strategies.get(resource_type)
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.strategies.contains_key(resource_type)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// All registered resource types, sorted
    pub fn resource_types(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.strategies.keys().map(|s| s.as_str()).collect();
        keys.sort_unstable();
        keys
    }
}

/// Global registry built from the embedded tables
static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Get the registry (built from the embedded tables on first access)
pub fn get_registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        Registry::builtin()
            .unwrap_or_else(|e| panic!("Failed to load embedded external name tables: {}", e))
    })
}

/// Get the strategy for a resource type from the global registry
pub fn get_strategy(resource_type: &str) -> &'static IdentifierStrategy {
    get_registry().lookup(resource_type)
}

/// Get all registered resource types (for autocomplete)
pub fn get_all_resource_types() -> Vec<&'static str> {
    get_registry().resource_types()
}
